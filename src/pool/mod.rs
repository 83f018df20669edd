pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;

pub use models::{Match, MatchId, Pool, Prediction, Scorelines, WinnerEntry};
pub use repository::{InMemoryPoolRepository, PoolRepository, UpsertPredictionResult};
pub use service::PoolService;
