// Library crate for the quiniela prediction-pool server
// This file exposes the public API for integration tests

pub mod champions;
pub mod identity;
pub mod lifecycle;
pub mod pool;
pub mod scoring;
pub mod shared;
pub mod sports;
pub mod stats;

// Re-export commonly used types for easier access in tests
pub use champions::ChampionsBook;
pub use identity::{CurrentUser, IdentityProvider, StaticTokenIdentity};
pub use lifecycle::{CloseOutcome, LifecycleService};
pub use pool::{Pool, PoolRepository, PoolService, Prediction};
pub use scoring::{score, Scoreline};
pub use shared::{AppError, AppState};
pub use sports::{LiveUpdatesHandle, SportsDataProvider};
pub use stats::{ProfileService, StatsRepository};
