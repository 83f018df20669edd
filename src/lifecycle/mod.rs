pub mod effects;
pub mod handlers;
pub mod service;

mod errors;

pub use errors::LifecycleError;
pub use service::{CloseOutcome, LifecycleService};
