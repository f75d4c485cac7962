pub mod path;
pub mod realtime;
pub mod rules;
pub mod tree;

pub use path::StorePath;
pub use realtime::{Connection, RealtimeStore, StoreStats, Subscription, TransactionOutcome};
pub use tree::ServerValue;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    #[error("Overlapping update paths: {0}")]
    OverlappingUpdate(String),
}
