pub mod code;
pub mod error;
pub mod handle;
pub mod lifecycle;
pub mod presence;
pub mod records;
pub mod settings;
pub mod termination;

pub use error::SessionError;
pub use handle::{JoinRequest, SessionEvent, SessionHandle};
pub use lifecycle::Creator;
pub use termination::{EndOutcome, DASHBOARD_TERMINATOR, TERMINATION_NOTICE};
