pub mod activity;
pub mod auth;
pub mod chat;
pub mod diagnostics;
pub mod error;
pub mod execute;
pub mod health;
pub mod messages;
pub mod notes;
pub mod participant;
pub mod session;
pub mod tracking;

pub use activity::*;
pub use auth::*;
pub use chat::*;
pub use diagnostics::*;
pub use error::*;
pub use execute::*;
pub use health::*;
pub use messages::*;
pub use notes::*;
pub use participant::*;
pub use session::*;
pub use tracking::*;
