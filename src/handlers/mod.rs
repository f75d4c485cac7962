pub mod activity;
pub mod auth;
pub mod code_execute;
pub mod diagnostics;
pub mod health;
pub mod notes;
pub mod sessions;
pub mod slack;
pub mod tracking;

pub use health::*;
