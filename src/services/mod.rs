pub mod auth_service;
pub mod client_ip;
pub mod feedback_export;
pub mod login_tracker;
