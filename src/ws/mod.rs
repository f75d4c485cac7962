pub mod live;

pub use live::live_session;
