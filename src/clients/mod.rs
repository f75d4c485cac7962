pub mod chat_webhook_client;
pub mod sandbox_client;
