pub mod delivery_log;
pub mod webhook_endpoint;
