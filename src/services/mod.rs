pub mod endpoint_service;
pub mod events;
pub mod subscription;
pub mod transport;
pub mod webhook_service;
