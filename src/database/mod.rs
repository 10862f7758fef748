pub mod delivery_log_store;
pub mod endpoint_repo;

pub use delivery_log_store::{DeliveryLogStore, InMemoryDeliveryLogStore};
pub use endpoint_repo::{EndpointRepository, InMemoryEndpointRepository};
