pub mod error;
pub mod event;
pub mod id;
pub mod order;
pub mod payment_state;
pub mod store;
pub mod subscription;
