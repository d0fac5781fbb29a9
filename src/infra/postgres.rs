pub mod audit_repo;
pub mod order_repo;
pub mod settings_repo;
pub mod subscription_repo;

pub use {
    order_repo::PgOrderStore, settings_repo::PgSettings, subscription_repo::PgSubscriptionStore,
};
