pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod services;

use {
    config::ConfigProvider,
    domain::store::{OrderStore, SubscriptionStore},
    std::sync::Arc,
};

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub config: Arc<dyn ConfigProvider>,
}
