pub mod checkout;
pub mod event_router;
pub mod order_reconciler;
pub mod subscription_reconciler;
