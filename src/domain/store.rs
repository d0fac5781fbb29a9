use {
    super::error::PipelineError,
    super::id::{LocalSubscriptionId, OrderId, ProviderSubscriptionId, TransferId},
    super::order::{Order, OrderPaymentState, PaymentMeta, TransitionOutcome},
    super::subscription::{StatusGuard, Subscription, SubscriptionStatus},
    std::{future::Future, pin::Pin},
};

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PipelineError>> + Send + 'a>>;

/// Order records owned by the shop. Status writes are conditional updates:
/// the guard and the write happen atomically, and the note is only recorded
/// when the write lands.
pub trait OrderStore: Send + Sync {
    fn find(&self, id: OrderId) -> StoreFuture<'_, Option<Order>>;

    /// Marks the order paid with `transfer_id` as payment reference, unless
    /// it is already paid.
    fn mark_paid<'a>(
        &'a self,
        id: OrderId,
        transfer_id: &'a TransferId,
        note: &'a str,
    ) -> StoreFuture<'a, TransitionOutcome>;

    /// Moves the order to `state` if `OrderPaymentState::can_transition_to`
    /// allows it from the current state.
    fn set_payment_state<'a>(
        &'a self,
        id: OrderId,
        state: OrderPaymentState,
        note: &'a str,
    ) -> StoreFuture<'a, TransitionOutcome>;

    fn append_note<'a>(&'a self, id: OrderId, text: &'a str) -> StoreFuture<'a, ()>;

    /// Stores the checkout metadata. `None` fields leave existing values alone.
    fn save_payment_meta<'a>(&'a self, id: OrderId, meta: &'a PaymentMeta)
    -> StoreFuture<'a, ()>;

    fn mark_failed<'a>(&'a self, id: OrderId, note: &'a str) -> StoreFuture<'a, TransitionOutcome> {
        self.set_payment_state(id, OrderPaymentState::Failed, note)
    }
}

pub trait SubscriptionStore: Send + Sync {
    fn find_by_id(&self, id: LocalSubscriptionId) -> StoreFuture<'_, Option<Subscription>>;

    /// Reverse lookup on the stored `_finix_subscription_id`.
    fn find_by_provider_id<'a>(
        &'a self,
        provider_id: &'a ProviderSubscriptionId,
    ) -> StoreFuture<'a, Option<Subscription>>;

    fn update_status<'a>(
        &'a self,
        id: LocalSubscriptionId,
        status: SubscriptionStatus,
        note: &'a str,
        guard: StatusGuard,
    ) -> StoreFuture<'a, TransitionOutcome>;

    fn append_note<'a>(&'a self, id: LocalSubscriptionId, text: &'a str) -> StoreFuture<'a, ()>;

    fn link_provider<'a>(
        &'a self,
        id: LocalSubscriptionId,
        provider_id: &'a ProviderSubscriptionId,
        instrument_id: Option<&'a str>,
    ) -> StoreFuture<'a, ()>;
}
