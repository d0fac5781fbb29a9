//! In-process stores. Each operation runs under a single lock, which gives
//! the same compare-and-set guarantees as the Postgres conditional updates.

use {
    crate::domain::{
        id::{LocalSubscriptionId, OrderId, ProviderSubscriptionId, TransferId},
        order::{Note, Order, OrderPaymentState, PaymentMeta, TransitionOutcome},
        store::{OrderStore, StoreFuture, SubscriptionStore},
        subscription::{StatusGuard, Subscription, SubscriptionStatus},
    },
    std::{
        collections::HashMap,
        sync::{
            Mutex, MutexGuard, PoisonError,
            atomic::{AtomicUsize, Ordering},
        },
    },
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
struct OrderRecord {
    state: OrderPaymentState,
    meta: PaymentMeta,
    notes: Vec<Note>,
}

#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: Mutex<HashMap<OrderId, OrderRecord>>,
    lookups: AtomicUsize,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: OrderId, state: OrderPaymentState) {
        lock(&self.orders).insert(
            id,
            OrderRecord {
                state,
                meta: PaymentMeta::default(),
                notes: Vec::new(),
            },
        );
    }

    pub fn get(&self, id: OrderId) -> Option<Order> {
        lock(&self.orders)
            .get(&id)
            .map(|r| Order::new(id, r.state, r.meta.clone()))
    }

    pub fn notes(&self, id: OrderId) -> Vec<Note> {
        lock(&self.orders)
            .get(&id)
            .map(|r| r.notes.clone())
            .unwrap_or_default()
    }

    /// Number of `find` calls served.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn transition(
        &self,
        id: OrderId,
        target: OrderPaymentState,
        transfer_id: Option<&TransferId>,
        note: &str,
    ) -> TransitionOutcome {
        let mut orders = lock(&self.orders);
        let Some(record) = orders.get_mut(&id) else {
            return TransitionOutcome::Unchanged;
        };
        if !record.state.can_transition_to(&target) {
            return TransitionOutcome::Unchanged;
        }
        record.state = target;
        if let Some(transfer_id) = transfer_id {
            record.meta.transfer_id = Some(transfer_id.clone());
        }
        record.notes.push(Note::new(note));
        TransitionOutcome::Applied
    }
}

impl OrderStore for MemoryOrderStore {
    fn find(&self, id: OrderId) -> StoreFuture<'_, Option<Order>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let order = self.get(id);
        Box::pin(async move { Ok(order) })
    }

    fn mark_paid<'a>(
        &'a self,
        id: OrderId,
        transfer_id: &'a TransferId,
        note: &'a str,
    ) -> StoreFuture<'a, TransitionOutcome> {
        let outcome = self.transition(id, OrderPaymentState::Paid, Some(transfer_id), note);
        Box::pin(async move { Ok(outcome) })
    }

    fn set_payment_state<'a>(
        &'a self,
        id: OrderId,
        state: OrderPaymentState,
        note: &'a str,
    ) -> StoreFuture<'a, TransitionOutcome> {
        let outcome = self.transition(id, state, None, note);
        Box::pin(async move { Ok(outcome) })
    }

    fn append_note<'a>(&'a self, id: OrderId, text: &'a str) -> StoreFuture<'a, ()> {
        if let Some(record) = lock(&self.orders).get_mut(&id) {
            record.notes.push(Note::new(text));
        }
        Box::pin(async { Ok(()) })
    }

    fn save_payment_meta<'a>(
        &'a self,
        id: OrderId,
        meta: &'a PaymentMeta,
    ) -> StoreFuture<'a, ()> {
        if let Some(record) = lock(&self.orders).get_mut(&id) {
            let stored = &mut record.meta;
            if meta.transfer_id.is_some() {
                stored.transfer_id.clone_from(&meta.transfer_id);
            }
            if meta.instrument_id.is_some() {
                stored.instrument_id.clone_from(&meta.instrument_id);
            }
            if meta.fraud_session_id.is_some() {
                stored.fraud_session_id.clone_from(&meta.fraud_session_id);
            }
            if meta.custom_description.is_some() {
                stored.custom_description.clone_from(&meta.custom_description);
            }
        }
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone)]
struct SubscriptionRecord {
    status: SubscriptionStatus,
    finix_subscription_id: Option<ProviderSubscriptionId>,
    instrument_id: Option<String>,
    notes: Vec<Note>,
}

impl SubscriptionRecord {
    fn to_subscription(&self, id: LocalSubscriptionId) -> Subscription {
        Subscription::new(
            id,
            self.status,
            self.finix_subscription_id.clone(),
            self.instrument_id.clone(),
        )
    }
}

#[derive(Debug, Default)]
pub struct MemorySubscriptionStore {
    subscriptions: Mutex<HashMap<LocalSubscriptionId, SubscriptionRecord>>,
    id_lookups: AtomicUsize,
    provider_lookups: AtomicUsize,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        id: LocalSubscriptionId,
        status: SubscriptionStatus,
        finix_subscription_id: Option<ProviderSubscriptionId>,
    ) {
        lock(&self.subscriptions).insert(
            id,
            SubscriptionRecord {
                status,
                finix_subscription_id,
                instrument_id: None,
                notes: Vec::new(),
            },
        );
    }

    pub fn get(&self, id: LocalSubscriptionId) -> Option<Subscription> {
        lock(&self.subscriptions)
            .get(&id)
            .map(|r| r.to_subscription(id))
    }

    pub fn notes(&self, id: LocalSubscriptionId) -> Vec<Note> {
        lock(&self.subscriptions)
            .get(&id)
            .map(|r| r.notes.clone())
            .unwrap_or_default()
    }

    pub fn id_lookups(&self) -> usize {
        self.id_lookups.load(Ordering::SeqCst)
    }

    /// Number of reverse lookups by Finix id served.
    pub fn provider_lookups(&self) -> usize {
        self.provider_lookups.load(Ordering::SeqCst)
    }
}

impl SubscriptionStore for MemorySubscriptionStore {
    fn find_by_id(&self, id: LocalSubscriptionId) -> StoreFuture<'_, Option<Subscription>> {
        self.id_lookups.fetch_add(1, Ordering::SeqCst);
        let found = self.get(id);
        Box::pin(async move { Ok(found) })
    }

    fn find_by_provider_id<'a>(
        &'a self,
        provider_id: &'a ProviderSubscriptionId,
    ) -> StoreFuture<'a, Option<Subscription>> {
        self.provider_lookups.fetch_add(1, Ordering::SeqCst);
        let found = lock(&self.subscriptions)
            .iter()
            .find(|(_, r)| r.finix_subscription_id.as_ref() == Some(provider_id))
            .map(|(id, r)| r.to_subscription(*id));
        Box::pin(async move { Ok(found) })
    }

    fn update_status<'a>(
        &'a self,
        id: LocalSubscriptionId,
        status: SubscriptionStatus,
        note: &'a str,
        guard: StatusGuard,
    ) -> StoreFuture<'a, TransitionOutcome> {
        let outcome = match lock(&self.subscriptions).get_mut(&id) {
            Some(record) if guard == StatusGuard::Always || record.status != status => {
                record.status = status;
                record.notes.push(Note::new(note));
                TransitionOutcome::Applied
            }
            _ => TransitionOutcome::Unchanged,
        };
        Box::pin(async move { Ok(outcome) })
    }

    fn append_note<'a>(&'a self, id: LocalSubscriptionId, text: &'a str) -> StoreFuture<'a, ()> {
        if let Some(record) = lock(&self.subscriptions).get_mut(&id) {
            record.notes.push(Note::new(text));
        }
        Box::pin(async { Ok(()) })
    }

    fn link_provider<'a>(
        &'a self,
        id: LocalSubscriptionId,
        provider_id: &'a ProviderSubscriptionId,
        instrument_id: Option<&'a str>,
    ) -> StoreFuture<'a, ()> {
        if let Some(record) = lock(&self.subscriptions).get_mut(&id) {
            record.finix_subscription_id = Some(provider_id.clone());
            if let Some(instrument_id) = instrument_id {
                record.instrument_id = Some(instrument_id.to_string());
            }
        }
        Box::pin(async { Ok(()) })
    }
}
