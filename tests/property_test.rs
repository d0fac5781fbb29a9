use base64::{Engine, engine::general_purpose::STANDARD};
use finix_sync::adapters::finix::auth::parse_basic;
use finix_sync::domain::order::OrderPaymentState;
use finix_sync::domain::payment_state::{PaymentState, classify};
use finix_sync::infra::memory::{MemoryOrderStore, MemorySubscriptionStore};
use finix_sync::services::event_router::{RouteOutcome, route_event};
use proptest::prelude::*;
use serde_json::{Value, json};

fn arb_order_state() -> impl Strategy<Value = OrderPaymentState> {
    prop_oneof![
        Just(OrderPaymentState::Unpaid),
        Just(OrderPaymentState::Paid),
        Just(OrderPaymentState::Failed),
        Just(OrderPaymentState::OnHold),
        Just(OrderPaymentState::Cancelled),
    ]
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        ".*".prop_map(Value::String),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    /// Once paid, an order accepts no further transition.
    #[test]
    fn paid_is_absorbing(target in arb_order_state()) {
        prop_assert!(!OrderPaymentState::Paid.can_transition_to(&target));
    }

    /// A random walk of guarded writes reaches `paid` at most once.
    #[test]
    fn random_walk_pays_at_most_once(steps in prop::collection::vec(arb_order_state(), 1..20)) {
        let mut current = OrderPaymentState::Unpaid;
        let mut payments = 0u32;
        for next in &steps {
            if current.can_transition_to(next) {
                if *next == OrderPaymentState::Paid {
                    payments += 1;
                }
                current = *next;
            }
        }
        prop_assert!(payments <= 1, "paid {payments} times in walk: {steps:?}");
    }

    #[test]
    fn non_objects_classify_as_unknown(value in arb_scalar()) {
        prop_assert_eq!(classify(&value), PaymentState::Unknown);
    }

    /// The top-level state agrees with `response.state` in either casing.
    #[test]
    fn classification_ignores_case_and_nesting(
        state in prop_oneof!["SUCCEEDED", "PENDING", "FAILED", "CANCELED"],
        lower in any::<bool>(),
    ) {
        let raw = if lower { state.to_lowercase() } else { state.to_string() };
        let flat = classify(&json!({"state": raw}));
        let nested = classify(&json!({"response": {"state": raw}}));
        prop_assert_eq!(flat, nested);
        prop_assert_ne!(flat, PaymentState::Unknown);
    }

    /// Only the first colon separates username from password.
    #[test]
    fn basic_credentials_keep_colons(user in "[^:]{0,16}", pass in ".{0,32}") {
        let header = format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")));
        prop_assert_eq!(parse_basic(&header), Some((user, pass)));
    }

    /// Arbitrary bytes never reach a store.
    #[test]
    fn arbitrary_bodies_are_acknowledged(body in prop::collection::vec(any::<u8>(), 0..256)) {
        let orders = MemoryOrderStore::new();
        let subscriptions = MemorySubscriptionStore::new();
        let outcome = runtime().block_on(route_event(&orders, &subscriptions, &body));

        prop_assert!(!matches!(outcome, RouteOutcome::Failed));
        prop_assert!(["probe", "ignored", "skipped"].contains(&outcome.status()));
        prop_assert_eq!(orders.lookups(), 0);
    }
}
