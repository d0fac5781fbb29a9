use crate::{
    domain::{
        event::{EventType, WebhookEnvelope},
        store::{OrderStore, SubscriptionStore},
    },
    services::{
        order_reconciler::{OrderOutcome, reconcile_transfer},
        subscription_reconciler::{SubscriptionOutcome, reconcile_subscription},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not UTF-8, not JSON, not an object, or no string `type`.
    Malformed,
    UnsupportedType,
    /// Over the body limit; never read in full.
    TooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Empty body: endpoint validation from the processor.
    Probe,
    Ignored(IgnoreReason),
    Order(OrderOutcome),
    Subscription(SubscriptionOutcome),
    /// The reconciler hit a store error. Logged, still acknowledged.
    Failed,
}

impl RouteOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Ignored(_) => "ignored",
            Self::Order(OrderOutcome::Skipped(_))
            | Self::Subscription(SubscriptionOutcome::Skipped(_)) => "skipped",
            Self::Order(_) | Self::Subscription(_) => "processed",
            Self::Failed => "error",
        }
    }
}

/// Dispatches an authenticated delivery. Never fails: every outcome is
/// acknowledged with a 200 so the processor does not retry data problems.
pub async fn route_event(
    orders: &dyn OrderStore,
    subscriptions: &dyn SubscriptionStore,
    body: &[u8],
) -> RouteOutcome {
    let Ok(body) = std::str::from_utf8(body) else {
        tracing::debug!("webhook body is not UTF-8, ignoring");
        return RouteOutcome::Ignored(IgnoreReason::Malformed);
    };
    if body.trim().is_empty() {
        return RouteOutcome::Probe;
    }

    let Some(envelope) = WebhookEnvelope::parse(body) else {
        tracing::debug!("webhook body is not an event envelope, ignoring");
        return RouteOutcome::Ignored(IgnoreReason::Malformed);
    };
    tracing::Span::current().record(
        "event_type",
        tracing::field::display(&envelope.event_type),
    );

    let data = envelope.data.as_ref();
    match envelope.event_type {
        EventType::TransferCreated | EventType::TransferUpdated => {
            match reconcile_transfer(orders, data).await {
                Ok(outcome) => RouteOutcome::Order(outcome),
                Err(e) => {
                    tracing::error!(error = %e, "transfer reconciliation failed");
                    RouteOutcome::Failed
                }
            }
        }
        EventType::SubscriptionCreated | EventType::SubscriptionUpdated => {
            match reconcile_subscription(subscriptions, data).await {
                Ok(outcome) => RouteOutcome::Subscription(outcome),
                Err(e) => {
                    tracing::error!(error = %e, "subscription reconciliation failed");
                    RouteOutcome::Failed
                }
            }
        }
        EventType::Other(event_type) => {
            tracing::info!(event_type = %event_type, "unsupported event type, ignoring");
            RouteOutcome::Ignored(IgnoreReason::UnsupportedType)
        }
    }
}
