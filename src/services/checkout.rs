//! Synchronous side of payment reconciliation: what the checkout request does
//! with the processor's response before any webhook arrives. Shares the
//! guarded writes of the webhook path, so whichever lands first wins.

use {
    crate::domain::{
        error::PipelineError,
        id::{LocalSubscriptionId, OrderId, ProviderSubscriptionId, TransferId},
        order::{OrderPaymentState, PaymentMeta},
        payment_state::{PaymentState, classify},
        store::{OrderStore, SubscriptionStore},
    },
    serde_json::Value,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Paid,
    AlreadyPaid,
    /// Pending or unclassifiable: the order waits for a webhook.
    OnHold(PaymentState),
    Failed,
    Cancelled,
    /// The guard refused the write (for example the order is already paid).
    Unchanged(OrderPaymentState),
}

fn order_not_found(order_id: OrderId) -> PipelineError {
    PipelineError::Validation(format!("order {order_id} not found"))
}

/// Records a transfer response returned to the checkout request. `response`
/// may carry the state at `response.state` or at the top level.
pub async fn record_checkout(
    orders: &dyn OrderStore,
    order_id: OrderId,
    response: &Value,
    mut meta: PaymentMeta,
) -> Result<CheckoutOutcome, PipelineError> {
    if orders.find(order_id).await?.is_none() {
        return Err(order_not_found(order_id));
    }

    if meta.transfer_id.is_none() {
        meta.transfer_id = response
            .get("response")
            .and_then(|r| r.get("id"))
            .or_else(|| response.get("id"))
            .and_then(Value::as_str)
            .and_then(|id| TransferId::new(id).ok());
    }
    orders.save_payment_meta(order_id, &meta).await?;

    let state = classify(response);
    let transfer = meta
        .transfer_id
        .as_ref()
        .map(|t| t.as_str())
        .unwrap_or("n/a");

    let (target, note) = match state {
        PaymentState::Succeeded => {
            let Some(transfer_id) = meta.transfer_id.as_ref() else {
                return Err(PipelineError::Validation(
                    "succeeded transfer response without id".into(),
                ));
            };
            let note = format!("Finix payment completed at checkout (Transfer ID: {transfer_id}).");
            let outcome = if orders.mark_paid(order_id, transfer_id, &note).await?.applied() {
                CheckoutOutcome::Paid
            } else {
                CheckoutOutcome::AlreadyPaid
            };
            tracing::info!(order_id = %order_id, ?outcome, "checkout payment recorded");
            return Ok(outcome);
        }
        PaymentState::Failed => (
            OrderPaymentState::Failed,
            format!("Finix payment failed at checkout (Transfer ID: {transfer})."),
        ),
        PaymentState::Canceled => (
            OrderPaymentState::Cancelled,
            format!("Finix payment canceled at checkout (Transfer ID: {transfer})."),
        ),
        PaymentState::Pending | PaymentState::Unknown => (
            OrderPaymentState::OnHold,
            format!("Finix payment {state} (Transfer ID: {transfer}), awaiting confirmation."),
        ),
    };

    if !orders.set_payment_state(order_id, target, &note).await?.applied() {
        let current = orders
            .find(order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?
            .payment_state();
        tracing::info!(order_id = %order_id, %current, "checkout result did not change order");
        return Ok(CheckoutOutcome::Unchanged(current));
    }

    tracing::info!(order_id = %order_id, state = %state, "checkout payment recorded");
    Ok(match target {
        OrderPaymentState::Failed => CheckoutOutcome::Failed,
        OrderPaymentState::Cancelled => CheckoutOutcome::Cancelled,
        _ => CheckoutOutcome::OnHold(state),
    })
}

/// Stores the Finix subscription id used by the webhook reverse lookup.
pub async fn link_subscription(
    subscriptions: &dyn SubscriptionStore,
    id: LocalSubscriptionId,
    finix_subscription_id: &ProviderSubscriptionId,
    instrument_id: Option<&str>,
) -> Result<(), PipelineError> {
    subscriptions
        .link_provider(id, finix_subscription_id, instrument_id)
        .await?;
    tracing::info!(
        subscription_id = %id,
        finix_subscription_id = %finix_subscription_id,
        "subscription linked to Finix"
    );
    Ok(())
}
