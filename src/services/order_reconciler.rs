use {
    crate::domain::{
        error::PipelineError,
        event::TransferData,
        id::{OrderId, TransferId},
        order::OrderPaymentState,
        payment_state::{PaymentState, classify},
        store::OrderStore,
    },
    serde_json::Value,
};

pub const UNKNOWN_FAILURE: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingData,
    MissingTransferId,
    MissingOrderId,
    OrderNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    Paid(OrderId),
    /// Re-delivery, or the checkout flow got there first.
    AlreadyPaid(OrderId),
    MarkedFailed(OrderId),
    AlreadyFailed(OrderId),
    /// A failure reported for an order that is already paid. Left untouched.
    Anomaly {
        order_id: OrderId,
        current: OrderPaymentState,
    },
    /// Pending, canceled and unknown transfer states are not acted on here.
    Unhandled {
        order_id: OrderId,
        state: PaymentState,
    },
    Skipped(SkipReason),
}

fn paid_note(transfer_id: &TransferId) -> String {
    format!("Finix payment completed via webhook (Transfer ID: {transfer_id}).")
}

fn failed_note(transfer_id: &TransferId, message: &str) -> String {
    format!("Finix payment failed via webhook (Transfer ID: {transfer_id}): {message}")
}

/// Applies a `transfer.*` event to the order named in its `order_id` tag.
pub async fn reconcile_transfer(
    orders: &dyn OrderStore,
    data: Option<&Value>,
) -> Result<OrderOutcome, PipelineError> {
    let Some(raw) = data.filter(|d| d.is_object()) else {
        tracing::warn!("transfer event without data object");
        return Ok(OrderOutcome::Skipped(SkipReason::MissingData));
    };
    let transfer: TransferData = match serde_json::from_value(raw.clone()) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "transfer data has unexpected shape");
            return Ok(OrderOutcome::Skipped(SkipReason::MissingData));
        }
    };

    let Some(transfer_id) = transfer.id.as_deref().and_then(|id| TransferId::new(id).ok()) else {
        tracing::warn!("transfer event without id");
        return Ok(OrderOutcome::Skipped(SkipReason::MissingTransferId));
    };
    tracing::Span::current().record("object_id", tracing::field::display(&transfer_id));

    // Transfers are always tagged with the order at creation; no fallback lookup.
    let Some(order_id) = transfer
        .tag("order_id")
        .and_then(|raw| OrderId::parse(&raw).ok())
    else {
        tracing::warn!(transfer_id = %transfer_id, "transfer has no usable order_id tag");
        return Ok(OrderOutcome::Skipped(SkipReason::MissingOrderId));
    };

    let Some(order) = orders.find(order_id).await? else {
        tracing::warn!(transfer_id = %transfer_id, order_id = %order_id, "order not found");
        return Ok(OrderOutcome::Skipped(SkipReason::OrderNotFound));
    };

    let state = classify(raw);
    match state {
        PaymentState::Succeeded => {
            let note = paid_note(&transfer_id);
            if orders
                .mark_paid(order_id, &transfer_id, &note)
                .await?
                .applied()
            {
                tracing::info!(order_id = %order_id, transfer_id = %transfer_id, "order marked paid");
                Ok(OrderOutcome::Paid(order_id))
            } else {
                tracing::info!(order_id = %order_id, transfer_id = %transfer_id, "order already paid");
                Ok(OrderOutcome::AlreadyPaid(order_id))
            }
        }
        PaymentState::Failed => {
            if order.is_paid() {
                tracing::warn!(
                    order_id = %order_id,
                    transfer_id = %transfer_id,
                    "failure reported for paid order, ignored"
                );
                return Ok(OrderOutcome::Anomaly {
                    order_id,
                    current: order.payment_state(),
                });
            }

            let message = transfer
                .failure_message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(UNKNOWN_FAILURE);
            let note = failed_note(&transfer_id, message);
            if orders.mark_failed(order_id, &note).await?.applied() {
                tracing::info!(order_id = %order_id, reason = %message, "order marked failed");
                Ok(OrderOutcome::MarkedFailed(order_id))
            } else {
                Ok(OrderOutcome::AlreadyFailed(order_id))
            }
        }
        other => {
            tracing::info!(order_id = %order_id, state = %other, "transfer state not handled by webhook");
            Ok(OrderOutcome::Unhandled {
                order_id,
                state: other,
            })
        }
    }
}
