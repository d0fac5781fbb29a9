use {
    crate::domain::{
        error::PipelineError,
        event::SubscriptionData,
        id::{LocalSubscriptionId, ProviderSubscriptionId},
        payment_state::SubscriptionState,
        store::SubscriptionStore,
        subscription::{StatusGuard, Subscription, SubscriptionStatus},
    },
    serde_json::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingData,
    MissingProviderId,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    /// Activation corroborated with a note; status untouched.
    Activated(LocalSubscriptionId),
    Cancelled(LocalSubscriptionId),
    AlreadyCancelled(LocalSubscriptionId),
    OnHold(LocalSubscriptionId),
    Expired(LocalSubscriptionId),
    Unhandled {
        subscription_id: LocalSubscriptionId,
        state: SubscriptionState,
    },
    Skipped(SkipReason),
}

/// Tag first, then the reverse lookup on the stored Finix id. The processor
/// does not echo tags on every event subtype.
async fn resolve(
    subscriptions: &dyn SubscriptionStore,
    data: &SubscriptionData,
    provider_id: &ProviderSubscriptionId,
) -> Result<Option<Subscription>, PipelineError> {
    if let Some(tag) = data.tag("subscription_id") {
        match LocalSubscriptionId::parse(&tag) {
            Ok(local_id) => {
                if let Some(found) = subscriptions.find_by_id(local_id).await? {
                    tracing::debug!(subscription_id = %local_id, "resolved by tag");
                    return Ok(Some(found));
                }
                tracing::debug!(subscription_id = %local_id, "tagged subscription not found");
            }
            Err(e) => tracing::debug!(error = %e, "ignoring unusable subscription_id tag"),
        }
    }

    let found = subscriptions.find_by_provider_id(provider_id).await?;
    if found.is_some() {
        tracing::debug!(finix_subscription_id = %provider_id, "resolved by provider id");
    }
    Ok(found)
}

/// Applies a `subscription.*` event to the matching local subscription.
pub async fn reconcile_subscription(
    subscriptions: &dyn SubscriptionStore,
    data: Option<&Value>,
) -> Result<SubscriptionOutcome, PipelineError> {
    let Some(raw) = data.filter(|d| d.is_object()) else {
        tracing::warn!("subscription event without data object");
        return Ok(SubscriptionOutcome::Skipped(SkipReason::MissingData));
    };
    let event: SubscriptionData = match serde_json::from_value(raw.clone()) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(error = %e, "subscription data has unexpected shape");
            return Ok(SubscriptionOutcome::Skipped(SkipReason::MissingData));
        }
    };

    let Some(provider_id) = event
        .id
        .as_deref()
        .and_then(|id| ProviderSubscriptionId::new(id).ok())
    else {
        tracing::warn!("subscription event without id");
        return Ok(SubscriptionOutcome::Skipped(SkipReason::MissingProviderId));
    };
    tracing::Span::current().record("object_id", tracing::field::display(&provider_id));

    let Some(subscription) = resolve(subscriptions, &event, &provider_id).await? else {
        tracing::warn!(finix_subscription_id = %provider_id, "no local subscription matches event");
        return Ok(SubscriptionOutcome::Skipped(SkipReason::NotFound));
    };
    let id = subscription.id();

    let state = SubscriptionState::parse(event.state.as_deref());
    let outcome = match state {
        SubscriptionState::Active => {
            let note = format!("Finix subscription {provider_id} activation confirmed via webhook.");
            subscriptions.append_note(id, &note).await?;
            SubscriptionOutcome::Activated(id)
        }
        SubscriptionState::Canceled => {
            let applied = subscriptions
                .update_status(
                    id,
                    SubscriptionStatus::Cancelled,
                    "Subscription cancelled via Finix webhook.",
                    StatusGuard::UnlessAlready,
                )
                .await?
                .applied();
            if applied {
                SubscriptionOutcome::Cancelled(id)
            } else {
                SubscriptionOutcome::AlreadyCancelled(id)
            }
        }
        SubscriptionState::PastDue => {
            subscriptions
                .update_status(
                    id,
                    SubscriptionStatus::OnHold,
                    "Subscription payment past due (Finix webhook).",
                    StatusGuard::Always,
                )
                .await?;
            SubscriptionOutcome::OnHold(id)
        }
        SubscriptionState::Expired => {
            subscriptions
                .update_status(
                    id,
                    SubscriptionStatus::Expired,
                    "Subscription expired (Finix webhook).",
                    StatusGuard::Always,
                )
                .await?;
            SubscriptionOutcome::Expired(id)
        }
        other => {
            tracing::info!(subscription_id = %id, state = %other, "subscription state not handled");
            return Ok(SubscriptionOutcome::Unhandled {
                subscription_id: id,
                state: other,
            });
        }
    };

    tracing::info!(subscription_id = %id, ?outcome, "subscription reconciled");
    Ok(outcome)
}
