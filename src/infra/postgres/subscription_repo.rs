use {
    super::audit_repo::insert_subscription_note,
    crate::domain::{
        error::PipelineError,
        id::{LocalSubscriptionId, ProviderSubscriptionId},
        order::{Note, TransitionOutcome},
        store::{StoreFuture, SubscriptionStore},
        subscription::{StatusGuard, Subscription, SubscriptionStatus},
    },
    sqlx::PgPool,
};

type SubscriptionRow = (i64, String, Option<String>, Option<String>);

fn subscription_from_row(row: SubscriptionRow) -> Result<Subscription, PipelineError> {
    let (id, status, finix_subscription_id, instrument_id) = row;
    Ok(Subscription::new(
        LocalSubscriptionId::new(id)?,
        SubscriptionStatus::try_from(status.as_str())?,
        finix_subscription_id
            .map(ProviderSubscriptionId::new)
            .transpose()?,
        instrument_id,
    ))
}

#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_id_inner(
        &self,
        id: LocalSubscriptionId,
    ) -> Result<Option<Subscription>, PipelineError> {
        sqlx::query_as::<_, SubscriptionRow>(
            "SELECT id, status, finix_subscription_id, instrument_id FROM subscriptions WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .map(subscription_from_row)
        .transpose()
    }

    async fn find_by_provider_id_inner(
        &self,
        provider_id: &ProviderSubscriptionId,
    ) -> Result<Option<Subscription>, PipelineError> {
        sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, status, finix_subscription_id, instrument_id
            FROM subscriptions
            WHERE finix_subscription_id = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(provider_id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(subscription_from_row)
        .transpose()
    }

    async fn update_status_inner(
        &self,
        id: LocalSubscriptionId,
        status: SubscriptionStatus,
        note: &str,
        guard: StatusGuard,
    ) -> Result<TransitionOutcome, PipelineError> {
        let mut tx = self.pool.begin().await?;

        let sql = match guard {
            StatusGuard::Always => {
                "UPDATE subscriptions SET status = $2, updated_at = now() WHERE id = $1 RETURNING id"
            }
            StatusGuard::UnlessAlready => {
                "UPDATE subscriptions SET status = $2, updated_at = now() WHERE id = $1 AND status <> $2 RETURNING id"
            }
        };
        let updated: Option<i64> = sqlx::query_scalar(sql)
            .bind(id.get())
            .bind(status.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        if updated.is_none() {
            tx.commit().await?;
            return Ok(TransitionOutcome::Unchanged);
        }

        insert_subscription_note(&mut tx, id, &Note::new(note)).await?;
        tx.commit().await?;
        Ok(TransitionOutcome::Applied)
    }

    async fn append_note_inner(
        &self,
        id: LocalSubscriptionId,
        text: &str,
    ) -> Result<(), PipelineError> {
        let mut tx = self.pool.begin().await?;
        insert_subscription_note(&mut tx, id, &Note::new(text)).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn link_provider_inner(
        &self,
        id: LocalSubscriptionId,
        provider_id: &ProviderSubscriptionId,
        instrument_id: Option<&str>,
    ) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET finix_subscription_id = $2,
                instrument_id = COALESCE($3, instrument_id),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .bind(provider_id.as_str())
        .bind(instrument_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl SubscriptionStore for PgSubscriptionStore {
    fn find_by_id(&self, id: LocalSubscriptionId) -> StoreFuture<'_, Option<Subscription>> {
        Box::pin(self.find_by_id_inner(id))
    }

    fn find_by_provider_id<'a>(
        &'a self,
        provider_id: &'a ProviderSubscriptionId,
    ) -> StoreFuture<'a, Option<Subscription>> {
        Box::pin(self.find_by_provider_id_inner(provider_id))
    }

    fn update_status<'a>(
        &'a self,
        id: LocalSubscriptionId,
        status: SubscriptionStatus,
        note: &'a str,
        guard: StatusGuard,
    ) -> StoreFuture<'a, TransitionOutcome> {
        Box::pin(self.update_status_inner(id, status, note, guard))
    }

    fn append_note<'a>(&'a self, id: LocalSubscriptionId, text: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(self.append_note_inner(id, text))
    }

    fn link_provider<'a>(
        &'a self,
        id: LocalSubscriptionId,
        provider_id: &'a ProviderSubscriptionId,
        instrument_id: Option<&'a str>,
    ) -> StoreFuture<'a, ()> {
        Box::pin(self.link_provider_inner(id, provider_id, instrument_id))
    }
}
