use {
    super::audit_repo::insert_order_note,
    crate::domain::{
        error::PipelineError,
        id::{OrderId, TransferId},
        order::{Note, Order, OrderPaymentState, PaymentMeta, TransitionOutcome},
        store::{OrderStore, StoreFuture},
    },
    sqlx::PgPool,
};

type OrderRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn order_from_row(row: OrderRow) -> Result<Order, PipelineError> {
    let (id, state, transfer_id, instrument_id, fraud_session_id, custom_description) = row;
    Ok(Order::new(
        OrderId::new(id)?,
        OrderPaymentState::try_from(state.as_str())?,
        PaymentMeta {
            transfer_id: transfer_id.map(TransferId::new).transpose()?,
            instrument_id,
            fraud_session_id,
            custom_description,
        },
    ))
}

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_inner(&self, id: OrderId) -> Result<Option<Order>, PipelineError> {
        sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, payment_state, transfer_id, instrument_id, fraud_session_id, custom_description
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .map(order_from_row)
        .transpose()
    }

    /// Single conditional UPDATE; the note is written in the same transaction
    /// only when a row actually changed.
    async fn mark_paid_inner(
        &self,
        id: OrderId,
        transfer_id: &TransferId,
        note: &str,
    ) -> Result<TransitionOutcome, PipelineError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET payment_state = 'paid', transfer_id = $2, paid_at = now(), updated_at = now()
            WHERE id = $1 AND payment_state <> 'paid'
            RETURNING id
            "#,
        )
        .bind(id.get())
        .bind(transfer_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            tx.commit().await?;
            return Ok(TransitionOutcome::Unchanged);
        }

        insert_order_note(&mut tx, id, &Note::new(note)).await?;
        tx.commit().await?;
        Ok(TransitionOutcome::Applied)
    }

    /// Mirrors `OrderPaymentState::can_transition_to` in SQL.
    async fn set_payment_state_inner(
        &self,
        id: OrderId,
        state: OrderPaymentState,
        note: &str,
    ) -> Result<TransitionOutcome, PipelineError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET payment_state = $2, updated_at = now()
            WHERE id = $1 AND payment_state <> 'paid' AND payment_state <> $2
            RETURNING id
            "#,
        )
        .bind(id.get())
        .bind(state.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            tx.commit().await?;
            return Ok(TransitionOutcome::Unchanged);
        }

        insert_order_note(&mut tx, id, &Note::new(note)).await?;
        tx.commit().await?;
        Ok(TransitionOutcome::Applied)
    }

    async fn append_note_inner(&self, id: OrderId, text: &str) -> Result<(), PipelineError> {
        let mut tx = self.pool.begin().await?;
        insert_order_note(&mut tx, id, &Note::new(text)).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_payment_meta_inner(
        &self,
        id: OrderId,
        meta: &PaymentMeta,
    ) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            UPDATE orders
            SET transfer_id = COALESCE($2, transfer_id),
                instrument_id = COALESCE($3, instrument_id),
                fraud_session_id = COALESCE($4, fraud_session_id),
                custom_description = COALESCE($5, custom_description),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .bind(meta.transfer_id.as_ref().map(TransferId::as_str))
        .bind(meta.instrument_id.as_deref())
        .bind(meta.fraud_session_id.as_deref())
        .bind(meta.custom_description.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl OrderStore for PgOrderStore {
    fn find(&self, id: OrderId) -> StoreFuture<'_, Option<Order>> {
        Box::pin(self.find_inner(id))
    }

    fn mark_paid<'a>(
        &'a self,
        id: OrderId,
        transfer_id: &'a TransferId,
        note: &'a str,
    ) -> StoreFuture<'a, TransitionOutcome> {
        Box::pin(self.mark_paid_inner(id, transfer_id, note))
    }

    fn set_payment_state<'a>(
        &'a self,
        id: OrderId,
        state: OrderPaymentState,
        note: &'a str,
    ) -> StoreFuture<'a, TransitionOutcome> {
        Box::pin(self.set_payment_state_inner(id, state, note))
    }

    fn append_note<'a>(&'a self, id: OrderId, text: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(self.append_note_inner(id, text))
    }

    fn save_payment_meta<'a>(
        &'a self,
        id: OrderId,
        meta: &'a PaymentMeta,
    ) -> StoreFuture<'a, ()> {
        Box::pin(self.save_payment_meta_inner(id, meta))
    }
}
