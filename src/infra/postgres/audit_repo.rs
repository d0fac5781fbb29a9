use {
    crate::domain::{
        error::PipelineError,
        id::{LocalSubscriptionId, OrderId},
        order::Note,
    },
    sqlx::{Postgres, Transaction},
};

pub async fn insert_order_note(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    note: &Note,
) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
        INSERT INTO order_notes (id, order_id, note, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(note.id)
    .bind(order_id.get())
    .bind(&note.text)
    .bind(note.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn insert_subscription_note(
    tx: &mut Transaction<'_, Postgres>,
    subscription_id: LocalSubscriptionId,
    note: &Note,
) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
        INSERT INTO subscription_notes (id, subscription_id, note, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(note.id)
    .bind(subscription_id.get())
    .bind(&note.text)
    .bind(note.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
