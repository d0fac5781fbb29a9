use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// Finix transfer identifier (`TRxxx`). Stable key for payment completion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(String);

impl TransferId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PipelineError::Validation("TransferId cannot be empty".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Finix-side subscription identifier, stored locally as `_finix_subscription_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderSubscriptionId(String);

impl ProviderSubscriptionId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PipelineError::Validation(
                "ProviderSubscriptionId cannot be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

fn parse_local_id(kind: &str, raw: &str) -> Result<i64, PipelineError> {
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| PipelineError::Validation(format!("{kind} must be numeric, got: {raw}")))?;
    if id <= 0 {
        return Err(PipelineError::Validation(format!(
            "{kind} must be positive, got: {id}"
        )));
    }
    Ok(id)
}

/// Local order id, as echoed back in `tags.order_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    pub fn new(id: i64) -> Result<Self, PipelineError> {
        if id <= 0 {
            return Err(PipelineError::Validation(format!(
                "OrderId must be positive, got: {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        parse_local_id("OrderId", raw).map(Self)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

/// Local subscription id, as echoed back in `tags.subscription_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalSubscriptionId(i64);

impl LocalSubscriptionId {
    pub fn new(id: i64) -> Result<Self, PipelineError> {
        if id <= 0 {
            return Err(PipelineError::Validation(format!(
                "LocalSubscriptionId must be positive, got: {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        parse_local_id("LocalSubscriptionId", raw).map(Self)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}
