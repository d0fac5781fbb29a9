use {
    super::error::PipelineError,
    super::id::{LocalSubscriptionId, ProviderSubscriptionId},
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SubscriptionStatus {
    Active,
    OnHold,
    Cancelled,
    Expired,
    PendingCancel,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnHold => "on-hold",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::PendingCancel => "pending-cancel",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SubscriptionStatus {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "active" => Ok(Self::Active),
            "on-hold" => Ok(Self::OnHold),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            "pending-cancel" => Ok(Self::PendingCancel),
            other => Err(PipelineError::Validation(format!(
                "unknown subscription status: {other}"
            ))),
        }
    }
}

/// When a status write should go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGuard {
    /// Write even if the record already holds the target status.
    Always,
    /// Compare-and-set: write only while the current status differs.
    UnlessAlready,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    id: LocalSubscriptionId,
    status: SubscriptionStatus,
    finix_subscription_id: Option<ProviderSubscriptionId>,
    instrument_id: Option<String>,
}

impl Subscription {
    pub fn new(
        id: LocalSubscriptionId,
        status: SubscriptionStatus,
        finix_subscription_id: Option<ProviderSubscriptionId>,
        instrument_id: Option<String>,
    ) -> Self {
        Self {
            id,
            status,
            finix_subscription_id,
            instrument_id,
        }
    }

    pub fn id(&self) -> LocalSubscriptionId {
        self.id
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    pub fn finix_subscription_id(&self) -> Option<&ProviderSubscriptionId> {
        self.finix_subscription_id.as_ref()
    }

    pub fn instrument_id(&self) -> Option<&str> {
        self.instrument_id.as_deref()
    }
}
