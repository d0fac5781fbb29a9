use {
    super::error::PipelineError,
    super::id::{OrderId, TransferId},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OrderPaymentState {
    Unpaid,
    Paid,
    Failed,
    OnHold,
    Cancelled,
}

impl OrderPaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::OnHold => "on-hold",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }

    /// Paid is terminal: nothing moves an order out of it. Every other state
    /// can still be paid, failed, held or cancelled, but never to itself.
    pub fn can_transition_to(&self, next: &OrderPaymentState) -> bool {
        !self.is_paid() && self != next
    }
}

impl fmt::Display for OrderPaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for OrderPaymentState {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "on-hold" => Ok(Self::OnHold),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(PipelineError::Validation(format!(
                "unknown order payment state: {other}"
            ))),
        }
    }
}

/// Payment metadata carried from checkout through to renewals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMeta {
    pub transfer_id: Option<TransferId>,
    pub instrument_id: Option<String>,
    pub fraud_session_id: Option<String>,
    pub custom_description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    id: OrderId,
    payment_state: OrderPaymentState,
    meta: PaymentMeta,
}

impl Order {
    pub fn new(id: OrderId, payment_state: OrderPaymentState, meta: PaymentMeta) -> Self {
        Self {
            id,
            payment_state,
            meta,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn payment_state(&self) -> OrderPaymentState {
        self.payment_state
    }

    pub fn is_paid(&self) -> bool {
        self.payment_state.is_paid()
    }

    pub fn meta(&self) -> &PaymentMeta {
        &self.meta
    }

    pub fn transfer_id(&self) -> Option<&TransferId> {
        self.meta.transfer_id.as_ref()
    }
}

/// One line of the audit trail shown on an order or subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Result of a guarded status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    /// The guard did not hold; nothing was written.
    Unchanged,
}

impl TransitionOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
