use {serde_json::Value, std::fmt};

/// Semantic state of a transfer, normalized from whatever envelope the
/// processor returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    Succeeded,
    Pending,
    Failed,
    Canceled,
    /// Absent or unmapped. Callers hold, never fail or complete, on this.
    Unknown,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "SUCCEEDED",
            Self::Pending => "PENDING",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn from_raw(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "SUCCEEDED" => Self::Succeeded,
            "PENDING" => Self::Pending,
            "FAILED" => Self::Failed,
            "CANCELED" | "CANCELLED" => Self::Canceled,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Synchronous API responses nest the state under `response.state`, webhook
/// payloads carry it at the top level. Returns the first string found.
pub fn raw_state(value: &Value) -> Option<&str> {
    let obj = value.as_object()?;
    obj.get("response")
        .and_then(|r| r.get("state"))
        .and_then(Value::as_str)
        .or_else(|| obj.get("state").and_then(Value::as_str))
}

pub fn classify(value: &Value) -> PaymentState {
    raw_state(value)
        .map(PaymentState::from_raw)
        .unwrap_or(PaymentState::Unknown)
}

/// Normalized subscription lifecycle state reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    Active,
    Canceled,
    PastDue,
    Expired,
    Unrecognized(String),
    Missing,
}

impl SubscriptionState {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Missing;
        };
        match normalize(raw).as_str() {
            "ACTIVE" => Self::Active,
            "CANCELED" | "CANCELLED" => Self::Canceled,
            "PAST_DUE" => Self::PastDue,
            "EXPIRED" => Self::Expired,
            _ => Self::Unrecognized(raw.to_string()),
        }
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::PastDue => write!(f, "PAST_DUE"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Unrecognized(raw) => write!(f, "unrecognized({raw})"),
            Self::Missing => write!(f, "missing"),
        }
    }
}
