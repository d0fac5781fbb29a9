use {
    derive_more::Display,
    serde::Deserialize,
    serde_json::{Map, Value},
};

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum EventType {
    #[display("transfer.created")]
    TransferCreated,
    #[display("transfer.updated")]
    TransferUpdated,
    #[display("subscription.created")]
    SubscriptionCreated,
    #[display("subscription.updated")]
    SubscriptionUpdated,
    #[display("{_0}")]
    Other(String),
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "transfer.created" => Self::TransferCreated,
            "transfer.updated" => Self::TransferUpdated,
            "subscription.created" => Self::SubscriptionCreated,
            "subscription.updated" => Self::SubscriptionUpdated,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The outer webhook JSON. Only `type` is mandatory; `data` is handed to the
/// reconcilers untouched so each can validate it.
#[derive(Debug)]
pub struct WebhookEnvelope {
    pub event_type: EventType,
    pub data: Option<Value>,
}

impl WebhookEnvelope {
    /// `None` for anything that is not a JSON object with a string `type`.
    pub fn parse(body: &str) -> Option<Self> {
        let mut value: Value = serde_json::from_str(body).ok()?;
        let obj = value.as_object_mut()?;
        let event_type = EventType::from(obj.get("type")?.as_str()?);
        let data = obj.remove("data");
        Some(Self { event_type, data })
    }
}

/// Correlation tags echoed back by the processor. Advisory lookup keys only.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(transparent)]
pub struct Tags(Map<String, Value>);

impl Tags {
    /// Tag values are strings on the wire, but numbers have been seen too.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub tags: Option<Tags>,
    #[serde(default)]
    pub failure_message: Option<String>,
}

impl TransferData {
    pub fn tag(&self, key: &str) -> Option<String> {
        self.tags.as_ref().and_then(|t| t.get(key))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub tags: Option<Tags>,
}

impl SubscriptionData {
    pub fn tag(&self, key: &str) -> Option<String> {
        self.tags.as_ref().and_then(|t| t.get(key))
    }
}
