/// Notification types
///
/// A notification is pushed for every consumed signal: the topic is the
/// signal name, the payload is the handler's result map.
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Scalar payload value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        PayloadValue::Int(value)
    }
}

impl From<f64> for PayloadValue {
    fn from(value: f64) -> Self {
        PayloadValue::Float(value)
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::Str(value)
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::Str(value.to_string())
    }
}

impl fmt::Display for PayloadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadValue::Str(value) => write!(f, "{}", value),
            PayloadValue::Int(value) => write!(f, "{}", value),
            PayloadValue::Float(value) => write!(f, "{}", value),
        }
    }
}

/// Result map produced by a handler
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, PayloadValue>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// `{"error": message}`
    pub fn error(message: impl Into<String>) -> Self {
        Self::new().with("error", message.into())
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.get(key)
    }

    pub fn is_error(&self) -> bool {
        self.0.contains_key("error")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Pushed to subscribers once per consumed signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub topic: String,
    pub payload: Payload,
}

impl Notification {
    pub fn new(topic: impl Into<String>, payload: Payload) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Human-readable description for logs
    pub fn description(&self) -> String {
        if let Some(error) = self.payload.get("error") {
            format!("{} failed: {}", self.topic, error)
        } else if self.payload.is_empty() {
            self.topic.clone()
        } else {
            let fields: Vec<String> = self
                .payload
                .0
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            format!("{} ({})", self.topic, fields.join(", "))
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_json_shape() {
        let payload = Payload::new().with("score1", 12).with("score2", 3);
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"score1":12,"score2":3}"#
        );

        let payload = Payload::error("Invalid score data");
        assert!(payload.is_error());
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"error":"Invalid score data"}"#
        );
    }

    #[test]
    fn test_notification_json() {
        let notification = Notification::new("GAME_ACTIVE", Payload::new().with("gameMs", 30_000));
        assert_eq!(
            notification.to_json().unwrap(),
            r#"{"topic":"GAME_ACTIVE","payload":{"gameMs":30000}}"#
        );
    }

    #[test]
    fn test_notification_description() {
        let notification = Notification::new("GAME_INACTIVE", Payload::new());
        assert_eq!(notification.description(), "GAME_INACTIVE");

        let notification = Notification::new("GAME_MODE", Payload::new().with("gameMode", 1));
        assert_eq!(notification.description(), "GAME_MODE (gameMode=1)");

        let notification = Notification::new("SCORE", Payload::error("Invalid score data"));
        assert_eq!(notification.description(), "SCORE failed: Invalid score data");
    }
}
