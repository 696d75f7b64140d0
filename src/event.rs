//! Stripe webhook event envelope and typed classification.
//!
//! The envelope is only ever deserialized after signature verification has
//! succeeded over the raw bytes. Classification turns the string event-type
//! tag into a typed variant so that the completion path works with a real
//! metadata map instead of chasing nullable JSON fields.

use std::collections::HashMap;

use serde::Deserialize;

/// The one event type this service acts on.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Verified webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Event ID.
    pub id: String,
    /// Event type tag (e.g. "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: EventData,
    /// Unix timestamp when the event was created.
    pub created: i64,
}

/// Webhook event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    /// The object that triggered the event.
    pub object: serde_json::Value,
}

/// Checkout session payload of a completion event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSession {
    /// Session ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Free-form key/value metadata echoed back from checkout creation.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    /// Extract the `(course_id, user_id)` pair from the session metadata.
    ///
    /// Returns `None` if either key is absent or empty.
    pub fn purchase_ids(&self) -> Option<(String, String)> {
        let user_id = self.metadata.get("userId").filter(|v| !v.is_empty())?;
        let course_id = self.metadata.get("courseId").filter(|v| !v.is_empty())?;
        Some((course_id.clone(), user_id.clone()))
    }
}

/// Event classification keyed by the event-type tag.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// A checkout flow finished successfully.
    CheckoutSessionCompleted(CheckoutSession),
    /// Any other event type, carried by name for logging and the response body.
    Other(String),
}

impl Event {
    /// Classify this event into a typed variant.
    ///
    /// A completion event whose payload does not look like a checkout
    /// session classifies as a session with empty metadata, which the
    /// pipeline then rejects as missing metadata.
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => {
                let session =
                    serde_json::from_value(self.data.object.clone()).unwrap_or_default();
                EventKind::CheckoutSessionCompleted(session)
            }
            other => EventKind::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(event_type: &str, object: serde_json::Value) -> Event {
        Event {
            id: "evt_123".to_string(),
            event_type: event_type.to_string(),
            data: EventData { object },
            created: 1_700_000_000,
        }
    }

    #[test]
    fn classifies_completion_event_with_metadata() {
        let e = event(
            CHECKOUT_SESSION_COMPLETED,
            json!({
                "id": "cs_test_1",
                "metadata": {"userId": "u1", "courseId": "c1"}
            }),
        );

        match e.kind() {
            EventKind::CheckoutSessionCompleted(session) => {
                assert_eq!(
                    session.purchase_ids(),
                    Some(("c1".to_string(), "u1".to_string()))
                );
            }
            other => panic!("expected completion event, got {:?}", other),
        }
    }

    #[test]
    fn classifies_other_event_by_name() {
        let e = event("payment_intent.created", json!({}));
        match e.kind() {
            EventKind::Other(name) => assert_eq!(name, "payment_intent.created"),
            other => panic!("expected other event, got {:?}", other),
        }
    }

    #[test]
    fn missing_user_id_yields_no_purchase_ids() {
        let session = CheckoutSession {
            id: None,
            metadata: HashMap::from([("courseId".to_string(), "c1".to_string())]),
        };
        assert_eq!(session.purchase_ids(), None);
    }

    #[test]
    fn missing_course_id_yields_no_purchase_ids() {
        let session = CheckoutSession {
            id: None,
            metadata: HashMap::from([("userId".to_string(), "u1".to_string())]),
        };
        assert_eq!(session.purchase_ids(), None);
    }

    #[test]
    fn empty_values_count_as_missing() {
        let session = CheckoutSession {
            id: None,
            metadata: HashMap::from([
                ("userId".to_string(), String::new()),
                ("courseId".to_string(), "c1".to_string()),
            ]),
        };
        assert_eq!(session.purchase_ids(), None);
    }

    #[test]
    fn malformed_session_object_classifies_with_empty_metadata() {
        let e = event(CHECKOUT_SESSION_COMPLETED, json!("not an object"));
        match e.kind() {
            EventKind::CheckoutSessionCompleted(session) => {
                assert!(session.metadata.is_empty());
                assert_eq!(session.purchase_ids(), None);
            }
            other => panic!("expected completion event, got {:?}", other),
        }
    }
}
