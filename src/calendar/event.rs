use serde::{Deserialize, Serialize};

use super::datetime;

pub type EventId = i64;

/// An event as served by the backend.
///
/// `start_time`/`end_time` are kept as the raw strings the server sent. For
/// all-day events they carry date-only semantics and `end_time` is exclusive;
/// timed events are instants, implicitly UTC when no offset is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Event {
    pub fn time_display(&self) -> String {
        if self.all_day {
            "All day".to_string()
        } else {
            datetime::format_time(&self.start_time)
        }
    }

    pub fn duration_display(&self) -> String {
        if self.all_day {
            "All day".to_string()
        } else {
            format!(
                "{} - {}",
                datetime::format_time(&self.start_time),
                datetime::format_time(&self.end_time)
            )
        }
    }
}

/// Body of `POST /events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub all_day: bool,
}

/// Body of `PUT /events/{id}`. Fields left as `None` are omitted from the
/// request and keep their server-side value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
}

impl EventUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.all_day.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_server_payload_with_extra_fields() {
        let json = r#"{
            "id": 7,
            "title": "Soccer practice",
            "description": null,
            "start_time": "2025-08-22T17:00:00",
            "end_time": "2025-08-22T18:30:00",
            "all_day": false,
            "google_id": "abc123",
            "created_at": "2025-08-01T10:00:00",
            "updated_at": "2025-08-01T10:00:00"
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, 7);
        assert_eq!(event.description, None);
        assert_eq!(event.google_id.as_deref(), Some("abc123"));
        assert!(!event.all_day);
    }

    #[test]
    fn all_day_defaults_to_false() {
        let json = r#"{"id":1,"title":"x","start_time":"2025-08-22","end_time":"2025-08-23"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(!event.all_day);
    }

    #[test]
    fn update_omits_unset_fields() {
        let update = EventUpdate {
            title: Some("Dentist".into()),
            all_day: Some(true),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, serde_json::json!({"title": "Dentist", "all_day": true}));
        assert!(EventUpdate::default().is_empty());
        assert!(!update.is_empty());
    }
}
