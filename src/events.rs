//! Typed passenger events.
//!
//! The broker publishes one JSON object per `MESSAGE` frame on the
//! `/passengers` destination. The network graph consuming these events
//! lives outside this crate; the SDK ends at the typed value.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Direction of a passenger crossing a station gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    In,
    Out,
}

/// One passenger event as published by the broker.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerEvent {
    /// Station the event was recorded at
    pub station_id: String,
    /// Whether the passenger entered or exited
    #[serde(rename = "passenger_event")]
    pub kind: EventKind,
    /// Broker-side timestamp, ISO 8601
    pub datetime: String,
}

impl PassengerEvent {
    /// Decode one event from a message body.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_broker_payload() {
        let body = r#"{
            "datetime": "2020-11-01T07:18:50.234000Z",
            "passenger_event": "in",
            "station_id": "station_211"
        }"#;
        let event = PassengerEvent::from_json(body).unwrap();
        assert_eq!(event.station_id, "station_211");
        assert_eq!(event.kind, EventKind::In);
        assert_eq!(event.datetime, "2020-11-01T07:18:50.234000Z");
    }

    #[test]
    fn rejects_an_unknown_event_kind() {
        let body = r#"{
            "datetime": "2020-11-01T07:18:50.234000Z",
            "passenger_event": "sideways",
            "station_id": "station_211"
        }"#;
        assert!(PassengerEvent::from_json(body).is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let event = PassengerEvent {
            station_id: "station_42".to_owned(),
            kind: EventKind::Out,
            datetime: "2020-11-01T07:18:50.234000Z".to_owned(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(PassengerEvent::from_json(&json).unwrap(), event);
    }
}
