//! WebSocket message DTOs.
//!
//! Every frame is a JSON object tagged by `type`. Inbound frames carry their
//! payload in `data`; outbound snapshots carry the location list in `data`.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Coordinates, Location, ParticipantId, SessionId, Timestamp, ValueObjectError,
};

/// Message type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    AllLocations,
    LocationUpdate,
    Ping,
    Pong,
}

impl MessageType {
    /// Parse the `type` tag of an inbound frame
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "all_locations" => Some(Self::AllLocations),
            "location_update" => Some(Self::LocationUpdate),
            "ping" => Some(Self::Ping),
            "pong" => Some(Self::Pong),
            _ => None,
        }
    }
}

/// Envelope of every client-to-server frame.
///
/// The tag is kept as a raw string so frames with unknown types can still be
/// decoded, logged and dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    pub r#type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Location as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Capture time (epoch milliseconds). Absent on the way in means "now".
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl LocationDto {
    /// Validate into a domain Location, stamping `now` when the client sent no timestamp
    pub fn into_location(self, now: Timestamp) -> Result<Location, ValueObjectError> {
        let participant_id = ParticipantId::new(self.user_id)?;
        let coordinates = Coordinates::new(self.latitude, self.longitude)?;
        let timestamp = self.timestamp.map(Timestamp::new).unwrap_or(now);
        Ok(Location::new(participant_id, coordinates, timestamp))
    }
}

impl From<&Location> for LocationDto {
    fn from(location: &Location) -> Self {
        Self {
            user_id: location.participant_id.as_str().to_string(),
            latitude: location.coordinates.latitude(),
            longitude: location.coordinates.longitude(),
            timestamp: Some(location.timestamp.value()),
        }
    }
}

/// Full location set of a session, pushed on join and after every accepted update
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllLocationsMessage {
    pub r#type: MessageType,
    pub data: Vec<LocationDto>,
    pub session_id: String,
}

impl AllLocationsMessage {
    pub fn new(session_id: &SessionId, locations: &[Location]) -> Self {
        Self {
            r#type: MessageType::AllLocations,
            data: locations.iter().map(LocationDto::from).collect(),
            session_id: session_id.as_str().to_string(),
        }
    }
}

/// Direct reply to a client `ping`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongMessage {
    pub r#type: MessageType,
    pub timestamp: i64,
}

impl PongMessage {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            r#type: MessageType::Pong,
            timestamp: timestamp.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_frame_location_update() {
        // テスト項目: a location_update frame decodes into a domain Location
        // given (前提条件):
        let text = json!({
            "type": "location_update",
            "data": {
                "userId": "bob",
                "latitude": 3.0,
                "longitude": 4.0,
                "heading": 90,
                "timestamp": 1_700_000_000_000i64,
            }
        })
        .to_string();

        // when (操作):
        let frame: ClientFrame = serde_json::from_str(&text).unwrap();
        let dto: LocationDto = serde_json::from_value(frame.data).unwrap();
        let location = dto.into_location(Timestamp::new(0)).unwrap();

        // then (期待する結果):
        assert_eq!(MessageType::parse(&frame.r#type), Some(MessageType::LocationUpdate));
        assert_eq!(location.participant_id.as_str(), "bob");
        assert_eq!(location.coordinates.latitude(), 3.0);
        assert_eq!(location.coordinates.longitude(), 4.0);
        assert_eq!(location.timestamp, Timestamp::new(1_700_000_000_000));
    }

    #[test]
    fn test_client_frame_ping_without_data() {
        // テスト項目: a ping frame needs no payload
        // when (操作):
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"ping","timestamp":1}"#).unwrap();

        // then (期待する結果):
        assert_eq!(MessageType::parse(&frame.r#type), Some(MessageType::Ping));
        assert!(frame.data.is_null());
    }

    #[test]
    fn test_location_dto_missing_timestamp_uses_now() {
        // テスト項目: a location without timestamp is stamped with the server time
        // given (前提条件):
        let dto: LocationDto =
            serde_json::from_value(json!({"userId": "alice", "latitude": 1.0, "longitude": 2.0}))
                .unwrap();

        // when (操作):
        let location = dto.into_location(Timestamp::new(99)).unwrap();

        // then (期待する結果):
        assert_eq!(location.timestamp, Timestamp::new(99));
    }

    #[test]
    fn test_location_dto_rejects_invalid_values() {
        // テスト項目: empty user ids and out-of-range coordinates are validation errors
        // given (前提条件):
        let empty_user = LocationDto {
            user_id: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            timestamp: None,
        };
        let bad_latitude = LocationDto {
            user_id: "alice".to_string(),
            latitude: 123.0,
            longitude: 0.0,
            timestamp: None,
        };

        // then (期待する結果):
        assert_eq!(
            empty_user.into_location(Timestamp::new(0)).unwrap_err(),
            ValueObjectError::ParticipantIdEmpty
        );
        assert_eq!(
            bad_latitude.into_location(Timestamp::new(0)).unwrap_err(),
            ValueObjectError::LatitudeOutOfRange(123.0)
        );
    }

    #[test]
    fn test_all_locations_message_shape() {
        // テスト項目: the snapshot serializes with type, data and sessionId
        // given (前提条件):
        let session_id = SessionId::new("S1".to_string()).unwrap();
        let alice = Location::new(
            ParticipantId::new("alice".to_string()).unwrap(),
            Coordinates::new(1.0, 2.0).unwrap(),
            Timestamp::new(10),
        );

        // when (操作):
        let value = serde_json::to_value(AllLocationsMessage::new(&session_id, &[alice])).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "type": "all_locations",
                "data": [{"userId": "alice", "latitude": 1.0, "longitude": 2.0, "timestamp": 10}],
                "sessionId": "S1"
            })
        );
    }

    #[test]
    fn test_pong_message_shape() {
        // テスト項目: pong carries only type and timestamp
        // when (操作):
        let value = serde_json::to_value(PongMessage::new(Timestamp::new(5))).unwrap();

        // then (期待する結果):
        assert_eq!(value, json!({"type": "pong", "timestamp": 5}));
    }
}
