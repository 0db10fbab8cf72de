use serde::{Deserialize, Serialize};

/// Pong message data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pong {
    /// server time when the pong was sent, format is decided by server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Value>,
}

/// One record in the activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// user id
    pub id: serde_json::Value,
    /// user phone number
    pub phone: String,
    /// last active time of this user
    pub last_active: serde_json::Value,
}

/// Application data received from activity feed.
///
/// The client never interprets it, accessors here only read the dashboard convention of
/// `{timestamp, total_records, data}` and return `None` when the shape does not match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityPayload(serde_json::Value);

impl ActivityPayload {
    /// Wrap a json value
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// raw json value
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// unwrap to raw json value
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// `timestamp` field
    pub fn timestamp(&self) -> Option<&serde_json::Value> {
        self.0.get("timestamp")
    }

    /// `total_records` field
    pub fn total_records(&self) -> Option<u64> {
        self.0.get("total_records")?.as_u64()
    }

    /// `data` field parsed as activity records
    pub fn records(&self) -> Option<Vec<ActivityRecord>> {
        let data = self.0.get("data")?;
        match Vec::<ActivityRecord>::deserialize(data) {
            Ok(records) => Some(records),
            Err(err) => {
                log::trace!("Activity data is not a record list: {}", err);
                None
            }
        }
    }
}

impl From<serde_json::Value> for ActivityPayload {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_records() {
        let payload = ActivityPayload::new(json!({
            "timestamp": 1714557600,
            "total_records": 2,
            "data": [
                {"id": 1, "phone": "+998901111111", "last_active": "2024-05-01T09:00:00Z"},
                {"id": 2, "phone": "+998902222222", "last_active": null},
            ],
        }));

        let records = payload.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].phone, "+998901111111");
        assert_eq!(records[1].last_active, serde_json::Value::Null);
        assert_eq!(payload.total_records(), Some(2));
    }

    #[test]
    fn test_payload_with_other_shape() {
        let payload = ActivityPayload::new(json!({"data": "not a list"}));

        assert!(payload.records().is_none());
        assert!(payload.total_records().is_none());
        assert!(payload.timestamp().is_none());
    }
}
