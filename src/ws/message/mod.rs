//! Activity feed websocket message types.

mod stream;
mod types;

pub use stream::{MessageStreamSink, MessageStreamSinkError};
pub use types::{ActivityPayload, ActivityRecord, Pong};

use enum_as_inner::EnumAsInner;
use serde_json::json;
use snafu::prelude::*;

/// Error when parse frame data as message
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum ParseMessageError {
    /// binary frame data is not utf8 text
    #[snafu(display("message data is not utf8: {source}"))]
    NotUtf8 {
        /// source error
        source: std::string::FromUtf8Error,
    },

    /// data is invalid json
    #[snafu(display("parse json failed: {source}"))]
    ParseJSONFailed {
        /// data for decode
        data: String,
        /// source error
        source: serde_json::Error,
    },
}

static MESSAGE_TYPE_FIELD: &str = "type";
static PING_TYPE: &str = "ping";
static PONG_TYPE: &str = "pong";

/// Activity feed websocket protocol message
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Message {
    /// Ping, client -> server
    Ping,
    /// Pong, server -> client
    Pong(Pong),
    /// Any other json, forwarded to application as is
    Data(ActivityPayload),
}

impl Message {
    /// Decode text data to a message.
    ///
    /// An object whose `type` field is `"pong"` is the heartbeat reply, every other well-formed
    /// json value is application data.
    pub fn decode(text: &str) -> Result<Self, ParseMessageError> {
        let value: serde_json::Value =
            serde_json::from_str(text).context(error::ParseJSONFailed { data: text })?;

        let is_pong = value
            .get(MESSAGE_TYPE_FIELD)
            .and_then(|t| t.as_str())
            .map(|t| t == PONG_TYPE)
            .unwrap_or_default();

        if is_pong {
            return Ok(Self::Pong(Pong {
                timestamp: value.get("timestamp").cloned(),
            }));
        }

        Ok(Self::Data(ActivityPayload::new(value)))
    }

    /// Decode binary data holding utf8 json text
    pub fn decode_binary(data: Vec<u8>) -> Result<Self, ParseMessageError> {
        let text = String::from_utf8(data).context(error::NotUtf8)?;
        Self::decode(&text)
    }

    /// encode message to json text
    pub fn encode(&self) -> String {
        match self {
            Self::Ping => json!({ "type": PING_TYPE }).to_string(),
            Self::Pong(pong) => {
                let mut value = json!({ "type": PONG_TYPE });
                if let Some(ref timestamp) = pong.timestamp {
                    value["timestamp"] = timestamp.clone();
                }
                value.to_string()
            }
            Self::Data(payload) => payload.as_value().to_string(),
        }
    }

    /// get type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Ping => "Ping",
            Self::Pong(_) => "Pong",
            Self::Data(_) => "Data",
        }
    }
}

#[cfg(test)]
mod test {
    mod decode {
        use super::super::*;
        use serde_json::json;

        #[test]
        fn test_message_decode_pong() {
            let msg = Message::decode(r#"{"type": "pong", "timestamp": 1700000000}"#).unwrap();

            let pong = msg.into_pong().expect("decoded message is not pong");
            assert_eq!(pong.timestamp, Some(json!(1700000000)));
        }

        #[test]
        fn test_message_decode_pong_without_timestamp() {
            let msg = Message::decode(r#"{"type": "pong"}"#).unwrap();

            assert!(matches!(msg, Message::Pong(Pong { timestamp: None })));
        }

        #[test]
        fn test_message_decode_activity() {
            let text = json!({
                "timestamp": "2024-05-01T10:00:00Z",
                "total_records": 1,
                "data": [
                    {"id": 7, "phone": "+998901234567", "last_active": "2024-05-01T09:59:00Z"}
                ],
            })
            .to_string();

            let msg = Message::decode(&text).unwrap();

            let payload = msg.into_data().expect("decoded message is not data");
            assert_eq!(payload.total_records(), Some(1));
            assert_eq!(payload.timestamp(), Some(&json!("2024-05-01T10:00:00Z")));
        }

        #[test]
        fn test_message_decode_other_type_is_data() {
            let msg = Message::decode(r#"{"type": "ping"}"#).unwrap();

            let payload = msg.into_data().expect("decoded message is not data");
            assert_eq!(payload.as_value(), &json!({"type": "ping"}));
        }

        #[test]
        fn test_message_decode_non_object_is_data() {
            let msg = Message::decode("[1, 2, 3]").unwrap();

            assert!(msg.is_data());
        }

        #[test]
        fn test_message_decode_malformed() {
            let err = Message::decode("{not json").unwrap_err();

            assert!(matches!(err, ParseMessageError::ParseJSONFailed { ref data, .. } if data == "{not json"));
        }

        #[test]
        fn test_message_decode_binary_not_utf8() {
            let err = Message::decode_binary(vec![0xff, 0xfe]).unwrap_err();

            assert!(matches!(err, ParseMessageError::NotUtf8 { .. }));
        }
    }

    mod encode {
        use super::super::*;
        use serde_json::json;

        #[test]
        fn test_message_encode_ping() {
            let value: serde_json::Value = serde_json::from_str(&Message::Ping.encode()).unwrap();

            assert_eq!(value, json!({"type": "ping"}));
        }

        #[test]
        fn test_message_encode_data_is_verbatim() {
            let payload = json!({"action": "refresh", "ids": [1, 2]});
            let msg = Message::Data(ActivityPayload::new(payload.clone()));

            let value: serde_json::Value = serde_json::from_str(&msg.encode()).unwrap();
            assert_eq!(value, payload);
        }
    }
}
