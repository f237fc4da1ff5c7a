// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod auth;
mod dispatcher;

#[cfg(test)]
mod integration_tests;

pub use auth::{issue_token, verify_token, TokenClaims};
pub use dispatcher::EventDispatcher;

use serde::{Deserialize, Serialize};

/// Sentinel event type: matches every strategy, and is what a typeless
/// header dispatches as.
pub const EVENT_TYPE_ANY: u32 = 0x7FFF_FFFF;

/// Inbound event as accepted from ingress and re-emitted by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub header: EventHeader,
    #[serde(default)]
    pub payload: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventHeader {
    #[serde(default)]
    pub event_type: u32,
    #[serde(default)]
    pub pub_id: String,
    #[serde(default)]
    pub pub_time: i64,
    #[serde(default)]
    pub token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event_id: String,
}

impl EventHeader {
    /// The type used for strategy lookup: a missing/zero type means "any".
    pub fn effective_type(&self) -> u32 {
        if self.event_type == 0 {
            EVENT_TYPE_ANY
        } else {
            self.event_type
        }
    }
}

/// Per-handler entry in the dispatch result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WasmHandleResult {
    #[serde(rename = "instanceID")]
    pub instance_id: String,
    pub code: i32,
    #[serde(rename = "errMsg", skip_serializing_if = "Option::is_none")]
    pub err_msg: Option<String>,
}

/// What the dispatcher hands back to the ingress transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleEventResult {
    #[serde(rename = "projectName")]
    pub project_name: String,
    #[serde(rename = "pubID", skip_serializing_if = "Option::is_none")]
    pub pub_id: Option<String>,
    #[serde(rename = "pubName", skip_serializing_if = "Option::is_none")]
    pub pub_name: Option<String>,
    #[serde(rename = "eventID")]
    pub event_id: String,
    #[serde(rename = "errMsg", skip_serializing_if = "Option::is_none")]
    pub err_msg: Option<String>,
    #[serde(rename = "wasmResults", default)]
    pub wasm_results: Vec<WasmHandleResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_round_trips() {
        let json = r#"{
            "header": {
                "event_type": 2147483647,
                "pub_id": "dev-001",
                "pub_time": 1690000000,
                "token": "t",
                "event_id": "evt-1"
            },
            "payload": "hi"
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.header.event_type, EVENT_TYPE_ANY);
        assert_eq!(event.payload, "hi");

        let back = serde_json::to_string(&event).unwrap();
        let again: Event = serde_json::from_str(&back).unwrap();
        assert_eq!(again.header.event_id, "evt-1");
    }

    #[test]
    fn missing_header_fields_default() {
        let event: Event = serde_json::from_str(r#"{"header": {"token": "t"}}"#).unwrap();
        assert_eq!(event.header.event_type, 0);
        assert_eq!(event.header.effective_type(), EVENT_TYPE_ANY);
        assert!(event.header.event_id.is_empty());
        assert!(event.payload.is_empty());
    }

    #[test]
    fn result_serializes_with_wire_names() {
        let result = HandleEventResult {
            project_name: "p".to_string(),
            pub_id: None,
            pub_name: None,
            event_id: "e".to_string(),
            err_msg: None,
            wasm_results: vec![WasmHandleResult {
                instance_id: "3".to_string(),
                code: 0,
                err_msg: None,
            }],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["projectName"], "p");
        assert_eq!(json["wasmResults"][0]["instanceID"], "3");
        assert!(json.get("pubID").is_none());
        assert!(json["wasmResults"][0].get("errMsg").is_none());
    }
}
