// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wire envelopes and queue task payloads for the api-call broker.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Request envelope submitted by guests through `ws_api_call`.
///
/// The top-level `eventType` header names the numeric event type the async
/// response is re-injected as. `async: true` routes through the work queue;
/// otherwise the router answers inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub header: HashMap<String, Vec<String>>,
    #[serde(default, with = "base64_bytes")]
    pub body: Vec<u8>,
    #[serde(default, rename = "async")]
    pub asynchronous: bool,
}

pub const EVENT_TYPE_HEADER: &str = "eventType";

impl HttpRequest {
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header
            .get(name)
            .and_then(|vs| vs.first())
            .map(String::as_str)
    }

    /// The numeric event type the response will dispatch as.
    pub fn event_type(&self) -> Option<u32> {
        self.header_value(EVENT_TYPE_HEADER)?.parse().ok()
    }

    /// Path component of `url`, with scheme/host and query stripped.
    pub fn path(&self) -> &str {
        let rest = match self.url.find("://") {
            Some(i) => {
                let after = &self.url[i + 3..];
                match after.find('/') {
                    Some(j) => &after[j..],
                    None => "/",
                }
            }
            None => self.url.as_str(),
        };
        match rest.find('?') {
            Some(i) => &rest[..i],
            None => rest,
        }
    }
}

/// Response envelope copied back to the guest and re-injected as an event
/// payload. Field names are the fixed wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "StatusCode")]
    pub status_code: i32,
    #[serde(rename = "Proto")]
    pub proto: String,
    #[serde(rename = "Header", default)]
    pub header: HashMap<String, Vec<String>>,
    #[serde(rename = "Body", default, with = "base64_bytes")]
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn with_status(code: i32, reason: &str, body: Vec<u8>) -> Self {
        Self {
            status: format!("{} {}", code, reason),
            status_code: code,
            proto: "HTTP/1.1".to_string(),
            header: HashMap::new(),
            body,
        }
    }

    pub fn ok(body: Vec<u8>) -> Self {
        Self::with_status(200, "OK", body)
    }

    pub fn accepted() -> Self {
        Self::with_status(202, "Accepted", Vec::new())
    }

    pub fn not_found() -> Self {
        Self::with_status(404, "Not Found", Vec::new())
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::with_status(400, "Bad Request", msg.as_bytes().to_vec())
    }

    pub fn internal_error(msg: &str) -> Self {
        Self::with_status(500, "Internal Server Error", msg.as_bytes().to_vec())
    }
}

/// Queue task kinds. `ApiCall` carries a pending outbound request,
/// `ApiResult` carries a captured response on its way back into the
/// dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ApiCall,
    ApiResult,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::ApiCall => write!(f, "api_call"),
            TaskKind::ApiResult => write!(f, "api_result"),
        }
    }
}

/// A unit of queued work. `attempt` counts deliveries for the backoff
/// policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub kind: TaskKind,
    pub payload: Vec<u8>,
    #[serde(default)]
    pub attempt: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCallTask {
    pub project_name: String,
    pub request: HttpRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResultTask {
    pub project_name: String,
    pub event_type: u32,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl Task {
    pub fn api_call(project_name: &str, request: &HttpRequest) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: TaskKind::ApiCall,
            payload: serde_json::to_vec(&ApiCallTask {
                project_name: project_name.to_string(),
                request: request.clone(),
            })?,
            attempt: 0,
        })
    }

    pub fn api_result(
        project_name: &str,
        event_type: u32,
        data: Vec<u8>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: TaskKind::ApiResult,
            payload: serde_json::to_vec(&ApiResultTask {
                project_name: project_name.to_string(),
                event_type,
                data,
            })?,
            attempt: 0,
        })
    }
}

pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
