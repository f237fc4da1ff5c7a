// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;

use crate::services::ServiceError;

/// Per-project MQTT publisher seam for `ws_send_mqtt_msg`.
pub trait MqttPublisher: Send + Sync {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), ServiceError>;
}

/// In-process publisher that records every message.
pub struct RecordingMqttPublisher {
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingMqttPublisher {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().clone()
    }
}

impl Default for RecordingMqttPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MqttPublisher for RecordingMqttPublisher {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), ServiceError> {
        if topic.is_empty() {
            return Err(ServiceError::Mqtt("empty topic".to_string()));
        }
        self.published
            .lock()
            .push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_records_topic_and_payload() {
        let publisher = RecordingMqttPublisher::new();
        publisher.publish("devices/1/ack", b"ok").unwrap();
        assert_eq!(
            publisher.published(),
            vec![("devices/1/ack".to_string(), b"ok".to_vec())]
        );
    }

    #[test]
    fn empty_topic_is_rejected() {
        let publisher = RecordingMqttPublisher::new();
        assert!(publisher.publish("", b"x").is_err());
    }
}
