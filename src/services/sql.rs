// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-project SQL store.
//!
//! Guests submit a parameterized query envelope; the host parses it into a
//! statement plus positional params, executes, and for reads serializes the
//! rows to a deterministic JSON array (object keys sorted, one object per
//! row).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parking_lot::Mutex;
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;
use serde::Deserialize;

use crate::services::ServiceError;

/// Wire envelope for `ws_get_sql_db` / `ws_set_sql_db`.
#[derive(Debug, Deserialize)]
pub struct QueryEnvelope {
    pub statement: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

/// A project database. One store per provisioned project; instances of the
/// project share it.
pub struct SqlStore {
    name: String,
    conn: Mutex<Connection>,
}

impl SqlStore {
    pub fn open_in_memory(name: &str) -> Result<Self, ServiceError> {
        Ok(Self {
            name: name.to_string(),
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    pub fn open(name: &str, path: &std::path::Path) -> Result<Self, ServiceError> {
        Ok(Self {
            name: name.to_string(),
            conn: Mutex::new(Connection::open(path)?),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute the envelope for its side effect; returns affected row count.
    pub fn exec(&self, envelope: &[u8]) -> Result<usize, ServiceError> {
        let envelope: QueryEnvelope = serde_json::from_slice(envelope)?;
        let params = bind_params(&envelope.params)?;
        let conn = self.conn.lock();
        let affected = conn.execute(&envelope.statement, rusqlite::params_from_iter(params))?;
        Ok(affected)
    }

    /// Run the envelope as a query; rows come back as a JSON array of
    /// `{column: value}` objects.
    pub fn query(&self, envelope: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let envelope: QueryEnvelope = serde_json::from_slice(envelope)?;
        let params = bind_params(&envelope.params)?;
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&envelope.statement)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut out = Vec::new();
        let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
        while let Some(row) = rows.next()? {
            let mut object = serde_json::Map::new();
            for (i, column) in columns.iter().enumerate() {
                object.insert(column.clone(), json_value(row.get_ref(i)?));
            }
            out.push(serde_json::Value::Object(object));
        }

        Ok(serde_json::to_vec(&serde_json::Value::Array(out))?)
    }
}

fn bind_params(params: &[serde_json::Value]) -> Result<Vec<Value>, ServiceError> {
    params.iter().map(bind_param).collect()
}

fn bind_param(value: &serde_json::Value) -> Result<Value, ServiceError> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Integer(*b as i64)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Real(f))
            } else {
                Err(ServiceError::UnsupportedParam(n.to_string()))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
        other => Err(ServiceError::UnsupportedParam(other.to_string())),
    }
}

fn json_value(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Value::from(f),
        ValueRef::Text(t) => serde_json::Value::from(String::from_utf8_lossy(t).to_string()),
        ValueRef::Blob(b) => serde_json::Value::from(BASE64.encode(b)),
    }
}
