// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Host ABI linked into every guest under the `env` module (plus `stat` for
//! metrics).
//!
//! Every import takes and returns signed 32-bit integers; byte payloads
//! cross the boundary through the linear-memory helpers below. Guests must
//! export `memory` and an `alloc` function for host-to-guest transfers.
//! `abort`, `trace`, and `seed` exist for toolchains (AssemblyScript) that
//! emit those imports unconditionally.

use wasmtime::{Caller, Linker, Memory};

use crate::errors::StatusCode;
use crate::services::{LogLevel, TxRequest};

use super::error::WasmResult;
use super::instance::HostState;

/// Log source tag for records produced by host ABI internals.
const SRC_HOST: &str = "wasmExportFunc";
/// Log source tag for records produced by guest code.
const SRC_GUEST: &str = "wasmCode";

fn memory_of(caller: &mut Caller<'_, HostState>) -> Option<Memory> {
    caller.get_export("memory").and_then(|e| e.into_memory())
}

/// Copy a guest linear-memory range out. Bounds violations are
/// `TransDataFromVmFailed`.
fn read_bytes(
    caller: &mut Caller<'_, HostState>,
    ptr: i32,
    size: i32,
) -> Result<Vec<u8>, StatusCode> {
    if ptr < 0 || size < 0 {
        return Err(StatusCode::TransDataFromVmFailed);
    }
    let memory = memory_of(caller).ok_or(StatusCode::TransDataFromVmFailed)?;
    let data = memory.data(&caller);
    let (ptr, size) = (ptr as usize, size as usize);
    let end = ptr.checked_add(size).ok_or(StatusCode::TransDataFromVmFailed)?;
    if end > data.len() {
        return Err(StatusCode::TransDataFromVmFailed);
    }
    Ok(data[ptr..end].to_vec())
}

/// Allocate inside the guest via its exported `alloc`, write `bytes`, and
/// store the resulting `(ptr, len)` pair at the two guest-supplied out-cells.
/// Failures are `TransDataToVmFailed`.
fn copy_bytes(
    caller: &mut Caller<'_, HostState>,
    bytes: &[u8],
    out_ptr: i32,
    out_size: i32,
) -> Result<(), StatusCode> {
    if out_ptr < 0 || out_size < 0 {
        return Err(StatusCode::TransDataToVmFailed);
    }
    let memory = memory_of(caller).ok_or(StatusCode::TransDataToVmFailed)?;
    let alloc = caller
        .get_export("alloc")
        .and_then(|e| e.into_func())
        .ok_or(StatusCode::TransDataToVmFailed)?;
    let alloc = alloc
        .typed::<i32, i32>(&caller)
        .map_err(|_| StatusCode::TransDataToVmFailed)?;

    let guest_ptr = alloc
        .call(&mut *caller, bytes.len() as i32)
        .map_err(|_| StatusCode::TransDataToVmFailed)?;
    if guest_ptr <= 0 {
        return Err(StatusCode::TransDataToVmFailed);
    }

    memory
        .write(&mut *caller, guest_ptr as usize, bytes)
        .map_err(|_| StatusCode::TransDataToVmFailed)?;
    memory
        .write(&mut *caller, out_ptr as usize, &guest_ptr.to_le_bytes())
        .map_err(|_| StatusCode::TransDataToVmFailed)?;
    memory
        .write(
            &mut *caller,
            out_size as usize,
            &(bytes.len() as i32).to_le_bytes(),
        )
        .map_err(|_| StatusCode::TransDataToVmFailed)?;
    Ok(())
}

/// AssemblyScript string convention: UTF-16LE bytes with a u32 byte length
/// stored at `ptr - 4`.
fn read_utf16_string(caller: &mut Caller<'_, HostState>, ptr: i32) -> Result<String, String> {
    if ptr < 4 {
        return Err(format!("the pointer address {} is invalid", ptr));
    }
    let len_bytes =
        read_bytes(caller, ptr - 4, 4).map_err(|c| format!("length read failed: {}", c))?;
    let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);
    let data =
        read_bytes(caller, ptr, len as i32).map_err(|c| format!("string read failed: {}", c))?;
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

/// Link the full import set. Called once per instantiation.
pub(crate) fn link_host_abi(linker: &mut Linker<HostState>) -> WasmResult<()> {
    linker.func_wrap(
        "env",
        "ws_log",
        |mut caller: Caller<'_, HostState>, level: i32, ptr: i32, size: i32| -> i32 {
            let buf = match read_bytes(&mut caller, ptr, size) {
                Ok(b) => b,
                Err(code) => {
                    caller
                        .data()
                        .log(LogLevel::Error, SRC_GUEST, format!("log read failed: {}", code));
                    return StatusCode::Failed.code();
                }
            };
            caller.data().log(
                LogLevel::from_i32(level),
                SRC_GUEST,
                String::from_utf8_lossy(&buf).to_string(),
            );
            StatusCode::Ok.code()
        },
    )?;

    linker.func_wrap(
        "env",
        "ws_get_data",
        |mut caller: Caller<'_, HostState>, rid: i32, out_ptr: i32, out_size: i32| -> i32 {
            let data = match caller.data().res.load(rid as u32) {
                Some(d) => d,
                None => return StatusCode::ResourceNotFound.code(),
            };
            match copy_bytes(&mut caller, &data, out_ptr, out_size) {
                Ok(()) => StatusCode::Ok.code(),
                Err(code) => {
                    caller
                        .data()
                        .log(LogLevel::Error, SRC_HOST, format!("get_data copy failed: {}", code));
                    code.code()
                }
            }
        },
    )?;

    linker.func_wrap(
        "env",
        "ws_set_data",
        |mut caller: Caller<'_, HostState>, rid: i32, ptr: i32, size: i32| -> i32 {
            match read_bytes(&mut caller, ptr, size) {
                Ok(buf) => {
                    // replace-or-create: rids the guest invents are fine
                    caller.data().res.store(rid as u32, buf);
                    StatusCode::Ok.code()
                }
                Err(code) => {
                    caller
                        .data()
                        .log(LogLevel::Error, SRC_HOST, format!("set_data read failed: {}", code));
                    code.code()
                }
            }
        },
    )?;

    linker.func_wrap(
        "env",
        "ws_get_event_type",
        |mut caller: Caller<'_, HostState>, rid: i32, out_ptr: i32, out_size: i32| -> i32 {
            let data = match caller.data().evs.load(rid as u32) {
                Some(d) => d,
                None => return StatusCode::ResourceNotFound.code(),
            };
            match copy_bytes(&mut caller, &data, out_ptr, out_size) {
                Ok(()) => StatusCode::Ok.code(),
                Err(code) => code.code(),
            }
        },
    )?;

    linker.func_wrap(
        "env",
        "ws_get_db",
        |mut caller: Caller<'_, HostState>,
         key_ptr: i32,
         key_size: i32,
         out_ptr: i32,
         out_size: i32|
         -> i32 {
            let key = match read_bytes(&mut caller, key_ptr, key_size) {
                Ok(k) => k,
                Err(code) => return code.code(),
            };
            let key = String::from_utf8_lossy(&key).to_string();
            let value = match caller.data().ctx.kv.get(&key) {
                Some(v) => v,
                None => return StatusCode::ResourceNotFound.code(),
            };
            caller
                .data()
                .log(LogLevel::Debug, SRC_HOST, format!("host.GetDB {}", key));
            match copy_bytes(&mut caller, &value, out_ptr, out_size) {
                Ok(()) => StatusCode::Ok.code(),
                Err(code) => code.code(),
            }
        },
    )?;

    linker.func_wrap(
        "env",
        "ws_set_db",
        |mut caller: Caller<'_, HostState>,
         key_ptr: i32,
         key_size: i32,
         val_ptr: i32,
         val_size: i32|
         -> i32 {
            let key = match read_bytes(&mut caller, key_ptr, key_size) {
                Ok(k) => k,
                Err(code) => return code.code(),
            };
            let value = match read_bytes(&mut caller, val_ptr, val_size) {
                Ok(v) => v,
                Err(code) => return code.code(),
            };
            let key = String::from_utf8_lossy(&key).to_string();
            caller
                .data()
                .log(LogLevel::Debug, SRC_HOST, format!("host.SetDB {}", key));
            match caller.data().ctx.kv.set(&key, value) {
                Ok(()) => StatusCode::Ok.code(),
                Err(e) => {
                    caller.data().log(LogLevel::Error, SRC_HOST, e.to_string());
                    StatusCode::Failed.code()
                }
            }
        },
    )?;

    linker.func_wrap(
        "env",
        "ws_get_sql_db",
        |mut caller: Caller<'_, HostState>, ptr: i32, size: i32, out_ptr: i32, out_size: i32| -> i32 {
            if caller.data().ctx.cancel.is_cancelled() {
                return StatusCode::Failed.code();
            }
            let sql = match caller.data().ctx.sql.clone() {
                Some(s) => s,
                None => return StatusCode::NoDbContext.code(),
            };
            let envelope = match read_bytes(&mut caller, ptr, size) {
                Ok(b) => b,
                Err(code) => return code.code(),
            };
            let rows = match sql.query(&envelope) {
                Ok(r) => r,
                Err(e) => {
                    caller.data().log(LogLevel::Error, SRC_HOST, e.to_string());
                    return StatusCode::Failed.code();
                }
            };
            match copy_bytes(&mut caller, &rows, out_ptr, out_size) {
                Ok(()) => StatusCode::Ok.code(),
                Err(code) => code.code(),
            }
        },
    )?;

    linker.func_wrap(
        "env",
        "ws_set_sql_db",
        |mut caller: Caller<'_, HostState>, ptr: i32, size: i32| -> i32 {
            if caller.data().ctx.cancel.is_cancelled() {
                return StatusCode::Failed.code();
            }
            let sql = match caller.data().ctx.sql.clone() {
                Some(s) => s,
                None => return StatusCode::NoDbContext.code(),
            };
            let envelope = match read_bytes(&mut caller, ptr, size) {
                Ok(b) => b,
                Err(code) => return code.code(),
            };
            match sql.exec(&envelope) {
                Ok(_) => StatusCode::Ok.code(),
                Err(e) => {
                    caller.data().log(LogLevel::Error, SRC_HOST, e.to_string());
                    StatusCode::Failed.code()
                }
            }
        },
    )?;

    linker.func_wrap(
        "env",
        "ws_get_env",
        |mut caller: Caller<'_, HostState>,
         key_ptr: i32,
         key_size: i32,
         out_ptr: i32,
         out_size: i32|
         -> i32 {
            let key = match read_bytes(&mut caller, key_ptr, key_size) {
                Ok(k) => k,
                Err(code) => return code.code(),
            };
            let key = String::from_utf8_lossy(&key).to_string();
            let value = match caller.data().ctx.env.get(&key) {
                Some(v) => v.as_bytes().to_vec(),
                None => return StatusCode::EnvKeyNotFound.code(),
            };
            match copy_bytes(&mut caller, &value, out_ptr, out_size) {
                Ok(()) => StatusCode::Ok.code(),
                Err(code) => code.code(),
            }
        },
    )?;

    linker.func_wrap(
        "env",
        "ws_send_tx",
        |mut caller: Caller<'_, HostState>,
         chain_id: i32,
         ptr: i32,
         size: i32,
         out_ptr: i32,
         out_size: i32|
         -> i32 { send_tx(&mut caller, chain_id, ptr, size, out_ptr, out_size, false) },
    )?;

    linker.func_wrap(
        "env",
        "ws_send_tx_with_operator",
        |mut caller: Caller<'_, HostState>,
         chain_id: i32,
         ptr: i32,
         size: i32,
         out_ptr: i32,
         out_size: i32|
         -> i32 { send_tx(&mut caller, chain_id, ptr, size, out_ptr, out_size, true) },
    )?;

    linker.func_wrap(
        "env",
        "ws_call_contract",
        |mut caller: Caller<'_, HostState>,
         chain_id: i32,
         ptr: i32,
         size: i32,
         out_ptr: i32,
         out_size: i32|
         -> i32 {
            let client = match caller.data().ctx.chain.clone() {
                Some(c) => c,
                None => {
                    caller
                        .data()
                        .log(LogLevel::Error, SRC_HOST, "chain client doesn't exist");
                    return StatusCode::Failed.code();
                }
            };
            let buf = match read_bytes(&mut caller, ptr, size) {
                Ok(b) => b,
                Err(code) => return code.code(),
            };
            let req: TxRequest = match serde_json::from_slice(&buf) {
                Ok(r) => r,
                Err(e) => {
                    caller.data().log(LogLevel::Error, SRC_HOST, e.to_string());
                    return StatusCode::Failed.code();
                }
            };
            let data = match client.call_contract(chain_id as u32, &req.to, &req.data) {
                Ok(d) => d,
                Err(e) => {
                    caller.data().log(LogLevel::Error, SRC_HOST, e.to_string());
                    return StatusCode::Failed.code();
                }
            };
            match copy_bytes(&mut caller, &data, out_ptr, out_size) {
                Ok(()) => StatusCode::Ok.code(),
                Err(code) => code.code(),
            }
        },
    )?;

    linker.func_wrap(
        "env",
        "ws_send_mqtt_msg",
        |mut caller: Caller<'_, HostState>,
         topic_ptr: i32,
         topic_size: i32,
         msg_ptr: i32,
         msg_size: i32|
         -> i32 {
            let mqtt = match caller.data().ctx.mqtt.clone() {
                Some(m) => m,
                None => {
                    caller
                        .data()
                        .log(LogLevel::Error, SRC_HOST, "mq client doesn't exist");
                    return StatusCode::Failed.code();
                }
            };
            let topic = match read_bytes(&mut caller, topic_ptr, topic_size) {
                Ok(t) => t,
                Err(code) => return code.code(),
            };
            let message = match read_bytes(&mut caller, msg_ptr, msg_size) {
                Ok(m) => m,
                Err(code) => return code.code(),
            };
            match mqtt.publish(&String::from_utf8_lossy(&topic), &message) {
                Ok(()) => StatusCode::Ok.code(),
                Err(e) => {
                    caller.data().log(LogLevel::Error, SRC_HOST, e.to_string());
                    StatusCode::Failed.code()
                }
            }
        },
    )?;

    linker.func_wrap(
        "env",
        "ws_api_call",
        |mut caller: Caller<'_, HostState>, ptr: i32, size: i32, out_ptr: i32, out_size: i32| -> i32 {
            if caller.data().ctx.cancel.is_cancelled() {
                return StatusCode::Failed.code();
            }
            let buf = match read_bytes(&mut caller, ptr, size) {
                Ok(b) => b,
                Err(code) => {
                    caller
                        .data()
                        .log(LogLevel::Error, SRC_HOST, format!("api_call read failed: {}", code));
                    return code.code();
                }
            };
            let response = {
                let state = caller.data();
                state.ctx.api.call(&state.ctx.project.name, &buf)
            };
            let response_json = match serde_json::to_vec(&response) {
                Ok(j) => j,
                Err(e) => {
                    caller.data().log(LogLevel::Error, SRC_HOST, e.to_string());
                    return StatusCode::HostInternal.code();
                }
            };
            match copy_bytes(&mut caller, &response_json, out_ptr, out_size) {
                Ok(()) => StatusCode::Ok.code(),
                Err(code) => code.code(),
            }
        },
    )?;

    // AssemblyScript runtime imports.
    linker.func_wrap(
        "env",
        "abort",
        |mut caller: Caller<'_, HostState>, msg_ptr: i32, file_ptr: i32, line: i32, col: i32| {
            let msg = read_utf16_string(&mut caller, msg_ptr).unwrap_or_else(|e| e);
            let file = read_utf16_string(&mut caller, file_ptr).unwrap_or_else(|e| e);
            caller.data().log(
                LogLevel::Error,
                SRC_HOST,
                format!("abort: {} at {}:{}:{}", msg, file, line, col),
            );
        },
    )?;

    linker.func_wrap(
        "env",
        "trace",
        |mut caller: Caller<'_, HostState>,
         msg_ptr: i32,
         n: i32,
         a: f64,
         b: f64,
         c: f64,
         d: f64,
         e: f64| {
            let msg = match read_utf16_string(&mut caller, msg_ptr) {
                Ok(m) => m,
                Err(err) => {
                    caller.data().log(LogLevel::Error, SRC_HOST, err);
                    return;
                }
            };
            let values = [a, b, c, d, e];
            let tail = values
                .iter()
                .take(n.clamp(0, 5) as usize)
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let line = if tail.is_empty() {
                format!("trace: {}", msg)
            } else {
                format!("trace: {} {}", msg, tail)
            };
            caller.data().log(LogLevel::Info, SRC_HOST, line);
        },
    )?;

    linker.func_wrap("env", "seed", |caller: Caller<'_, HostState>| -> f64 {
        caller.data().ctx.seed.next()
    })?;

    linker.func_wrap(
        "stat",
        "ws_submit_metrics",
        |mut caller: Caller<'_, HostState>, ptr: i32, size: i32| -> i32 {
            let buf = match read_bytes(&mut caller, ptr, size) {
                Ok(b) => b,
                Err(code) => return code.code(),
            };
            let object: serde_json::Value = match serde_json::from_slice(&buf) {
                Ok(v) => v,
                Err(_) => {
                    caller.data().log(LogLevel::Error, SRC_HOST, "invalid json");
                    return StatusCode::Failed.code();
                }
            };
            if object.is_array() {
                caller
                    .data()
                    .log(LogLevel::Error, SRC_HOST, "json object should not be an array");
                return StatusCode::Failed.code();
            }
            let result = {
                let state = caller.data();
                state.ctx.metrics.submit(&state.ctx.project.name, &object)
            };
            match result {
                Ok(()) => StatusCode::Ok.code(),
                Err(e) => {
                    caller.data().log(LogLevel::Error, SRC_HOST, e.to_string());
                    StatusCode::Failed.code()
                }
            }
        },
    )?;

    Ok(())
}

fn send_tx(
    caller: &mut Caller<'_, HostState>,
    chain_id: i32,
    ptr: i32,
    size: i32,
    out_ptr: i32,
    out_size: i32,
    with_operator: bool,
) -> i32 {
    let client = match caller.data().ctx.chain.clone() {
        Some(c) => c,
        None => {
            caller
                .data()
                .log(LogLevel::Error, SRC_HOST, "chain client doesn't exist");
            return StatusCode::Failed.code();
        }
    };
    let buf = match read_bytes(caller, ptr, size) {
        Ok(b) => b,
        Err(code) => return code.code(),
    };
    let tx: TxRequest = match serde_json::from_slice(&buf) {
        Ok(t) => t,
        Err(e) => {
            caller.data().log(LogLevel::Error, SRC_HOST, e.to_string());
            return StatusCode::Failed.code();
        }
    };

    let operator = if with_operator {
        let name = tx.operator_name.clone().unwrap_or_default();
        if caller.data().ctx.operators.get(&name).is_none() {
            caller
                .data()
                .log(LogLevel::Error, SRC_HOST, format!("operator '{}' not found", name));
            return StatusCode::Failed.code();
        }
        Some(name)
    } else {
        None
    };

    let tx_hash = match client.send_tx(chain_id as u32, &tx, operator.as_deref()) {
        Ok(h) => h,
        Err(e) => {
            caller.data().log(LogLevel::Error, SRC_HOST, e.to_string());
            return StatusCode::Failed.code();
        }
    };
    match copy_bytes(caller, tx_hash.as_bytes(), out_ptr, out_size) {
        Ok(()) => StatusCode::Ok.code(),
        Err(code) => code.code(),
    }
}
