// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Guest-facing result status codes.
//!
//! Every host ABI function returns one of these values to the guest as a
//! signed 32-bit integer. The registry is stable across versions: new codes
//! may be appended with fresh negative values, existing values are never
//! reused.

/// Status codes returned to guest code by host ABI functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StatusCode {
    Ok = 0,
    Failed = -1,
    ResourceNotFound = -2,
    TransDataFromVmFailed = -3,
    TransDataToVmFailed = -4,
    NoDbContext = -5,
    EnvKeyNotFound = -6,
    HostInternal = -7,
}

impl StatusCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<StatusCode> for i32 {
    fn from(v: StatusCode) -> i32 {
        v as i32
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StatusCode::Ok => "OK",
            StatusCode::Failed => "Failed",
            StatusCode::ResourceNotFound => "ResourceNotFound",
            StatusCode::TransDataFromVmFailed => "TransDataFromVMFailed",
            StatusCode::TransDataToVmFailed => "TransDataToVMFailed",
            StatusCode::NoDbContext => "NoDBContext",
            StatusCode::EnvKeyNotFound => "EnvKeyNotFound",
            StatusCode::HostInternal => "HostInternal",
        };
        write!(f, "{}({})", name, self.code())
    }
}
