// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

/// Read-only per-project environment map exposed through `ws_get_env`.
pub struct EnvStore {
    vars: HashMap<String, String>,
}

impl EnvStore {
    pub fn empty() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_hits_and_misses() {
        let env = EnvStore::from_map(HashMap::from([(
            "REGION".to_string(),
            "eu-west-1".to_string(),
        )]));
        assert_eq!(env.get("REGION"), Some("eu-west-1"));
        assert_eq!(env.get("MISSING"), None);
    }
}
