use crate::error::{GateError, Result};
use dashmap::DashMap;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

pub const MAX_BODY_BYTES_KEY: &str = "REQUEST_GATE_MAX_BODY_BYTES";
pub const LOG_FAILURES_KEY: &str = "REQUEST_GATE_LOG_FAILURES";
pub const LOG_BODY_LIMIT_KEY: &str = "REQUEST_GATE_LOG_BODY_LIMIT";

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// A service seeded from the process environment
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Parse `key` into `T`; a missing key yields `None`
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| GateError::InvalidConfig {
                    key: key.to_string(),
                    value: raw,
                }),
        }
    }
}

/// Limits for body buffering and for the parse-failure log record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Bodies larger than this are rejected with 413 before any codec runs
    pub max_body_bytes: usize,
    /// Write the offending body to the `INFO` log when a parse error is deferred
    pub log_failures: bool,
    /// At most this many body bytes are written to the log
    pub log_body_limit: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024,
            log_failures: true,
            log_body_limit: 64 * 1024,
        }
    }
}

impl GateConfig {
    pub fn from_service(service: &ConfigService) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            max_body_bytes: service
                .parse(MAX_BODY_BYTES_KEY)?
                .unwrap_or(defaults.max_body_bytes),
            log_failures: service
                .parse(LOG_FAILURES_KEY)?
                .unwrap_or(defaults.log_failures),
            log_body_limit: service
                .parse(LOG_BODY_LIMIT_KEY)?
                .unwrap_or(defaults.log_body_limit),
        })
    }

    /// Shortcut for `GateConfig::from_service(&ConfigService::new())`
    pub fn from_env() -> Result<Self> {
        Self::from_service(&ConfigService::new())
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn log_failures(mut self, enabled: bool) -> Self {
        self.log_failures = enabled;
        self
    }

    pub fn log_body_limit(mut self, limit: usize) -> Self {
        self.log_body_limit = limit;
        self
    }
}
