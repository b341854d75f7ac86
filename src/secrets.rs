//! Narrow credential-store capability.
//!
//! The core never sees how credentials are stored; it asks for them by
//! name through [`CredentialStore`]. Names are lowercase with
//! underscores (`binance_api_key`); the environment-backed store maps
//! them to uppercase variables (`BINANCE_API_KEY`).

use std::collections::HashMap;

/// Read-only access to named credentials.
pub trait CredentialStore: Send + Sync {
    /// Look up a credential by name. Absent means not configured.
    fn get(&self, name: &str) -> Option<String>;
}

/// Credentials from process environment variables (dotenv-loaded).
pub struct EnvCredentials;

impl CredentialStore for EnvCredentials {
    fn get(&self, name: &str) -> Option<String> {
        let var = name.to_ascii_uppercase();
        std::env::var(var).ok().filter(|v| !v.is_empty())
    }
}

/// Fixed in-memory credentials for tests.
#[derive(Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl CredentialStore for StaticCredentials {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}
