//! # Credential Lifecycle
//!
//! The API key moves through exactly two states: `Absent -> Present`.
//! It is set once at sign-in and read at call time by [`crate::client::ApiCaller`].
//! Sign-out is handled outside this layer, so there is no way back to `Absent`.

use crate::error::ResourceError;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Synchronous read access to the current API key.
pub trait CredentialStore: Send + Sync {
    fn credential(&self) -> Option<String>;
}

/// Short, stable stand-in for a key, safe to put in cache keys and logs.
///
/// The first 8 bytes of the key's SHA-256 digest, hex encoded. The value is the
/// same across processes and toolchain versions.
pub fn fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let hex: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
    format!("cred-{hex}")
}

/// In-memory, set-once credential store.
#[derive(Debug, Default)]
pub struct SessionCredential {
    key: OnceLock<String>,
}

impl SessionCredential {
    /// A store in the `Absent` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already in the `Present` state.
    pub fn with_key(key: impl Into<String>) -> Self {
        let store = Self::new();
        let _ = store.key.set(key.into());
        store
    }

    /// Loads the initial key from an environment variable; blank values count as absent.
    pub fn from_env(var: &str) -> Self {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Self::with_key(key.trim()),
            _ => Self::new(),
        }
    }

    /// Moves the store from `Absent` to `Present`.
    pub fn sign_in(&self, key: impl Into<String>) -> Result<(), ResourceError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ResourceError::validation("API key must not be blank"));
        }
        self.key.set(key).map_err(|_| {
            warn!("Sign-in attempted while a credential is already present");
            ResourceError::validation("A credential is already present for this session")
        })?;
        info!("Credential present");
        Ok(())
    }

    pub fn is_present(&self) -> bool {
        self.key.get().is_some()
    }
}

impl CredentialStore for SessionCredential {
    fn credential(&self) -> Option<String> {
        self.key
            .get()
            .filter(|k| !k.trim().is_empty())
            .cloned()
    }
}
