// src/rpc/credentials.rs

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::errors::{DaemonError, Result};

/// In-memory set of OAuth tokens the caller has approved.
///
/// Token values are never logged.
#[derive(Debug, Default)]
pub struct CredentialStore {
    approved: Mutex<HashSet<String>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `token`. Adding the same token twice is a no-op.
    pub fn approve(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DaemonError::InvalidParams(
                "Invalid params for addApprovedOauthToken: token must not be empty".to_string(),
            ));
        }

        let mut approved = self.approved.lock().unwrap_or_else(PoisonError::into_inner);
        let added = approved.insert(token.to_string());
        info!(added, approved = approved.len(), "oauth token approved");
        Ok(())
    }

    pub fn is_approved(&self, token: &str) -> bool {
        self.approved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(token.trim())
    }
}
