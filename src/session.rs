// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Session identity.
//!
//! The session carries an opaque bearer credential and derives a display
//! identity from it. The credential's signature is never checked here: the
//! decoded `sub` claim is for display only and must not gate access to
//! anything. The server alone decides whether a credential is valid.

use crate::traits::{ClientError, CredentialStore};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Why a credential's payload could not yield a subject.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("credential has {0} segments, expected 3")]
    Segments(usize),
    #[error("payload is not base64url: {0}")]
    Base64(String),
    #[error("payload is not a JSON claims object: {0}")]
    Json(String),
    #[error("payload carries no `sub` claim")]
    MissingSubject,
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
}

/// Extracts the `sub` claim from the middle segment of a three-segment
/// credential. No signature verification is performed.
pub fn decode_subject(credential: &str) -> Result<String, ClaimsError> {
    let segments: Vec<&str> = credential.split('.').collect();
    if segments.len() != 3 {
        return Err(ClaimsError::Segments(segments.len()));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|e| ClaimsError::Base64(e.to_string()))?;
    let claims: Claims =
        serde_json::from_slice(&payload).map_err(|e| ClaimsError::Json(e.to_string()))?;

    claims
        .sub
        .filter(|sub| !sub.is_empty())
        .ok_or(ClaimsError::MissingSubject)
}

#[derive(Debug, Default)]
struct SessionState {
    credential: Option<String>,
    /// Set by login/registration; takes precedence over the decoded claim.
    identity: Option<String>,
}

/// The active viewer's credential and display identity.
///
/// Shared between the store and the transport interceptor, which may tear
/// it down on an authorization failure.
pub struct Session {
    state: Mutex<SessionState>,
    store: Arc<dyn CredentialStore>,
}

impl Session {
    /// Restores the session from the persisted credential, if any.
    ///
    /// A store that cannot be read yields a signed-out session.
    pub fn restore(store: Arc<dyn CredentialStore>) -> Self {
        let credential = match store.load() {
            Ok(credential) => credential.filter(|c| !c.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "could not read persisted credential, starting signed out");
                None
            }
        };
        if credential.is_some() {
            tracing::info!("restored persisted credential");
        }

        Self {
            state: Mutex::new(SessionState {
                credential,
                identity: None,
            }),
            store,
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The credential to attach to outgoing requests.
    pub fn credential(&self) -> Option<String> {
        self.state().credential.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().credential.is_some()
    }

    /// Installs a freshly issued credential for `username` and persists it.
    ///
    /// Persistence failures are logged; the in-memory session still switches
    /// to the new viewer.
    pub fn establish(&self, credential: String, username: &str) {
        if let Err(e) = self.store.save(&credential) {
            tracing::warn!(error = %e, "could not persist credential");
        }
        let mut state = self.state();
        state.credential = Some(credential);
        state.identity = Some(username.to_string());
        tracing::info!(username, "session established");
    }

    /// Clears credential and identity and forgets the persisted credential.
    /// Never fails.
    pub fn logout(&self) {
        self.clear_if(|_| true);
    }

    /// Logs out only while `credential` is still the session's credential.
    /// Returns whether the session was cleared; a credential that was
    /// already replaced by a newer login leaves the session alone.
    pub fn expire(&self, credential: &str) -> bool {
        self.clear_if(|held| held == Some(credential))
    }

    fn clear_if(&self, matches: impl FnOnce(Option<&str>) -> bool) -> bool {
        {
            let mut state = self.state();
            if !matches(state.credential.as_deref()) {
                return false;
            }
            state.credential = None;
            state.identity = None;
        }
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "could not remove persisted credential");
        }
        tracing::info!("session cleared");
        true
    }

    /// Display identity of the current viewer.
    ///
    /// Returns the username given at login/registration, otherwise the `sub`
    /// claim decoded from the credential. A malformed credential yields
    /// `None` and a warning, never an error.
    pub fn current_identity(&self) -> Option<String> {
        let state = self.state();
        if let Some(identity) = &state.identity {
            return Some(identity.clone());
        }
        let credential = state.credential.as_deref()?;
        match decode_subject(credential) {
            Ok(subject) => Some(subject),
            Err(e) => {
                tracing::warn!(error = %e, "could not derive identity from credential");
                None
            }
        }
    }
}

/// Keeps the credential in memory only; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out holding `credential`, as if persisted by an earlier run.
    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self {
            credential: Mutex::new(Some(credential.into())),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.credential.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        Ok(self.slot().clone())
    }

    fn save(&self, credential: &str) -> Result<(), ClientError> {
        *self.slot() = Some(credential.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.slot() = None;
        Ok(())
    }
}

/// Persists the credential as a single-line text file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let credential = contents.trim();
                Ok((!credential.is_empty()).then(|| credential.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, credential: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, credential)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
