// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

use crate::transport::{ApiRequest, ApiResponse};

/// Error type for every store, session and transport operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received (connection refused, timeout, DNS...).
    #[error("Transport error: {0}")]
    Transport(String),
    /// A response was received carrying a non-success status.
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },
    /// The credential attached to the request was rejected (HTTP 401).
    #[error("Authorization error ({status}): {}", .message.as_deref().unwrap_or("credential rejected"))]
    Authorization { status: u16, message: Option<String> },
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Registration failed: {0}")]
    Registration(String),
    /// A success response whose body did not match the expected shape.
    #[error("Payload error: {0}")]
    Payload(String),
    #[error("Credential storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Message supplied by the server, if the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Server { message, .. } | ClientError::Authorization { message, .. } => {
                message.as_deref()
            }
            ClientError::Authentication(message) | ClientError::Registration(message) => {
                Some(message.as_str())
            }
            _ => None,
        }
    }

    /// Short, human-readable message for an error slot.
    ///
    /// Prefers the server's own wording and falls back to `fallback`, which
    /// names the action that failed (e.g. "Failed to fetch movies").
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, ClientError::Authorization { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        Self::Payload(value.to_string())
    }
}

/// Transport seam - moves one request to the remote service and back.
///
/// Implementations report only transport-level failures as errors. Any
/// response that arrives, whatever its status, is returned as an
/// [`ApiResponse`] so the interceptor in [`crate::interceptor::Api`] can
/// classify it in one place.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError>;
}

/// Persistence seam for the session credential.
///
/// The credential is the only piece of client state that survives a
/// process restart.
pub trait CredentialStore: Send + Sync {
    /// Returns the persisted credential, `Ok(None)` when nothing is stored.
    fn load(&self) -> Result<Option<String>, ClientError>;

    fn save(&self, credential: &str) -> Result<(), ClientError>;

    /// Removes the persisted credential. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), ClientError>;
}
