// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Transport interceptor.
//!
//! Every call to the service goes through [`Api::call`], which
//!
//! - attaches the session credential as a bearer token, and
//! - on HTTP 401 tears the session down before handing the original
//!   [`ClientError::Authorization`] back to the caller, provided the
//!   rejected bearer is still the session's credential.
//!
//! No other failure has a side effect here; callers do their own error
//! bookkeeping on top.

use crate::models::ErrorBody;
use crate::session::Session;
use crate::traits::{ClientError, Transport};
use crate::transport::{ApiRequest, ApiResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

const UNAUTHORIZED: u16 = 401;

#[derive(Clone)]
pub struct Api {
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
}

impl Api {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<Session>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Sends `request` and decodes a success body as `T`.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let route = request.route();
        let body = self.exchange(request).await?;
        serde_json::from_value(body).map_err(|e| {
            tracing::warn!(%route, error = %e, "unexpected response body");
            ClientError::Payload(format!("{}: {}", route, e))
        })
    }

    /// Sends `request` and returns the raw success body.
    pub async fn exchange(&self, mut request: ApiRequest) -> Result<Value, ClientError> {
        if request.authenticated {
            request.bearer = self.session.credential();
        }
        let route = request.route();
        let sent = if request.authenticated {
            request.bearer.clone()
        } else {
            None
        };
        tracing::debug!(%route, bearer = sent.is_some(), "sending request");

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::debug!(%route, error = %e, "request did not complete");
            e
        })?;

        classify(&route, sent.as_deref(), response, &self.session)
    }
}

fn classify(
    route: &str,
    sent: Option<&str>,
    response: ApiResponse,
    session: &Session,
) -> Result<Value, ClientError> {
    if response.is_success() {
        return Ok(response.body);
    }

    let message = error_message(&response.body);
    if response.status == UNAUTHORIZED {
        if let Some(credential) = sent {
            if session.expire(credential) {
                tracing::warn!(%route, "credential rejected, forcing logout");
            } else {
                tracing::debug!(%route, "superseded credential rejected, session kept");
            }
        }
        return Err(ClientError::Authorization {
            status: response.status,
            message,
        });
    }

    tracing::debug!(%route, status = response.status, ?message, "service returned an error");
    Err(ClientError::Server {
        status: response.status,
        message,
    })
}

/// Pulls `message` (or `error`) out of an error payload; a bare string body
/// is taken as the message itself.
fn error_message(body: &Value) -> Option<String> {
    match body {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Object(_) => serde_json::from_value::<ErrorBody>(body.clone())
            .ok()
            .and_then(ErrorBody::into_message),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(&json!({"message": "taken"})).as_deref(), Some("taken"));
        assert_eq!(error_message(&json!({"error": "boom"})).as_deref(), Some("boom"));
        assert_eq!(
            error_message(&json!({"status": 400, "error": "Bad Request", "message": "taken"})).as_deref(),
            Some("taken")
        );
        assert_eq!(error_message(&json!("plain text")).as_deref(), Some("plain text"));
        assert_eq!(error_message(&json!({"status": 500})), None);
        assert_eq!(error_message(&Value::Null), None);
    }

    #[test]
    fn test_unauthorized_only_tears_down_the_sent_live_credential() {
        let store = Arc::new(crate::session::MemoryCredentialStore::with_credential("a.b.c"));
        let session = Session::restore(store);
        let rejected = || ApiResponse::new(401, json!({"message": "nope"}));

        let err = classify("POST /auth/login", None, rejected(), &session).unwrap_err();
        assert!(err.is_authorization());
        assert!(session.is_authenticated());

        classify("GET /movies", Some("x.y.z"), rejected(), &session).unwrap_err();
        assert!(session.is_authenticated());

        classify("GET /movies", Some("a.b.c"), rejected(), &session).unwrap_err();
        assert!(!session.is_authenticated());
    }
}
