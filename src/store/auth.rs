// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use super::MovieStore;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest};
use crate::traits::ClientError;
use crate::transport::ApiRequest;

impl MovieStore {
    /// Signs in as `username`.
    ///
    /// On success the credential is stored and persisted, the identity is
    /// the username as typed and the vote cache starts empty. On rejection
    /// the session is left as it was and `auth_error` carries the reason.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let body = serde_json::to_value(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        let request = ApiRequest::post(["auth", "login"]).json(body).anonymous();

        self.authenticate(username, request, "Login failed", ClientError::Authentication)
            .await
    }

    /// Creates an account and signs in as it, exactly like [`login`].
    ///
    /// [`login`]: MovieStore::login
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let body = serde_json::to_value(RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let request = ApiRequest::post(["auth", "register"]).json(body).anonymous();

        self.authenticate(username, request, "Registration failed", ClientError::Registration)
            .await
    }

    async fn authenticate(
        &self,
        username: &str,
        request: ApiRequest,
        fallback: &str,
        rejected: fn(String) -> ClientError,
    ) -> Result<(), ClientError> {
        self.state().auth_error = None;

        let error = match self.api.call::<AuthResponse>(request).await {
            Ok(AuthResponse { token }) if !token.trim().is_empty() => {
                self.api.session().establish(token, username);
                self.state().reset_viewer();
                return Ok(());
            }
            Ok(_) => ClientError::Payload("service issued an empty credential".to_string()),
            Err(ClientError::Server { message, .. } | ClientError::Authorization { message, .. }) => {
                rejected(
                    message
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| fallback.to_string()),
                )
            }
            Err(e) => e,
        };

        tracing::warn!(username, error = %error, "authentication failed");
        self.state().auth_error = Some(error.user_message(fallback));
        Err(error)
    }

    /// Signs out: forgets the credential, its persisted copy and every
    /// cached vote. Never fails.
    pub fn logout(&self) {
        self.api.session().logout();
        self.state().reset_viewer();
    }
}
