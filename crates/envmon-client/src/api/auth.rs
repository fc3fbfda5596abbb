//! Auth API.
//!
//! Login, registration and password recovery are sent without credentials
//! and never enter the refresh protocol.

use crate::client::EnvmonClient;
use crate::error::{Error, Result};
use crate::types::{AuthResponse, LoginRequest, RegisterRequest, User};

#[derive(serde::Serialize)]
struct RecoveryRequest<'a> {
    email: &'a str,
}

#[derive(serde::Serialize)]
struct VerifyTokenRequest<'a> {
    token: &'a str,
}

#[derive(serde::Serialize)]
struct ChangePasswordRequest<'a> {
    token: &'a str,
    new_password: &'a str,
}

#[derive(serde::Serialize)]
struct ResetPasswordRequest<'a> {
    token: &'a str,
    password: &'a str,
}

/// Auth API client.
pub struct AuthApi {
    client: EnvmonClient,
}

impl AuthApi {
    pub(crate) fn new(client: EnvmonClient) -> Self {
        Self { client }
    }

    /// Log in and store the issued tokens and identity in the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let auth: AuthResponse = match self.client.post_public("auth/login/", &request).await {
            Ok(auth) => auth,
            Err(Error::Client { status: 401, .. }) => return Err(Error::InvalidCredentials),
            Err(e) => return Err(e),
        };

        let session = self.client.session();
        session.set_tokens(auth.access.clone(), auth.refresh.clone());
        session.set_current_user(&auth.user);
        tracing::info!(username = %auth.user.username, "Logged in");

        Ok(auth)
    }

    /// Forget the local session. The server keeps no session to invalidate.
    pub fn logout(&self) {
        self.client.session().clear();
        tracing::info!("Logged out");
    }

    /// Register a new account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        self.client.post_public("auth/registro/", request).await
    }

    /// Fetch the authenticated user from the server.
    pub async fn current_user(&self) -> Result<User> {
        self.client.get("auth/usuario-actual/").await
    }

    /// Ask the server to email a password recovery token.
    pub async fn request_password_recovery(&self, email: &str) -> Result<serde_json::Value> {
        self.client
            .post_public("auth/recuperar-contrasena/", &RecoveryRequest { email })
            .await
    }

    /// Check that a recovery token is still valid.
    pub async fn verify_recovery_token(&self, token: &str) -> Result<serde_json::Value> {
        self.client
            .post_public("auth/verificar-token/", &VerifyTokenRequest { token })
            .await
    }

    /// Set a new password using a recovery token.
    pub async fn change_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<serde_json::Value> {
        self.client
            .post_public(
                "auth/cambiar-password/",
                &ChangePasswordRequest {
                    token,
                    new_password,
                },
            )
            .await
    }

    /// Reset the password using a recovery token.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<serde_json::Value> {
        self.client
            .post_public(
                "auth/restablecer-contrasena/",
                &ResetPasswordRequest { token, password },
            )
            .await
    }
}
