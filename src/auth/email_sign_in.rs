//! Email/password and Google sign-in flow
//!
//! Backs the login prompt shown while the session is signed out.

use crate::auth::notice::{
    google_sign_in_notice, register_notice, sign_in_notice, sign_out_notice, Notice,
};
use crate::auth::provider::IdentityProvider;
use crate::auth::session::SessionReconciler;
use crate::auth::types::{Credential, User};
use crate::error::{AuthError, FirebaseError};
use std::sync::Arc;
use tracing::{error, info};

/// Whether the form signs in or creates an account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmailMode {
    /// Sign in to an existing account
    #[default]
    SignIn,
    /// Create a new account
    Register,
}

/// Login prompt form state
#[derive(Debug, Clone, Default)]
pub struct EmailSignIn {
    /// Email address as typed
    pub email: String,
    /// Password as typed
    pub password: String,
    mode: EmailMode,
}

impl EmailSignIn {
    /// Empty form in sign-in mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode
    pub fn mode(&self) -> EmailMode {
        self.mode
    }

    /// Switch between signing in and registering
    pub fn toggle_mode(&mut self) -> EmailMode {
        self.mode = match self.mode {
            EmailMode::SignIn => EmailMode::Register,
            EmailMode::Register => EmailMode::SignIn,
        };
        self.mode
    }

    /// Sign in or register with the typed credentials
    ///
    /// Both fields are required. The form is cleared on success; the session
    /// moves to signed-in when the provider's notification arrives.
    pub async fn submit<P: IdentityProvider>(
        &mut self,
        provider: &P,
        session: &mut SessionReconciler,
    ) -> Result<Arc<User>, Notice> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(Notice::error("Please enter both email and password"));
        }

        session.begin_request();
        let result = match self.mode {
            EmailMode::SignIn => {
                provider
                    .sign_in_with_email_and_password(&self.email, &self.password)
                    .await
            }
            EmailMode::Register => {
                provider
                    .create_user_with_email_and_password(&self.email, &self.password)
                    .await
            }
        };
        session.end_request();

        match result {
            Ok(auth_result) => {
                info!(uid = %auth_result.user.uid, mode = ?self.mode, "email authentication succeeded");
                self.email.clear();
                self.password.clear();
                Ok(auth_result.user)
            }
            Err(err) => {
                error!(mode = ?self.mode, error = %err, "email authentication failed");
                Err(match self.mode {
                    EmailMode::SignIn => sign_in_notice(&err),
                    EmailMode::Register => register_notice(&err),
                })
            }
        }
    }

    /// Sign in with an ID token obtained from Google Sign-In
    pub async fn sign_in_with_google<P: IdentityProvider>(
        &mut self,
        provider: &P,
        session: &mut SessionReconciler,
        id_token: Option<String>,
    ) -> Result<Arc<User>, Notice> {
        let Some(id_token) = id_token.filter(|t| !t.is_empty()) else {
            let err: FirebaseError =
                AuthError::InvalidCredential("No ID token found".to_string()).into();
            error!(error = %err, "Google sign-in failed");
            return Err(google_sign_in_notice(&err));
        };

        session.begin_request();
        let result = provider.sign_in_with_credential(Credential::google(id_token)).await;
        session.end_request();

        match result {
            Ok(auth_result) => {
                info!(uid = %auth_result.user.uid, "Google sign-in succeeded");
                Ok(auth_result.user)
            }
            Err(err) => {
                error!(error = %err, "Google sign-in failed");
                Err(google_sign_in_notice(&err))
            }
        }
    }

    /// Sign the current user out
    pub async fn sign_out<P: IdentityProvider>(
        &self,
        provider: &P,
        session: &mut SessionReconciler,
    ) -> Result<Notice, Notice> {
        session.begin_request();
        let result = provider.sign_out().await;
        session.end_request();

        match result {
            Ok(()) => {
                info!("signed out");
                Ok(Notice::success("Signed out successfully"))
            }
            Err(err) => {
                error!(error = %err, "sign-out failed");
                Err(sign_out_notice(&err))
            }
        }
    }
}
