//! Identity provider seam
//!
//! Everything the sign-in flows need from an identity backend. [`crate::Auth`]
//! implements it against the Firebase REST API; tests plug in an in-memory
//! provider.

use crate::auth::types::{AuthResult, ConfirmationHandle, Credential, User};
use crate::error::FirebaseError;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;

/// Stream of auth-state notifications (`None` = signed out)
pub type AuthStateStream = Pin<Box<dyn Stream<Item = Option<Arc<User>>> + Send>>;

/// External identity provider
///
/// All calls are asynchronous and fallible except the state subscription.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    /// Notifications yielding the current identity immediately, then every change
    async fn auth_state_changes(&self) -> AuthStateStream;

    /// Dispatch an SMS code to a fully-qualified phone number
    ///
    /// Issuing a handle invalidates any handle issued earlier.
    async fn send_verification_code(
        &self,
        phone_number: &str,
    ) -> Result<ConfirmationHandle, FirebaseError>;

    /// Confirm the SMS code for `handle`
    async fn confirm_verification_code(
        &self,
        handle: &ConfirmationHandle,
        code: &str,
    ) -> Result<AuthResult, FirebaseError>;

    /// Sign in with email and password
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResult, FirebaseError>;

    /// Register a new account with email and password
    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResult, FirebaseError>;

    /// Sign in with a federated credential
    async fn sign_in_with_credential(
        &self,
        credential: Credential,
    ) -> Result<AuthResult, FirebaseError>;

    /// Sign the current user out
    async fn sign_out(&self) -> Result<(), FirebaseError>;
}

/// Live subscription to auth-state notifications
///
/// Released exactly once, either explicitly with [`unsubscribe`](Self::unsubscribe)
/// or when dropped. After release no further notification is delivered.
pub struct AuthStateSubscription {
    stream: Option<AuthStateStream>,
}

impl AuthStateSubscription {
    /// Subscribe to `provider`'s notifications
    pub async fn subscribe<P: IdentityProvider>(provider: &P) -> Self {
        Self::from_stream(provider.auth_state_changes().await)
    }

    /// Wrap an existing notification stream
    pub fn from_stream(stream: AuthStateStream) -> Self {
        Self { stream: Some(stream) }
    }

    /// Next notification, or `None` once released or the provider closed
    pub async fn next(&mut self) -> Option<Option<Arc<User>>> {
        let stream = self.stream.as_mut()?;
        let notification = stream.next().await;
        if notification.is_none() {
            self.stream = None;
        }
        notification
    }

    /// Release the subscription; returns `true` only on the first call
    pub fn unsubscribe(&mut self) -> bool {
        self.stream.take().is_some()
    }

    /// Whether notifications can still arrive
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for AuthStateSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for AuthStateSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStateSubscription")
            .field("active", &self.is_active())
            .finish()
    }
}
