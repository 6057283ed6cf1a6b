//! Auth session reconciliation
//!
//! Bridges the provider's push-style auth-state notifications into a local
//! view model. The host renders a neutral view while the session is
//! [`SessionState::Initializing`], a login prompt while signed out, and the
//! account view while signed in.
//!
//! ```text
//! Initializing ──► SignedOut { pending } ◄──► SignedIn { user }
//! ```
//!
//! [`SessionReconciler`] exclusively owns the [`SessionView`]; flows mutate
//! it only through the reconciler's methods.
//!
//! # Example
//! ```
//! use firebase_auth_flows::auth::session::{SessionPhase, SessionReconciler};
//! use firebase_auth_flows::User;
//! use std::sync::Arc;
//!
//! let mut session = SessionReconciler::new();
//! assert_eq!(session.view().phase(), SessionPhase::Initializing);
//!
//! session.apply(None);
//! assert!(session.view().login_visible);
//!
//! session.apply(Some(Arc::new(User::new("uid-1"))));
//! assert_eq!(session.view().phase(), SessionPhase::SignedIn);
//! assert!(!session.view().login_visible);
//! ```

use crate::auth::provider::{AuthStateSubscription, IdentityProvider};
use crate::auth::types::{PendingVerification, User};
use crate::error::PhoneAuthError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Local auth session state
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No notification received yet
    Initializing,
    /// No identity; an SMS code may be awaiting confirmation
    SignedOut {
        /// Outstanding phone verification
        pending: Option<PendingVerification>,
    },
    /// Signed in
    SignedIn {
        /// Current identity
        user: Arc<User>,
    },
}

/// Fieldless discriminant of [`SessionState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// See [`SessionState::Initializing`]
    Initializing,
    /// See [`SessionState::SignedOut`]
    SignedOut,
    /// See [`SessionState::SignedIn`]
    SignedIn,
}

impl SessionState {
    /// Discriminant of this state
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Initializing => SessionPhase::Initializing,
            SessionState::SignedOut { .. } => SessionPhase::SignedOut,
            SessionState::SignedIn { .. } => SessionPhase::SignedIn,
        }
    }

    /// Signed-in identity, if any
    pub fn user(&self) -> Option<&Arc<User>> {
        match self {
            SessionState::SignedIn { user } => Some(user),
            _ => None,
        }
    }

    /// Outstanding phone verification, if any
    pub fn pending_verification(&self) -> Option<&PendingVerification> {
        match self {
            SessionState::SignedOut { pending } => pending.as_ref(),
            _ => None,
        }
    }
}

/// View model rendered by the host
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    /// Session state
    pub state: SessionState,
    /// Whether the login prompt is shown
    pub login_visible: bool,
    /// Whether a provider call is in flight
    pub loading: bool,
}

impl SessionView {
    /// Shorthand for `self.state.phase()`
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }
}

/// Sole writer of the [`SessionView`]
#[derive(Debug)]
pub struct SessionReconciler {
    view: SessionView,
    subscription: Option<AuthStateSubscription>,
}

impl Default for SessionReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionReconciler {
    /// Reconciler in [`SessionState::Initializing`] with no subscription
    pub fn new() -> Self {
        Self {
            view: SessionView {
                state: SessionState::Initializing,
                login_visible: false,
                loading: false,
            },
            subscription: None,
        }
    }

    /// Current view model
    pub fn view(&self) -> &SessionView {
        &self.view
    }

    /// Apply one auth-state notification
    ///
    /// Any identity moves to `SignedIn`; none moves to a fresh `SignedOut`.
    /// Both clear pending verification data and the loading flag.
    pub fn apply(&mut self, identity: Option<Arc<User>>) -> &SessionView {
        let previous = self.view.state.phase();

        match identity {
            Some(user) => {
                debug!(uid = %user.uid, ?previous, "auth state: signed in");
                self.view.state = SessionState::SignedIn { user };
                self.view.login_visible = false;
            }
            None => {
                debug!(?previous, "auth state: signed out");
                self.view.state = SessionState::SignedOut { pending: None };
                self.view.login_visible = true;
            }
        }
        self.view.loading = false;

        &self.view
    }

    /// Subscribe to `provider`, replacing any earlier subscription
    pub async fn attach<P: IdentityProvider>(&mut self, provider: &P) {
        self.teardown();
        self.subscription = Some(AuthStateSubscription::subscribe(provider).await);
    }

    /// Wait for the next notification and apply it
    ///
    /// Returns `false` when there is no live subscription.
    pub async fn pump(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };

        match subscription.next().await {
            Some(identity) => {
                self.apply(identity);
                true
            }
            None => {
                self.subscription = None;
                false
            }
        }
    }

    /// Apply notifications until the subscription ends
    pub async fn run_until_closed(&mut self) {
        while self.pump().await {}
    }

    /// Release the subscription
    ///
    /// Returns `true` if a live subscription was released by this call.
    pub fn teardown(&mut self) -> bool {
        match self.subscription.take() {
            Some(mut subscription) => subscription.unsubscribe(),
            None => false,
        }
    }

    /// Whether a subscription is live
    pub fn is_attached(&self) -> bool {
        self.subscription.as_ref().is_some_and(|s| s.is_active())
    }

    /// Record a freshly dispatched SMS code
    ///
    /// Only valid while signed out. Replaces, and so invalidates, any
    /// earlier pending verification.
    pub fn begin_verification(
        &mut self,
        verification: PendingVerification,
    ) -> Result<(), PhoneAuthError> {
        let phase = self.view.state.phase();
        let SessionState::SignedOut { pending } = &mut self.view.state else {
            warn!(?phase, "phone verification rejected outside signed-out state");
            return Err(PhoneAuthError::VerificationUnavailable);
        };

        if pending.is_some() {
            debug!("superseding pending phone verification");
        }
        *pending = Some(verification);
        Ok(())
    }

    /// Drop the pending verification and return to phone input
    pub fn cancel_verification(&mut self) -> Option<PendingVerification> {
        match &mut self.view.state {
            SessionState::SignedOut { pending } => pending.take(),
            _ => None,
        }
    }

    /// Outstanding phone verification, if any
    pub fn pending_verification(&self) -> Option<&PendingVerification> {
        self.view.state.pending_verification()
    }

    /// Mark a provider call as in flight
    pub fn begin_request(&mut self) {
        self.view.loading = true;
    }

    /// Mark the in-flight provider call as finished
    pub fn end_request(&mut self) {
        self.view.loading = false;
    }
}

impl Drop for SessionReconciler {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::AuthStateStream;
    use crate::auth::types::ConfirmationHandle;

    fn user(uid: &str) -> Arc<User> {
        Arc::new(User::new(uid))
    }

    fn pending() -> PendingVerification {
        PendingVerification::new(ConfirmationHandle::new("session", "+447444555666"))
    }

    #[test]
    fn test_initial_state() {
        let session = SessionReconciler::new();
        assert_eq!(session.view().phase(), SessionPhase::Initializing);
        assert!(!session.view().login_visible);
        assert!(!session.is_attached());
    }

    #[test]
    fn test_notification_sequence() {
        let mut session = SessionReconciler::new();
        let mut phases = vec![session.view().phase()];

        for notification in [None, Some(user("A")), None, Some(user("B"))] {
            if session.view().phase() == SessionPhase::SignedOut {
                session.begin_verification(pending()).unwrap();
            }
            session.apply(notification);
            phases.push(session.view().phase());
            assert!(session.pending_verification().is_none());
        }

        assert_eq!(
            phases,
            vec![
                SessionPhase::Initializing,
                SessionPhase::SignedOut,
                SessionPhase::SignedIn,
                SessionPhase::SignedOut,
                SessionPhase::SignedIn,
            ]
        );
        assert_eq!(session.view().state.user().unwrap().uid, "B");
    }

    #[test]
    fn test_initializing_left_on_signed_in() {
        let mut session = SessionReconciler::new();
        let view = session.apply(Some(user("A")));

        assert_eq!(view.phase(), SessionPhase::SignedIn);
        assert!(!view.login_visible);
    }

    #[test]
    fn test_repeated_sign_out_clears_pending() {
        let mut session = SessionReconciler::new();
        session.apply(None);
        session.begin_verification(pending()).unwrap();

        session.apply(None);
        assert!(session.pending_verification().is_none());
        assert!(session.view().login_visible);
    }

    #[test]
    fn test_verification_requires_signed_out() {
        let mut session = SessionReconciler::new();
        assert_eq!(
            session.begin_verification(pending()),
            Err(PhoneAuthError::VerificationUnavailable)
        );

        session.apply(Some(user("A")));
        assert_eq!(
            session.begin_verification(pending()),
            Err(PhoneAuthError::VerificationUnavailable)
        );
    }

    #[test]
    fn test_new_verification_replaces_pending() {
        let mut session = SessionReconciler::new();
        session.apply(None);

        let first = pending();
        let second = pending();
        session.begin_verification(first.clone()).unwrap();
        session.begin_verification(second.clone()).unwrap();

        assert_eq!(session.pending_verification(), Some(&second));
        assert_ne!(session.pending_verification(), Some(&first));
    }

    #[test]
    fn test_cancel_verification() {
        let mut session = SessionReconciler::new();
        session.apply(None);
        session.begin_verification(pending()).unwrap();

        assert!(session.cancel_verification().is_some());
        assert!(session.cancel_verification().is_none());
        assert_eq!(session.view().phase(), SessionPhase::SignedOut);
    }

    #[test]
    fn test_notification_clears_loading() {
        let mut session = SessionReconciler::new();
        session.begin_request();
        assert!(session.view().loading);

        session.apply(None);
        assert!(!session.view().loading);
    }

    #[tokio::test]
    async fn test_pump_and_teardown() {
        let stream: AuthStateStream =
            Box::pin(futures::stream::iter(vec![None, Some(user("A")), None]));
        let mut session = SessionReconciler::new();
        session.subscription = Some(AuthStateSubscription::from_stream(stream));

        assert!(session.pump().await);
        assert_eq!(session.view().phase(), SessionPhase::SignedOut);

        assert!(session.teardown());
        assert!(!session.teardown());

        // Remaining notifications never reach the view.
        assert!(!session.pump().await);
        assert_eq!(session.view().phase(), SessionPhase::SignedOut);
    }

    #[tokio::test]
    async fn test_run_until_closed() {
        let stream: AuthStateStream =
            Box::pin(futures::stream::iter(vec![None, Some(user("A"))]));
        let mut session = SessionReconciler::new();
        session.subscription = Some(AuthStateSubscription::from_stream(stream));

        session.run_until_closed().await;

        assert_eq!(session.view().phase(), SessionPhase::SignedIn);
        assert!(!session.is_attached());
    }
}
