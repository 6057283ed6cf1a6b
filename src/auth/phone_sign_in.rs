//! Phone number sign-in flow
//!
//! Drives a [`PhoneNumberInput`] through SMS dispatch and code
//! confirmation against an [`IdentityProvider`], recording the pending
//! verification in the [`SessionReconciler`].
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use firebase_auth_flows::auth::phone_sign_in::{PhoneSignIn, RetryPolicy};
//! use firebase_auth_flows::auth::session::SessionReconciler;
//! use firebase_auth_flows::Auth;
//!
//! let auth = Auth::get_auth("YOUR_API_KEY").await?;
//! let mut session = SessionReconciler::new();
//! session.attach(&auth).await;
//! session.pump().await;
//!
//! let mut flow = PhoneSignIn::new();
//! flow.use_test_number();
//! match flow.send_code(&auth, &mut session, RetryPolicy::prompt(1), |_| true).await {
//!     Ok(notice) | Err(notice) => println!("{}: {}", notice.title, notice.message),
//! }
//! # Ok(())
//! # }
//! ```

use crate::auth::country::default_country;
use crate::auth::notice::{confirm_code_notice, send_code_notice, Notice};
use crate::auth::phone::PhoneNumberInput;
use crate::auth::provider::IdentityProvider;
use crate::auth::session::{SessionPhase, SessionReconciler};
use crate::auth::types::{mask_phone_number, PendingVerification};
use crate::error::{FirebaseError, PhoneAuthError};
use tracing::{debug, error, info, warn};

/// Local number pre-filled by [`PhoneSignIn::use_test_number`]
pub const TEST_PHONE_NUMBER: &str = "7444 555666";

/// How many times a failed SMS dispatch may be re-issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on re-issued calls after the first attempt
    pub max_retries: u32,
}

impl RetryPolicy {
    /// Never retry
    pub const NEVER: RetryPolicy = RetryPolicy { max_retries: 0 };

    /// Offer up to `max_retries` retries, each confirmed by the user
    pub const fn prompt(max_retries: u32) -> Self {
        Self { max_retries }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::prompt(1)
    }
}

/// Phone sign-in form state
#[derive(Debug, Clone, Default)]
pub struct PhoneSignIn {
    input: PhoneNumberInput,
    verification_code: String,
}

impl PhoneSignIn {
    /// Empty form with the default country selected
    pub fn new() -> Self {
        Self::default()
    }

    /// Phone number candidate
    pub fn input(&self) -> &PhoneNumberInput {
        &self.input
    }

    /// Mutable phone number candidate, for keystrokes and country switches
    pub fn input_mut(&mut self) -> &mut PhoneNumberInput {
        &mut self.input
    }

    /// Verification code as typed
    pub fn verification_code(&self) -> &str {
        &self.verification_code
    }

    /// Replace the verification code text
    pub fn set_verification_code(&mut self, code: impl Into<String>) {
        self.verification_code = code.into();
    }

    /// Reset to the default country and the known test number
    pub fn use_test_number(&mut self) {
        self.input.select_country(default_country());
        self.input.set_local_input(TEST_PHONE_NUMBER);
    }

    /// Send an SMS code to the composed number
    ///
    /// Empty and invalid input are rejected without contacting the
    /// provider. A retryable failure is re-issued with the same number while
    /// `policy` has retries left and `confirm_retry` accepts the failure
    /// notice.
    pub async fn send_code<P, F>(
        &mut self,
        provider: &P,
        session: &mut SessionReconciler,
        policy: RetryPolicy,
        mut confirm_retry: F,
    ) -> Result<Notice, Notice>
    where
        P: IdentityProvider,
        F: FnMut(&Notice) -> bool,
    {
        if self.input.is_blank() {
            return Err(Notice::error("Please enter a phone number"));
        }

        if !self.input.validation().is_valid {
            return Err(Notice::error("Please enter a valid phone number"));
        }

        if session.view().phase() != SessionPhase::SignedOut {
            return Err(send_code_notice(&PhoneAuthError::VerificationUnavailable.into()));
        }

        let full_number = self.input.normalized();
        let masked = mask_phone_number(&full_number);
        let mut attempt = 0;

        session.begin_request();
        let result = loop {
            debug!(phone = %masked, attempt, "sending SMS code");

            let err = match provider.send_verification_code(&full_number).await {
                Ok(handle) => break Ok(handle),
                Err(err) => err,
            };

            error!(phone = %masked, attempt, error = %err, "failed to send SMS code");
            let notice = send_code_notice(&err);

            if !notice.offer_retry || attempt >= policy.max_retries || !confirm_retry(&notice) {
                break Err(notice);
            }

            attempt += 1;
            warn!(phone = %masked, attempt, "retrying SMS code");
        };
        session.end_request();

        let handle = result?;
        session
            .begin_verification(PendingVerification::new(handle))
            .map_err(|e| send_code_notice(&e.into()))?;

        info!(phone = %masked, "awaiting verification code");
        Ok(Notice::success(
            "SMS sent! Please check your phone for the verification code.",
        ))
    }

    /// Confirm the typed code against the pending verification
    pub async fn confirm_code<P: IdentityProvider>(
        &mut self,
        provider: &P,
        session: &mut SessionReconciler,
    ) -> Result<Notice, Notice> {
        let code = self.verification_code.trim().to_string();

        if code.is_empty() {
            return Err(Notice::error("Please enter the verification code"));
        }

        let Some(pending) = session.pending_verification() else {
            return Err(Notice::error(
                "No confirmation available. Please request a new SMS.",
            ));
        };
        let handle = pending.handle.clone();

        session.begin_request();
        let result = provider.confirm_verification_code(&handle, &code).await;
        session.end_request();

        match result {
            Ok(auth_result) => {
                info!(uid = %auth_result.user.uid, "phone number verified");
                self.verification_code.clear();
                Ok(Notice::success("Phone number verified successfully!"))
            }
            Err(err) => {
                error!(error = %err, "failed to confirm verification code");
                if matches!(
                    err,
                    FirebaseError::PhoneAuth(
                        PhoneAuthError::SessionExpired | PhoneAuthError::StaleConfirmation
                    )
                ) {
                    session.cancel_verification();
                }
                Err(confirm_code_notice(&err))
            }
        }
    }

    /// Abandon the pending verification and return to phone input
    ///
    /// No provider call is made; the next [`send_code`](Self::send_code)
    /// issues a fresh handle.
    pub fn resend(&mut self, session: &mut SessionReconciler) -> bool {
        self.verification_code.clear();
        let cancelled = session.cancel_verification().is_some();
        if cancelled {
            debug!("pending verification cancelled for resend");
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::AuthStateStream;
    use crate::auth::types::{AuthResult, ConfirmationHandle, Credential, User};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Provider whose SMS dispatch always fails with `error`
    struct FailingProvider {
        error: fn() -> FirebaseError,
        calls: AtomicU32,
    }

    impl FailingProvider {
        fn new(error: fn() -> FirebaseError) -> Self {
            Self { error, calls: AtomicU32::new(0) }
        }
    }

    impl IdentityProvider for FailingProvider {
        async fn auth_state_changes(&self) -> AuthStateStream {
            Box::pin(futures::stream::iter(vec![None]))
        }

        async fn send_verification_code(&self, _: &str) -> Result<ConfirmationHandle, FirebaseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }

        async fn confirm_verification_code(
            &self,
            _: &ConfirmationHandle,
            _: &str,
        ) -> Result<AuthResult, FirebaseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }

        async fn sign_in_with_email_and_password(&self, _: &str, _: &str) -> Result<AuthResult, FirebaseError> {
            Err((self.error)())
        }

        async fn create_user_with_email_and_password(&self, _: &str, _: &str) -> Result<AuthResult, FirebaseError> {
            Err((self.error)())
        }

        async fn sign_in_with_credential(&self, _: Credential) -> Result<AuthResult, FirebaseError> {
            Err((self.error)())
        }

        async fn sign_out(&self) -> Result<(), FirebaseError> {
            Ok(())
        }
    }

    fn signed_out() -> SessionReconciler {
        let mut session = SessionReconciler::new();
        session.apply(None);
        session
    }

    #[test]
    fn test_use_test_number() {
        let mut flow = PhoneSignIn::new();
        flow.input_mut().set_local_input("12");
        flow.use_test_number();

        assert_eq!(flow.input().full_number(), "+447444555666");
        assert!(flow.input().validation().is_valid);
    }

    #[test]
    fn test_retry_policy() {
        assert_eq!(RetryPolicy::NEVER.max_retries, 0);
        assert_eq!(RetryPolicy::prompt(3).max_retries, 3);
        assert_eq!(RetryPolicy::default(), RetryPolicy::prompt(1));
    }

    #[tokio::test]
    async fn test_blank_input_rejected_locally() {
        let provider = FailingProvider::new(|| PhoneAuthError::Internal.into());
        let mut session = signed_out();
        let mut flow = PhoneSignIn::new();
        flow.input_mut().set_local_input("   ");

        let notice = flow
            .send_code(&provider, &mut session, RetryPolicy::NEVER, |_| true)
            .await
            .unwrap_err();

        assert_eq!(notice.message, "Please enter a phone number");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_locally() {
        let provider = FailingProvider::new(|| PhoneAuthError::Internal.into());
        let mut session = signed_out();
        let mut flow = PhoneSignIn::new();
        flow.input_mut().set_local_input("12");

        let notice = flow
            .send_code(&provider, &mut session, RetryPolicy::NEVER, |_| true)
            .await
            .unwrap_err();

        assert_eq!(notice.message, "Please enter a valid phone number");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retry_bounded_by_policy() {
        let provider = FailingProvider::new(|| PhoneAuthError::Internal.into());
        let mut session = signed_out();
        let mut flow = PhoneSignIn::new();
        flow.use_test_number();

        let mut prompts = 0;
        let notice = flow
            .send_code(&provider, &mut session, RetryPolicy::prompt(2), |_| {
                prompts += 1;
                true
            })
            .await
            .unwrap_err();

        assert!(notice.offer_retry);
        assert_eq!(prompts, 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert!(!session.view().loading);
        assert!(session.pending_verification().is_none());
    }

    #[tokio::test]
    async fn test_declined_retry_stops() {
        let provider = FailingProvider::new(|| PhoneAuthError::Internal.into());
        let mut session = signed_out();
        let mut flow = PhoneSignIn::new();
        flow.use_test_number();

        flow.send_code(&provider, &mut session, RetryPolicy::prompt(5), |_| false)
            .await
            .unwrap_err();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_retryable_error_not_retried() {
        let provider = FailingProvider::new(|| PhoneAuthError::QuotaExceeded.into());
        let mut session = signed_out();
        let mut flow = PhoneSignIn::new();
        flow.use_test_number();

        let notice = flow
            .send_code(&provider, &mut session, RetryPolicy::prompt(5), |_| true)
            .await
            .unwrap_err();

        assert!(!notice.offer_retry);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_send_requires_signed_out() {
        let provider = FailingProvider::new(|| PhoneAuthError::Internal.into());
        let mut session = SessionReconciler::new();
        session.apply(Some(Arc::new(User::new("uid"))));
        let mut flow = PhoneSignIn::new();
        flow.use_test_number();

        let notice = flow
            .send_code(&provider, &mut session, RetryPolicy::NEVER, |_| true)
            .await
            .unwrap_err();

        assert_eq!(notice.message, "Phone sign-in is only available while signed out.");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirm_guards() {
        let provider = FailingProvider::new(|| PhoneAuthError::Internal.into());
        let mut session = signed_out();
        let mut flow = PhoneSignIn::new();

        let notice = flow.confirm_code(&provider, &mut session).await.unwrap_err();
        assert_eq!(notice.message, "Please enter the verification code");

        flow.set_verification_code("123456");
        let notice = flow.confirm_code(&provider, &mut session).await.unwrap_err();
        assert_eq!(notice.message, "No confirmation available. Please request a new SMS.");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_session_expired_clears_pending() {
        let provider = FailingProvider::new(|| PhoneAuthError::SessionExpired.into());
        let mut session = signed_out();
        session
            .begin_verification(PendingVerification::new(ConfirmationHandle::new(
                "session",
                "+447444555666",
            )))
            .unwrap();
        let mut flow = PhoneSignIn::new();
        flow.set_verification_code("123456");

        let notice = flow.confirm_code(&provider, &mut session).await.unwrap_err();

        assert_eq!(notice.message, "Verification session expired. Please request a new SMS.");
        assert!(session.pending_verification().is_none());
    }

    #[tokio::test]
    async fn test_invalid_code_keeps_pending() {
        let provider = FailingProvider::new(|| PhoneAuthError::InvalidVerificationCode.into());
        let mut session = signed_out();
        session
            .begin_verification(PendingVerification::new(ConfirmationHandle::new(
                "session",
                "+447444555666",
            )))
            .unwrap();
        let mut flow = PhoneSignIn::new();
        flow.set_verification_code("000000");

        flow.confirm_code(&provider, &mut session).await.unwrap_err();

        assert!(session.pending_verification().is_some());
        assert_eq!(flow.verification_code(), "000000");
    }

    #[test]
    fn test_resend_cancels_pending() {
        let mut session = signed_out();
        session
            .begin_verification(PendingVerification::new(ConfirmationHandle::new(
                "session",
                "+447444555666",
            )))
            .unwrap();
        let mut flow = PhoneSignIn::new();
        flow.set_verification_code("123");

        assert!(flow.resend(&mut session));
        assert!(session.pending_verification().is_none());
        assert_eq!(flow.verification_code(), "");
        assert!(!flow.resend(&mut session));
    }
}
