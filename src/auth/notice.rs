//! User-facing notices
//!
//! Every provider failure is caught by the flow that issued the call and
//! turned into a [`Notice`] for the host to present. Nothing propagates
//! further.

use crate::error::{AuthError, FirebaseError, PhoneAuthError};

/// Title/message pair shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Short heading
    pub title: String,
    /// Body text
    pub message: String,
    /// Whether a one-tap retry is offered
    pub offer_retry: bool,
}

impl Notice {
    /// Failure notice titled "Error"
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            message: message.into(),
            offer_retry: false,
        }
    }

    /// Confirmation notice titled "Success"
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            title: "Success".to_string(),
            message: message.into(),
            offer_retry: false,
        }
    }

    fn titled(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    fn with_retry(mut self, offer_retry: bool) -> Self {
        self.offer_retry = offer_retry;
        self
    }
}

/// Message for a phone verification error kind
pub fn phone_error_message(err: &PhoneAuthError) -> String {
    match err {
        PhoneAuthError::InvalidPhoneNumber => {
            "Invalid phone number format. Please use international format (e.g., +44 7444 555666)".to_string()
        }
        PhoneAuthError::TooManyRequests => "Too many requests. Please try again later.".to_string(),
        PhoneAuthError::Internal => "Firebase internal error. This usually means:\n\n\
            1. Phone Authentication not enabled in Firebase Console\n\
            2. Testing with real phone numbers (use test numbers)\n\
            3. Firebase project configuration issue\n\n\
            Please check Firebase Console settings."
            .to_string(),
        PhoneAuthError::QuotaExceeded => {
            "SMS quota exceeded. Please try again later or contact support.".to_string()
        }
        PhoneAuthError::OperationNotAllowed => {
            "Phone Authentication is not enabled. Please enable it in Firebase Console.".to_string()
        }
        PhoneAuthError::InvalidVerificationCode => {
            "Invalid verification code. Please check and try again.".to_string()
        }
        PhoneAuthError::SessionExpired | PhoneAuthError::StaleConfirmation => {
            "Verification session expired. Please request a new SMS.".to_string()
        }
        PhoneAuthError::VerificationUnavailable => {
            "Phone sign-in is only available while signed out.".to_string()
        }
        PhoneAuthError::Unknown { message, .. } => {
            let message = if message.is_empty() { "Unknown error" } else { message };
            format!("SMS failed: {}", message)
        }
    }
}

/// Notice for a failed SMS dispatch
///
/// Internal and unclassified provider errors offer a retry; local and
/// transport failures fall back to a generic message.
pub fn send_code_notice(err: &FirebaseError) -> Notice {
    match err {
        FirebaseError::PhoneAuth(phone_err) => Notice::error(phone_error_message(phone_err))
            .titled("SMS Error")
            .with_retry(phone_err.is_retryable()),
        _ => Notice::error("Failed to send SMS. Please try again.").titled("SMS Error"),
    }
}

/// Notice for a failed code confirmation
pub fn confirm_code_notice(err: &FirebaseError) -> Notice {
    match err {
        FirebaseError::PhoneAuth(
            phone_err @ (PhoneAuthError::InvalidVerificationCode
            | PhoneAuthError::SessionExpired
            | PhoneAuthError::StaleConfirmation),
        ) => Notice::error(phone_error_message(phone_err)),
        _ => Notice::error("Invalid verification code. Please try again."),
    }
}

/// Notice for a failed email/password sign-in
pub fn sign_in_notice(err: &FirebaseError) -> Notice {
    let message = match err {
        FirebaseError::Auth(AuthError::InvalidEmail) => "That email address is invalid!",
        FirebaseError::Auth(AuthError::InvalidCredential(_) | AuthError::WrongPassword) => {
            "Incorrect email or password."
        }
        FirebaseError::Auth(AuthError::UserNotFound) => "No account found with that email.",
        _ => "Failed to sign in. Please try again.",
    };
    Notice::error(message)
}

/// Notice for a failed registration
pub fn register_notice(err: &FirebaseError) -> Notice {
    let message = match err {
        FirebaseError::Auth(AuthError::EmailAlreadyInUse) => "That email address is already in use!",
        FirebaseError::Auth(AuthError::InvalidEmail) => "That email address is invalid!",
        FirebaseError::Auth(AuthError::WeakPassword) => "Password is too weak.",
        _ => "Failed to create account. Please try again.",
    };
    Notice::error(message)
}

/// Notice for a failed Google sign-in
pub fn google_sign_in_notice(_err: &FirebaseError) -> Notice {
    Notice::error("Failed to sign in with Google. Please try again.")
}

/// Notice for a failed sign-out
pub fn sign_out_notice(_err: &FirebaseError) -> Notice {
    Notice::error("Failed to sign out. Please try again.")
}
