//! Error types
//!
//! Provides a unified error type hierarchy for identity-provider operations.
//!
//! Provider failures carry a namespaced code string (`auth/<kind>`), which is
//! how the mobile SDKs report them. The REST backend reports bare
//! upper-case codes (`EMAIL_EXISTS`, `INVALID_CODE : ...`); both forms are
//! classified into the enums below.
//!
//! # Design
//! Uses thiserror for ergonomic error definitions. All errors implement
//! std::error::Error and can be converted to FirebaseError via From trait.
//! Local input validation (phone number format) is not an error here: it is
//! a value, see [`crate::auth::phone::PhoneValidation`].

use thiserror::Error;

/// Namespace marker every provider error code starts with.
pub const AUTH_ERROR_NAMESPACE: &str = "auth/";

/// Whether `code` is a namespaced identity-provider error code.
///
/// # Example
/// ```
/// use firebase_auth_flows::error::is_auth_error_code;
///
/// assert!(is_auth_error_code("auth/invalid-email"));
/// assert!(!is_auth_error_code("storage/unknown"));
/// ```
pub fn is_auth_error_code(code: &str) -> bool {
    code.starts_with(AUTH_ERROR_NAMESPACE)
}

/// Top-level error type
///
/// Wraps the module-specific error types into a unified type.
/// Supports conversion from all module-specific errors via `From` trait.
///
/// # Example
/// ```
/// use firebase_auth_flows::{FirebaseError, AuthError};
///
/// let auth_err: FirebaseError = AuthError::InvalidEmail.into();
/// ```
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Email, credential and session errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Phone verification errors
    #[error("Phone auth error: {0}")]
    PhoneAuth(#[from] PhoneAuthError),

    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// API key not configured
    #[error("API key not configured")]
    ApiKeyNotConfigured,
}

/// Authentication errors for email, password and credential sign-in
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email address is missing or malformed
    #[error("Invalid email address")]
    InvalidEmail,

    /// Password is missing
    #[error("Invalid password")]
    InvalidPassword,

    /// Credential was rejected or is incomplete
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Wrong password
    #[error("Wrong password")]
    WrongPassword,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Email already in use by another account
    #[error("Email already in use")]
    EmailAlreadyInUse,

    /// Password does not satisfy the provider's strength rules
    #[error("Password is too weak")]
    WeakPassword,

    /// User account has been disabled
    #[error("User account disabled")]
    UserDisabled,

    /// Too many failed attempts
    #[error("Too many requests, try again later")]
    TooManyRequests,

    /// Operation not allowed (e.g., provider disabled)
    #[error("Operation not allowed")]
    OperationNotAllowed,

    /// Network error
    #[error("Network error: {0}")]
    NetworkRequestFailed(String),

    /// Invalid API key
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Unrecognised provider code
    #[error("Unknown auth error: {0}")]
    Unknown(String),
}

/// Phone verification errors
///
/// Covers both halves of the flow: dispatching the SMS and confirming the
/// one-time code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhoneAuthError {
    /// The provider rejected the phone number format
    #[error("Invalid phone number")]
    InvalidPhoneNumber,

    /// Rate limited by the provider
    #[error("Too many requests, try again later")]
    TooManyRequests,

    /// Transient provider failure or project misconfiguration
    #[error("Internal provider error")]
    Internal,

    /// SMS quota for the project is exhausted
    #[error("SMS quota exceeded")]
    QuotaExceeded,

    /// Phone sign-in is not enabled for the project
    #[error("Phone authentication not enabled")]
    OperationNotAllowed,

    /// Wrong one-time code
    #[error("Invalid verification code")]
    InvalidVerificationCode,

    /// The verification session timed out
    #[error("Verification session expired")]
    SessionExpired,

    /// The confirmation handle was superseded by a newer request
    #[error("Confirmation handle is no longer current")]
    StaleConfirmation,

    /// Verification can only be started while signed out
    #[error("Phone verification is not available in the current session state")]
    VerificationUnavailable,

    /// Unrecognised provider code
    #[error("Unknown phone auth error {code}: {message}")]
    Unknown {
        /// Raw provider code
        code: String,
        /// Provider message, may be empty
        message: String,
    },
}

impl FirebaseError {
    /// Create an internal error from a string
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a configuration error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Auth(AuthError::NetworkRequestFailed(_)) => true,
            Self::PhoneAuth(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Namespaced provider code, when the error came from the identity provider
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            Self::Auth(err) => Some(err.code()),
            Self::PhoneAuth(err) => Some(err.code()),
            _ => None,
        }
    }
}

/// Extract the leading code from a REST error message.
///
/// The backend sometimes appends detail: `"WEAK_PASSWORD : Password should
/// be at least 6 characters"`.
pub(crate) fn rest_error_code(message: &str) -> &str {
    match message.split_once(':') {
        Some((code, _)) => code.trim(),
        None => message.trim(),
    }
}

/// Namespaced form of a bare REST code: `APP_NOT_AUTHORIZED` becomes
/// `auth/app-not-authorized`.
pub(crate) fn namespaced_rest_code(code: &str) -> String {
    format!(
        "{}{}",
        AUTH_ERROR_NAMESPACE,
        code.to_ascii_lowercase().replace('_', "-")
    )
}

impl AuthError {
    /// Create from Firebase Auth REST API error message
    pub fn from_error_code(message: &str) -> Self {
        match rest_error_code(message) {
            "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "INVALID_PASSWORD" => Self::WrongPassword,
            "INVALID_LOGIN_CREDENTIALS" | "INVALID_IDP_RESPONSE" => {
                Self::InvalidCredential(message.to_string())
            }
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "OPERATION_NOT_ALLOWED" => Self::OperationNotAllowed,
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "MISSING_PASSWORD" => Self::InvalidPassword,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "INVALID_API_KEY" | "API_KEY_INVALID" => Self::InvalidApiKey,
            other => Self::Unknown(namespaced_rest_code(other)),
        }
    }

    /// Create from a namespaced provider code (`auth/invalid-email`)
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/invalid-email" => Self::InvalidEmail,
            "auth/missing-password" => Self::InvalidPassword,
            "auth/invalid-credential" => {
                Self::InvalidCredential("rejected by provider".to_string())
            }
            "auth/wrong-password" => Self::WrongPassword,
            "auth/user-not-found" => Self::UserNotFound,
            "auth/email-already-in-use" => Self::EmailAlreadyInUse,
            "auth/weak-password" => Self::WeakPassword,
            "auth/user-disabled" => Self::UserDisabled,
            "auth/too-many-requests" => Self::TooManyRequests,
            "auth/operation-not-allowed" => Self::OperationNotAllowed,
            "auth/network-request-failed" => Self::NetworkRequestFailed(String::new()),
            "auth/invalid-api-key" => Self::InvalidApiKey,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Namespaced provider code for this error
    pub fn code(&self) -> &str {
        match self {
            Self::InvalidEmail => "auth/invalid-email",
            Self::InvalidPassword => "auth/missing-password",
            Self::InvalidCredential(_) => "auth/invalid-credential",
            Self::WrongPassword => "auth/wrong-password",
            Self::UserNotFound => "auth/user-not-found",
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WeakPassword => "auth/weak-password",
            Self::UserDisabled => "auth/user-disabled",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::OperationNotAllowed => "auth/operation-not-allowed",
            Self::NetworkRequestFailed(_) => "auth/network-request-failed",
            Self::InvalidApiKey => "auth/invalid-api-key",
            Self::Unknown(code) => code,
        }
    }
}

impl PhoneAuthError {
    /// Create from Firebase Auth REST API error message
    pub fn from_error_code(message: &str) -> Self {
        match rest_error_code(message) {
            "INVALID_PHONE_NUMBER" | "MISSING_PHONE_NUMBER" => Self::InvalidPhoneNumber,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "QUOTA_EXCEEDED" => Self::QuotaExceeded,
            "OPERATION_NOT_ALLOWED" => Self::OperationNotAllowed,
            "INVALID_CODE" | "MISSING_CODE" => Self::InvalidVerificationCode,
            "SESSION_EXPIRED" | "INVALID_SESSION_INFO" | "MISSING_SESSION_INFO" => {
                Self::SessionExpired
            }
            "INTERNAL_ERROR"
            | "CAPTCHA_CHECK_FAILED"
            | "MISSING_RECAPTCHA_TOKEN"
            | "INVALID_RECAPTCHA_TOKEN" => Self::Internal,
            other => Self::Unknown {
                code: namespaced_rest_code(other),
                message: message.to_string(),
            },
        }
    }

    /// Create from a namespaced provider code and its message
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        match code {
            "auth/invalid-phone-number" => Self::InvalidPhoneNumber,
            "auth/too-many-requests" => Self::TooManyRequests,
            "auth/internal-error" => Self::Internal,
            "auth/quota-exceeded" => Self::QuotaExceeded,
            "auth/operation-not-allowed" => Self::OperationNotAllowed,
            "auth/invalid-verification-code" => Self::InvalidVerificationCode,
            "auth/session-expired" => Self::SessionExpired,
            other => Self::Unknown {
                code: other.to_string(),
                message: message.into(),
            },
        }
    }

    /// Namespaced provider code for this error
    pub fn code(&self) -> &str {
        match self {
            Self::InvalidPhoneNumber => "auth/invalid-phone-number",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::Internal => "auth/internal-error",
            Self::QuotaExceeded => "auth/quota-exceeded",
            Self::OperationNotAllowed => "auth/operation-not-allowed",
            Self::InvalidVerificationCode => "auth/invalid-verification-code",
            Self::SessionExpired => "auth/session-expired",
            Self::StaleConfirmation => "auth/stale-confirmation",
            Self::VerificationUnavailable => "auth/verification-unavailable",
            Self::Unknown { code, .. } => code,
        }
    }

    /// Whether the SMS request may be re-issued with the same input
    ///
    /// Internal errors and unclassified provider errors are treated as
    /// transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal | Self::Unknown { .. })
    }
}
