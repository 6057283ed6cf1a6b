//! Phone number normalization and validation
//!
//! A phone number candidate is the selected country's dial code followed by
//! free-text local input. Before it is sent to the identity provider the
//! candidate is normalized (everything except digits and `+` dropped) and
//! checked against international length rules:
//!
//! 1. must start with `+`
//! 2. `+` may only appear as the first character
//! 3. at least 3 characters long
//! 4. between 7 and 15 digits inclusive
//!
//! Validation failures are values, not errors: the UI shows them inline
//! while the user types.
//!
//! # Example
//! ```
//! use firebase_auth_flows::auth::phone::{validate_phone_number, PhoneValidationError};
//!
//! assert!(validate_phone_number("+44 7444 555666").is_valid);
//! assert_eq!(
//!     validate_phone_number("07444555666").error,
//!     Some(PhoneValidationError::MissingPlusPrefix)
//! );
//! ```

use crate::auth::country::{default_country, CountryCode};
use thiserror::Error;

/// Minimum digits in an international number, country code included
pub const MIN_PHONE_DIGITS: usize = 7;

/// Maximum digits allowed by E.164
pub const MAX_PHONE_DIGITS: usize = 15;

/// Why a phone number candidate is not acceptable
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PhoneValidationError {
    /// The number does not start with `+`
    #[error("Phone number must start with +")]
    MissingPlusPrefix,

    /// A `+` appears after the first character
    #[error("Phone number may only contain + at the start")]
    MisplacedPlus,

    /// Fewer than 7 digits, or too short to hold a country code
    #[error("Phone number too short")]
    TooShort,

    /// More than 15 digits
    #[error("Phone number too long")]
    TooLong,
}

/// Outcome of validating a phone number candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneValidation {
    /// Whether the candidate may be submitted
    pub is_valid: bool,
    /// Reason the candidate was rejected
    pub error: Option<PhoneValidationError>,
}

impl PhoneValidation {
    fn valid() -> Self {
        Self { is_valid: true, error: None }
    }

    fn invalid(error: PhoneValidationError) -> Self {
        Self { is_valid: false, error: Some(error) }
    }

    /// User-facing message, empty when valid
    pub fn error_message(&self) -> String {
        self.error.map(|e| e.to_string()).unwrap_or_default()
    }
}

/// Drop every character except decimal digits and `+`.
pub fn normalize_phone_number(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Validate a full candidate (dial code plus local input).
///
/// Pure and synchronous; the checks short-circuit in the order listed in
/// the module documentation.
pub fn validate_phone_number(phone: &str) -> PhoneValidation {
    let clean = normalize_phone_number(phone);

    let Some(rest) = clean.strip_prefix('+') else {
        return PhoneValidation::invalid(PhoneValidationError::MissingPlusPrefix);
    };

    if rest.contains('+') {
        return PhoneValidation::invalid(PhoneValidationError::MisplacedPlus);
    }

    if clean.len() < 3 {
        return PhoneValidation::invalid(PhoneValidationError::TooShort);
    }

    let digit_count = rest.len();
    if digit_count < MIN_PHONE_DIGITS {
        return PhoneValidation::invalid(PhoneValidationError::TooShort);
    }

    if digit_count > MAX_PHONE_DIGITS {
        return PhoneValidation::invalid(PhoneValidationError::TooLong);
    }

    PhoneValidation::valid()
}

/// Phone number being edited: selected country plus local input
///
/// The validation result is recomputed whenever either part changes, so a
/// country switch re-validates the existing input immediately.
#[derive(Debug, Clone)]
pub struct PhoneNumberInput {
    country: &'static CountryCode,
    local_input: String,
    validation: PhoneValidation,
}

impl Default for PhoneNumberInput {
    fn default() -> Self {
        Self::new(default_country(), "")
    }
}

impl PhoneNumberInput {
    /// Input for `country` pre-filled with `local_input`
    pub fn new(country: &'static CountryCode, local_input: impl Into<String>) -> Self {
        let mut input = Self {
            country,
            local_input: local_input.into(),
            validation: PhoneValidation::invalid(PhoneValidationError::TooShort),
        };
        input.revalidate();
        input
    }

    /// Replace the local input text
    pub fn set_local_input(&mut self, text: impl Into<String>) -> PhoneValidation {
        self.local_input = text.into();
        self.revalidate()
    }

    /// Switch the selected country
    pub fn select_country(&mut self, country: &'static CountryCode) -> PhoneValidation {
        self.country = country;
        self.revalidate()
    }

    /// Selected country
    pub fn country(&self) -> &'static CountryCode {
        self.country
    }

    /// Local input exactly as typed
    pub fn local_input(&self) -> &str {
        &self.local_input
    }

    /// Dial code and local input with whitespace removed
    pub fn full_number(&self) -> String {
        let mut full = String::from(self.country.dial_code);
        full.extend(self.local_input.chars().filter(|c| !c.is_whitespace()));
        full
    }

    /// The normalized form submitted to the provider
    pub fn normalized(&self) -> String {
        normalize_phone_number(&self.full_number())
    }

    /// Latest validation result
    pub fn validation(&self) -> PhoneValidation {
        self.validation
    }

    /// Whether the local input is blank
    pub fn is_blank(&self) -> bool {
        self.local_input.trim().is_empty()
    }

    fn revalidate(&mut self) -> PhoneValidation {
        self.validation = validate_phone_number(&self.full_number());
        self.validation
    }
}
