//! Authentication types
//!
//! Users, credentials, sign-in results and the phone verification handle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// User metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Timestamp when user was created (Unix timestamp in milliseconds)
    pub creation_timestamp: i64,

    /// Timestamp of last sign-in (Unix timestamp in milliseconds)
    pub last_sign_in_timestamp: i64,
}

/// User information returned from identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User ID from the provider
    pub uid: String,

    /// Display name
    pub display_name: Option<String>,

    /// Email address
    pub email: Option<String>,

    /// Phone number
    pub phone_number: Option<String>,

    /// Photo URL
    pub photo_url: Option<String>,

    /// Provider ID (e.g., "password", "google.com", "phone")
    pub provider_id: String,
}

/// Authentication credential
#[derive(Debug, Clone)]
pub enum Credential {
    /// Google OAuth credential
    Google {
        /// Google Sign-In ID token
        id_token: Option<String>,
        /// Google Sign-In access token
        access_token: Option<String>,
    },
}

impl Credential {
    /// Google credential from a Sign-In ID token
    pub fn google(id_token: impl Into<String>) -> Self {
        Credential::Google {
            id_token: Some(id_token.into()),
            access_token: None,
        }
    }

    /// Get the provider ID for this credential
    pub fn provider_id(&self) -> &str {
        match self {
            Credential::Google { .. } => "google.com",
        }
    }
}

/// Signed-in user account
///
/// Shared as `Arc<User>` between the provider and every session view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique Firebase user ID
    pub uid: String,

    /// Email address (if available)
    pub email: Option<String>,

    /// Display name (if available)
    pub display_name: Option<String>,

    /// Photo URL (if available)
    pub photo_url: Option<String>,

    /// Phone number in E.164 form (if available)
    pub phone_number: Option<String>,

    /// Whether email is verified
    pub email_verified: bool,

    /// Whether user is anonymous
    pub is_anonymous: bool,

    /// User metadata
    pub metadata: UserMetadata,

    /// Provider data for this user
    pub provider_data: Vec<UserInfo>,

    /// ID token (JWT) - internal use
    #[serde(skip)]
    pub(crate) id_token: Option<String>,

    /// Refresh token - internal use
    #[serde(skip)]
    pub(crate) refresh_token: Option<String>,

    /// Token expiration timestamp (seconds since epoch) - internal use
    #[serde(skip)]
    pub(crate) token_expiration: Option<i64>,
}

impl User {
    /// A user with only an id; the remaining profile fields are empty
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
            photo_url: None,
            phone_number: None,
            email_verified: false,
            is_anonymous: false,
            metadata: UserMetadata::default(),
            provider_data: vec![],
            id_token: None,
            refresh_token: None,
            token_expiration: None,
        }
    }

    /// Set the email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the phone number
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    /// Contact shown for the signed-in user: email, else phone number
    pub fn display_contact(&self) -> Option<&str> {
        self.email.as_deref().or(self.phone_number.as_deref())
    }

    /// Whether the user carries an ID token from the provider
    pub fn has_id_token(&self) -> bool {
        self.id_token.is_some()
    }
}

/// Sign-in result
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// The signed-in user
    pub user: Arc<User>,

    /// Additional provider information
    pub additional_user_info: Option<AdditionalUserInfo>,
}

/// Additional provider information returned with a sign-in
#[derive(Debug, Clone)]
pub struct AdditionalUserInfo {
    /// Provider ID
    pub provider_id: String,

    /// Whether this sign-in created the account
    pub is_new_user: bool,

    /// Raw provider profile
    pub profile: Option<serde_json::Value>,
}

/// Opaque token returned once an SMS code has been dispatched
///
/// Each handle has its own identity; two handles are equal only if they were
/// issued by the same request. Issuing a new handle makes earlier ones stale.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfirmationHandle {
    id: Uuid,
    session_info: String,
    phone_number: String,
}

impl ConfirmationHandle {
    /// Wrap the provider's session info for `phone_number`
    pub fn new(session_info: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_info: session_info.into(),
            phone_number: phone_number.into(),
        }
    }

    /// Identity of this handle
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Provider session info to send back with the code
    pub fn session_info(&self) -> &str {
        &self.session_info
    }

    /// Number the code was sent to
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }
}

impl fmt::Debug for ConfirmationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationHandle")
            .field("id", &self.id)
            .field("session_info", &"<redacted>")
            .field("phone_number", &mask_phone_number(&self.phone_number))
            .finish()
    }
}

/// An SMS code has been sent and awaits confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    /// Handle needed to confirm the code
    pub handle: ConfirmationHandle,

    /// Number the code was sent to, as entered
    pub phone_number: String,
}

impl PendingVerification {
    /// Pending verification for a freshly issued handle
    pub fn new(handle: ConfirmationHandle) -> Self {
        let phone_number = handle.phone_number().to_string();
        Self { handle, phone_number }
    }
}

/// Phone number with all but the last four characters masked, for logs
pub(crate) fn mask_phone_number(phone_number: &str) -> String {
    let chars: Vec<char> = phone_number.chars().collect();
    let visible = chars.len().saturating_sub(4);
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}
