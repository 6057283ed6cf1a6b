//! Firebase Authentication REST client
//!
//! Talks to the Identity Toolkit REST API and publishes auth-state changes
//! to every subscriber. One instance exists per API key.

use crate::auth::provider::{AuthStateStream, IdentityProvider};
use crate::auth::types::{
    mask_phone_number, AdditionalUserInfo, AuthResult, ConfirmationHandle, Credential, User,
    UserMetadata,
};
use crate::error::{AuthError, FirebaseError, PhoneAuthError};
use async_stream::stream;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Global map of API keys to Auth instances
static AUTH_INSTANCES: Lazy<RwLock<HashMap<String, Auth>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Firebase Authentication instance
///
/// Each API key has at most one Auth instance (singleton pattern).
/// Use `Auth::get_auth(api_key)` to obtain or create an instance.
#[derive(Clone)]
pub struct Auth {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    api_key: String,
    current_user: RwLock<Option<Arc<User>>>,
    http_client: reqwest::Client,
    state_tx: broadcast::Sender<Option<Arc<User>>>,
    recaptcha_token: RwLock<Option<String>>,
    /// Id of the only confirmation handle that may still be confirmed
    latest_verification: RwLock<Option<Uuid>>,
}

impl Auth {
    /// Get or create Auth instance for the given API key
    ///
    /// Returns existing Auth if one exists for this API key, otherwise creates new.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_auth_flows::Auth;
    ///
    /// let auth = Auth::get_auth("YOUR_API_KEY").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_auth(api_key: impl Into<String>) -> Result<Self, FirebaseError> {
        let api_key = api_key.into();

        // Validate API key (error case first)
        if api_key.is_empty() {
            return Err(FirebaseError::ApiKeyNotConfigured);
        }

        let mut instances = AUTH_INSTANCES.write().await;

        if let Some(auth) = instances.get(&api_key) {
            return Ok(auth.clone());
        }

        // Provider calls carry no client-side timeout; rate limits and quotas
        // surface as provider errors.
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| FirebaseError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        // Create broadcast channel for auth state changes (capacity: 16)
        let (state_tx, _) = broadcast::channel(16);

        let auth = Auth {
            inner: Arc::new(AuthInner {
                api_key: api_key.clone(),
                current_user: RwLock::new(None),
                http_client,
                state_tx,
                recaptcha_token: RwLock::new(None),
                latest_verification: RwLock::new(None),
            }),
        };

        instances.insert(api_key, auth.clone());

        Ok(auth)
    }

    /// Get the current signed-in user
    ///
    /// Returns None if no user is currently signed in.
    pub async fn current_user(&self) -> Option<Arc<User>> {
        self.inner.current_user.read().await.clone()
    }

    /// Sign out the current user
    ///
    /// Always succeeds, clears the current user and any pending phone
    /// verification.
    pub async fn sign_out(&self) -> Result<(), FirebaseError> {
        *self.inner.latest_verification.write().await = None;
        self.set_current_user(None).await;
        Ok(())
    }

    /// Get the API key for this Auth instance
    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    /// Set the reCAPTCHA token sent with SMS requests
    pub async fn set_recaptcha_token(&self, token: Option<String>) {
        *self.inner.recaptcha_token.write().await = token;
    }

    /// Forget `id` as the latest verification, unless a newer send replaced it
    async fn release_verification(&self, id: Uuid) {
        let mut latest = self.inner.latest_verification.write().await;
        if *latest == Some(id) {
            *latest = None;
        }
    }

    /// Internal: Set current user
    pub(crate) async fn set_current_user(&self, user: Option<Arc<User>>) {
        let mut current = self.inner.current_user.write().await;
        *current = user.clone();

        // Broadcast state change (ignore error if no listeners)
        let _ = self.inner.state_tx.send(user);
    }

    /// Subscribe to authentication state changes
    ///
    /// Returns a stream that yields the current user whenever:
    /// - A user signs in
    /// - A user signs out
    /// - The current user changes
    ///
    /// The stream immediately yields the current user state upon subscription.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_auth_flows::Auth;
    /// use futures::StreamExt;
    ///
    /// let auth = Auth::get_auth("YOUR_API_KEY").await?;
    /// let mut stream = auth.auth_state_changes().await;
    ///
    /// while let Some(user) = stream.next().await {
    ///     match user {
    ///         Some(u) => println!("User signed in: {}", u.uid),
    ///         None => println!("User signed out"),
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn auth_state_changes(&self) -> AuthStateStream {
        // Subscribe before reading so no change slips between the two
        let mut rx = self.inner.state_tx.subscribe();
        let initial_user = self.current_user().await;

        Box::pin(stream! {
            yield initial_user;

            loop {
                match rx.recv().await {
                    Ok(user) => yield user,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth state subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Sign in with email and password
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_auth_flows::Auth;
    ///
    /// let auth = Auth::get_auth("YOUR_API_KEY").await?;
    /// let result = auth.sign_in_with_email_and_password("user@example.com", "password").await?;
    /// println!("Signed in: {}", result.user.uid);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn sign_in_with_email_and_password(
        &self,
        email: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Result<AuthResult, FirebaseError> {
        let email = email.as_ref();
        let password = password.as_ref();

        // Validate email (error case first)
        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }

        // Validate password (error case first)
        if password.is_empty() {
            return Err(AuthError::InvalidPassword.into());
        }

        let user_data: SignInResponse = self
            .post(
                "accounts:signInWithPassword",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true
                }),
                auth_error,
            )
            .await?;

        let user = Arc::new(user_data.into_user());
        info!(uid = %user.uid, "signed in with email");

        self.set_current_user(Some(Arc::clone(&user))).await;

        Ok(AuthResult {
            user,
            additional_user_info: Some(AdditionalUserInfo {
                provider_id: "password".to_string(),
                is_new_user: false,
                profile: None,
            }),
        })
    }

    /// Create new user with email and password
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_auth_flows::Auth;
    ///
    /// let auth = Auth::get_auth("YOUR_API_KEY").await?;
    /// let result = auth.create_user_with_email_and_password("newuser@example.com", "password123").await?;
    /// println!("Created user: {}", result.user.uid);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_user_with_email_and_password(
        &self,
        email: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Result<AuthResult, FirebaseError> {
        let email = email.as_ref();
        let password = password.as_ref();

        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }

        if password.is_empty() {
            return Err(AuthError::InvalidPassword.into());
        }

        let user_data: SignInResponse = self
            .post(
                "accounts:signUp",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true
                }),
                auth_error,
            )
            .await?;

        let user = Arc::new(user_data.into_user());
        info!(uid = %user.uid, "registered with email");

        self.set_current_user(Some(Arc::clone(&user))).await;

        Ok(AuthResult {
            user,
            additional_user_info: Some(AdditionalUserInfo {
                provider_id: "password".to_string(),
                is_new_user: true,
                profile: None,
            }),
        })
    }

    /// Sign in with OAuth credential
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_auth_flows::{Auth, Credential};
    ///
    /// let auth = Auth::get_auth("YOUR_API_KEY").await?;
    /// let result = auth.sign_in_with_credential(Credential::google("google_id_token")).await?;
    /// println!("Signed in: {}", result.user.uid);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn sign_in_with_credential(&self, credential: Credential) -> Result<AuthResult, FirebaseError> {
        let Credential::Google { id_token, access_token } = credential;
        if id_token.is_none() && access_token.is_none() {
            return Err(AuthError::InvalidCredential(
                "Google credential requires id_token or access_token".to_string(),
            )
            .into());
        }

        let mut post_body = String::from("providerId=google.com");
        if let Some(id_token_val) = id_token {
            post_body.push_str(&format!("&id_token={}", id_token_val));
        }
        if let Some(access_token_val) = access_token {
            post_body.push_str(&format!("&access_token={}", access_token_val));
        }

        let user_data: SignInResponse = self
            .post(
                "accounts:signInWithIdp",
                serde_json::json!({
                    "postBody": post_body,
                    "requestUri": "http://localhost",
                    "returnSecureToken": true,
                    "returnIdpCredential": true
                }),
                auth_error,
            )
            .await?;

        let is_new_user = user_data.is_new_user.unwrap_or(false);
        let user = Arc::new(user_data.into_user());
        info!(uid = %user.uid, "signed in with Google");

        self.set_current_user(Some(Arc::clone(&user))).await;

        Ok(AuthResult {
            user,
            additional_user_info: Some(AdditionalUserInfo {
                provider_id: "google.com".to_string(),
                is_new_user,
                profile: None,
            }),
        })
    }

    /// Send a one-time code by SMS
    ///
    /// The returned handle is the only one that can be confirmed; any handle
    /// issued earlier becomes stale.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_auth_flows::Auth;
    ///
    /// let auth = Auth::get_auth("YOUR_API_KEY").await?;
    /// let handle = auth.send_verification_code("+447444555666").await?;
    /// let result = auth.confirm_verification_code(&handle, "123456").await?;
    /// println!("Signed in: {:?}", result.user.phone_number);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send_verification_code(
        &self,
        phone_number: impl AsRef<str>,
    ) -> Result<ConfirmationHandle, FirebaseError> {
        let phone_number = phone_number.as_ref();

        if phone_number.is_empty() {
            return Err(PhoneAuthError::InvalidPhoneNumber.into());
        }

        let mut body = serde_json::json!({ "phoneNumber": phone_number });
        if let Some(token) = self.inner.recaptcha_token.read().await.as_deref() {
            body["recaptchaToken"] = serde_json::Value::from(token);
        }

        debug!(phone = %mask_phone_number(phone_number), "requesting SMS code");
        let response: SendVerificationCodeResponse = self
            .post("accounts:sendVerificationCode", body, phone_error)
            .await?;

        let handle = ConfirmationHandle::new(response.session_info, phone_number);
        let superseded = self
            .inner
            .latest_verification
            .write()
            .await
            .replace(handle.id());
        if superseded.is_some() {
            debug!("previous confirmation handle superseded");
        }

        info!(phone = %mask_phone_number(phone_number), "SMS code sent");
        Ok(handle)
    }

    /// Confirm an SMS code and sign in
    ///
    /// Stale handles are rejected without contacting the backend.
    pub async fn confirm_verification_code(
        &self,
        handle: &ConfirmationHandle,
        code: impl AsRef<str>,
    ) -> Result<AuthResult, FirebaseError> {
        let code = code.as_ref().trim();

        if code.is_empty() {
            return Err(PhoneAuthError::InvalidVerificationCode.into());
        }

        if *self.inner.latest_verification.read().await != Some(handle.id()) {
            warn!(handle = %handle.id(), "rejecting stale confirmation handle");
            return Err(PhoneAuthError::StaleConfirmation.into());
        }

        let result: Result<PhoneSignInResponse, FirebaseError> = self
            .post(
                "accounts:signInWithPhoneNumber",
                serde_json::json!({
                    "sessionInfo": handle.session_info(),
                    "code": code
                }),
                phone_error,
            )
            .await;

        let user_data = match result {
            Err(FirebaseError::PhoneAuth(PhoneAuthError::SessionExpired)) => {
                self.release_verification(handle.id()).await;
                return Err(PhoneAuthError::SessionExpired.into());
            }
            Err(e) => return Err(e),
            Ok(data) => data,
        };

        self.release_verification(handle.id()).await;

        let is_new_user = user_data.is_new_user.unwrap_or(false);
        let user = Arc::new(user_data.into_user());
        info!(uid = %user.uid, "signed in with phone number");

        self.set_current_user(Some(Arc::clone(&user))).await;

        Ok(AuthResult {
            user,
            additional_user_info: Some(AdditionalUserInfo {
                provider_id: "phone".to_string(),
                is_new_user,
                profile: None,
            }),
        })
    }

    /// Internal: POST to an Identity Toolkit endpoint
    ///
    /// Non-success responses are classified from the backend's error message
    /// with `classify`.
    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
        classify: fn(&str) -> FirebaseError,
    ) -> Result<T, FirebaseError> {
        let url = format!("{}/{}?key={}", IDENTITY_TOOLKIT_URL, endpoint, self.inner.api_key);

        let response = self.inner.http_client.post(&url).json(&body).send().await?;

        // Handle error responses first
        if !response.status().is_success() {
            let status = response.status();
            let error_body: serde_json::Value = response.json().await?;
            let error_message = error_body["error"]["message"]
                .as_str()
                .unwrap_or("UNKNOWN_ERROR");
            error!(endpoint, %status, error_message, "identity provider request failed");
            return Err(classify(error_message));
        }

        Ok(response.json().await?)
    }
}

fn auth_error(message: &str) -> FirebaseError {
    AuthError::from_error_code(message).into()
}

fn phone_error(message: &str) -> FirebaseError {
    PhoneAuthError::from_error_code(message).into()
}

impl IdentityProvider for Auth {
    async fn auth_state_changes(&self) -> AuthStateStream {
        Auth::auth_state_changes(self).await
    }

    async fn send_verification_code(
        &self,
        phone_number: &str,
    ) -> Result<ConfirmationHandle, FirebaseError> {
        Auth::send_verification_code(self, phone_number).await
    }

    async fn confirm_verification_code(
        &self,
        handle: &ConfirmationHandle,
        code: &str,
    ) -> Result<AuthResult, FirebaseError> {
        Auth::confirm_verification_code(self, handle, code).await
    }

    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResult, FirebaseError> {
        Auth::sign_in_with_email_and_password(self, email, password).await
    }

    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResult, FirebaseError> {
        Auth::create_user_with_email_and_password(self, email, password).await
    }

    async fn sign_in_with_credential(
        &self,
        credential: Credential,
    ) -> Result<AuthResult, FirebaseError> {
        Auth::sign_in_with_credential(self, credential).await
    }

    async fn sign_out(&self) -> Result<(), FirebaseError> {
        Auth::sign_out(self).await
    }
}

/// Email, password and IdP sign-in response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
    is_new_user: Option<bool>,
}

impl SignInResponse {
    fn into_user(self) -> User {
        let now = chrono::Utc::now();
        User {
            uid: self.local_id,
            email: self.email,
            display_name: self.display_name,
            photo_url: self.photo_url,
            metadata: UserMetadata {
                creation_timestamp: now.timestamp_millis(),
                last_sign_in_timestamp: now.timestamp_millis(),
            },
            id_token: Some(self.id_token),
            refresh_token: Some(self.refresh_token),
            token_expiration: token_expiration(self.expires_in.as_deref()),
            ..User::new("")
        }
    }
}

/// `accounts:sendVerificationCode` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendVerificationCodeResponse {
    session_info: String,
}

/// `accounts:signInWithPhoneNumber` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhoneSignInResponse {
    local_id: String,
    phone_number: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
    is_new_user: Option<bool>,
}

impl PhoneSignInResponse {
    fn into_user(self) -> User {
        let now = chrono::Utc::now();
        User {
            uid: self.local_id,
            phone_number: self.phone_number,
            metadata: UserMetadata {
                creation_timestamp: now.timestamp_millis(),
                last_sign_in_timestamp: now.timestamp_millis(),
            },
            id_token: Some(self.id_token),
            refresh_token: Some(self.refresh_token),
            token_expiration: token_expiration(self.expires_in.as_deref()),
            ..User::new("")
        }
    }
}

/// Token expiration (seconds since epoch); defaults to one hour
fn token_expiration(expires_in: Option<&str>) -> Option<i64> {
    let seconds = expires_in.and_then(|s| s.parse::<i64>().ok()).unwrap_or(3600);
    Some(chrono::Utc::now().timestamp() + seconds)
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("api_key", &"<redacted>")
            .finish()
    }
}
