//! In-memory identity provider for flow tests

#![allow(dead_code)]

use async_stream::stream;
use firebase_auth_flows::auth::provider::AuthStateStream;
use firebase_auth_flows::{
    AuthError, AuthResult, ConfirmationHandle, Credential, FirebaseError, IdentityProvider,
    PhoneAuthError, User,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Code accepted by [`FakeProvider::confirm_verification_code`]
pub const VALID_CODE: &str = "123456";

/// Google ID token accepted by [`FakeProvider::sign_in_with_credential`]
pub const VALID_GOOGLE_TOKEN: &str = "google-id-token";

/// Provider keeping accounts and phone sessions in memory
pub struct FakeProvider {
    current_user: RwLock<Option<Arc<User>>>,
    state_tx: broadcast::Sender<Option<Arc<User>>>,
    accounts: RwLock<HashMap<String, String>>,
    latest_handle: RwLock<Option<Uuid>>,
    send_failures: RwLock<VecDeque<PhoneAuthError>>,
    confirm_failure: RwLock<Option<PhoneAuthError>>,
    fail_sign_out: RwLock<bool>,
    sent_to: RwLock<Vec<String>>,
    send_calls: AtomicUsize,
    confirm_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(16);
        Self {
            current_user: RwLock::new(None),
            state_tx,
            accounts: RwLock::new(HashMap::new()),
            latest_handle: RwLock::new(None),
            send_failures: RwLock::new(VecDeque::new()),
            confirm_failure: RwLock::new(None),
            fail_sign_out: RwLock::new(false),
            sent_to: RwLock::new(Vec::new()),
            send_calls: AtomicUsize::new(0),
            confirm_calls: AtomicUsize::new(0),
        }
    }

    /// Register an email account
    pub async fn with_account(self, email: &str, password: &str) -> Self {
        self.accounts
            .write()
            .await
            .insert(email.to_string(), password.to_string());
        self
    }

    /// Make the next SMS dispatches fail, in order
    pub async fn fail_next_sends(&self, errors: impl IntoIterator<Item = PhoneAuthError>) {
        self.send_failures.write().await.extend(errors);
    }

    /// Make the next confirmation fail with `error`
    pub async fn fail_next_confirm(&self, error: PhoneAuthError) {
        *self.confirm_failure.write().await = Some(error);
    }

    pub async fn fail_sign_out(&self) {
        *self.fail_sign_out.write().await = true;
    }

    /// Numbers an SMS was dispatched to
    pub async fn sent_to(&self) -> Vec<String> {
        self.sent_to.read().await.clone()
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub async fn current_user(&self) -> Option<Arc<User>> {
        self.current_user.read().await.clone()
    }

    async fn set_current_user(&self, user: Option<Arc<User>>) {
        *self.current_user.write().await = user.clone();
        let _ = self.state_tx.send(user);
    }

    async fn sign_in(&self, user: User, provider_id: &str) -> AuthResult {
        let user = Arc::new(user);
        self.set_current_user(Some(Arc::clone(&user))).await;
        AuthResult {
            user,
            additional_user_info: Some(firebase_auth_flows::auth::types::AdditionalUserInfo {
                provider_id: provider_id.to_string(),
                is_new_user: false,
                profile: None,
            }),
        }
    }
}

impl IdentityProvider for FakeProvider {
    async fn auth_state_changes(&self) -> AuthStateStream {
        let mut rx = self.state_tx.subscribe();
        let initial = self.current_user().await;

        Box::pin(stream! {
            yield initial;
            while let Ok(user) = rx.recv().await {
                yield user;
            }
        })
    }

    async fn send_verification_code(
        &self,
        phone_number: &str,
    ) -> Result<ConfirmationHandle, FirebaseError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.send_failures.write().await.pop_front() {
            return Err(err.into());
        }

        self.sent_to.write().await.push(phone_number.to_string());
        let handle = ConfirmationHandle::new(format!("session-{}", self.send_calls()), phone_number);
        *self.latest_handle.write().await = Some(handle.id());
        Ok(handle)
    }

    async fn confirm_verification_code(
        &self,
        handle: &ConfirmationHandle,
        code: &str,
    ) -> Result<AuthResult, FirebaseError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);

        if *self.latest_handle.read().await != Some(handle.id()) {
            return Err(PhoneAuthError::StaleConfirmation.into());
        }

        if let Some(err) = self.confirm_failure.write().await.take() {
            if err == PhoneAuthError::SessionExpired {
                *self.latest_handle.write().await = None;
            }
            return Err(err.into());
        }

        if code != VALID_CODE {
            return Err(PhoneAuthError::InvalidVerificationCode.into());
        }

        *self.latest_handle.write().await = None;
        let user = User::new(format!("phone-{}", handle.phone_number()))
            .with_phone_number(handle.phone_number());
        Ok(self.sign_in(user, "phone").await)
    }

    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResult, FirebaseError> {
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail.into());
        }

        let stored = self.accounts.read().await.get(email).cloned();
        match stored {
            None => Err(AuthError::UserNotFound.into()),
            Some(p) if p != password => Err(AuthError::WrongPassword.into()),
            Some(_) => {
                let user = User::new(format!("email-{}", email)).with_email(email);
                Ok(self.sign_in(user, "password").await)
            }
        }
    }

    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResult, FirebaseError> {
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail.into());
        }
        if password.len() < 6 {
            return Err(AuthError::WeakPassword.into());
        }

        {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(email) {
                return Err(AuthError::EmailAlreadyInUse.into());
            }
            accounts.insert(email.to_string(), password.to_string());
        }

        let user = User::new(format!("email-{}", email)).with_email(email);
        Ok(self.sign_in(user, "password").await)
    }

    async fn sign_in_with_credential(
        &self,
        credential: Credential,
    ) -> Result<AuthResult, FirebaseError> {
        match credential {
            Credential::Google { id_token: Some(token), .. } if token == VALID_GOOGLE_TOKEN => {
                let user = User::new("google-user").with_email("google@example.com");
                Ok(self.sign_in(user, "google.com").await)
            }
            _ => Err(AuthError::InvalidCredential("rejected".to_string()).into()),
        }
    }

    async fn sign_out(&self) -> Result<(), FirebaseError> {
        if *self.fail_sign_out.read().await {
            return Err(AuthError::NetworkRequestFailed("offline".to_string()).into());
        }
        *self.latest_handle.write().await = None;
        self.set_current_user(None).await;
        Ok(())
    }
}
