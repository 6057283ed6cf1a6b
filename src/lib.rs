//! Firebase Auth Flows
//!
//! Client-side sign-in logic on top of Firebase Authentication: phone
//! number OTP sign-in with dial-code composition and validation,
//! email/password and Google sign-in, auth-state session reconciliation,
//! and crash-reporting controls.
//!
//! # Example (Phone sign-in)
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use firebase_auth_flows::auth::phone_sign_in::{PhoneSignIn, RetryPolicy};
//! use firebase_auth_flows::auth::session::SessionReconciler;
//! use firebase_auth_flows::{App, AppOptions};
//!
//! let app = App::create(AppOptions::from_env()?).await?;
//! let auth = app.auth().await?;
//!
//! let mut session = SessionReconciler::new();
//! session.attach(&auth).await;
//! session.pump().await;
//!
//! let mut flow = PhoneSignIn::new();
//! flow.input_mut().set_local_input("7444 555666");
//! if let Err(notice) = flow.send_code(&auth, &mut session, RetryPolicy::NEVER, |_| false).await {
//!     eprintln!("{}: {}", notice.title, notice.message);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod crashlytics;
pub mod error;
pub mod logging;

// Auth module
pub mod auth {
    //! Firebase Authentication and sign-in flows

    pub mod auth;
    pub mod country;
    pub mod email_sign_in;
    pub mod notice;
    pub mod phone;
    pub mod phone_sign_in;
    pub mod provider;
    pub mod session;
    pub mod types;

    pub use auth::Auth;
    pub use provider::IdentityProvider;
}

// Re-exports for convenience
pub use app::{App, AppOptions, GoogleSignInOptions};
pub use error::{AuthError, FirebaseError, PhoneAuthError};

// Auth re-exports
pub use auth::notice::Notice;
pub use auth::{
    types::{AuthResult, ConfirmationHandle, Credential, User},
    Auth, IdentityProvider,
};
