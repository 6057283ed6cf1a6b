//! Email/password and Google sign-in flow against an in-memory provider

mod common;

use common::{FakeProvider, VALID_GOOGLE_TOKEN};
use firebase_auth_flows::auth::email_sign_in::{EmailMode, EmailSignIn};
use firebase_auth_flows::auth::session::{SessionPhase, SessionReconciler};

async fn attached(provider: &FakeProvider) -> SessionReconciler {
    let mut session = SessionReconciler::new();
    session.attach(provider).await;
    assert!(session.pump().await);
    session
}

fn form(email: &str, password: &str) -> EmailSignIn {
    let mut form = EmailSignIn::new();
    form.email = email.to_string();
    form.password = password.to_string();
    form
}

#[tokio::test]
async fn test_login_prompt_follows_notifications() {
    let provider = FakeProvider::new()
        .with_account("user@example.com", "secret123")
        .await;
    let mut session = attached(&provider).await;
    assert!(session.view().login_visible);

    let mut login = form("user@example.com", "secret123");
    let user = login.submit(&provider, &mut session).await.unwrap();
    assert_eq!(user.email.as_deref(), Some("user@example.com"));
    assert!(login.email.is_empty());
    assert!(login.password.is_empty());

    assert!(session.pump().await);
    assert_eq!(session.view().phase(), SessionPhase::SignedIn);
    assert!(!session.view().login_visible);

    let notice = login.sign_out(&provider, &mut session).await.unwrap();
    assert_eq!(notice.message, "Signed out successfully");

    assert!(session.pump().await);
    assert!(session.view().login_visible);
    assert!(!session.view().loading);
}

#[tokio::test]
async fn test_both_fields_required() {
    let provider = FakeProvider::new();
    let mut session = attached(&provider).await;

    let notice = form("user@example.com", "")
        .submit(&provider, &mut session)
        .await
        .unwrap_err();

    assert_eq!(notice.message, "Please enter both email and password");
}

#[tokio::test]
async fn test_sign_in_failures() {
    let provider = FakeProvider::new()
        .with_account("user@example.com", "secret123")
        .await;
    let mut session = attached(&provider).await;

    let cases = [
        ("not-an-email", "secret123", "That email address is invalid!"),
        ("user@example.com", "wrong", "Incorrect email or password."),
        ("nobody@example.com", "secret123", "No account found with that email."),
    ];
    for (email, password, expected) in cases {
        let mut login = form(email, password);
        let notice = login.submit(&provider, &mut session).await.unwrap_err();
        assert_eq!(notice.message, expected);
        assert_eq!(login.email, email);
    }
    assert_eq!(session.view().phase(), SessionPhase::SignedOut);
}

#[tokio::test]
async fn test_register_failures() {
    let provider = FakeProvider::new()
        .with_account("taken@example.com", "secret123")
        .await;
    let mut session = attached(&provider).await;

    let cases = [
        ("taken@example.com", "secret123", "That email address is already in use!"),
        ("not-an-email", "secret123", "That email address is invalid!"),
        ("new@example.com", "123", "Password is too weak."),
    ];
    for (email, password, expected) in cases {
        let mut register = form(email, password);
        register.toggle_mode();
        let notice = register.submit(&provider, &mut session).await.unwrap_err();
        assert_eq!(notice.message, expected);
    }
}

#[tokio::test]
async fn test_register_then_sign_in() {
    let provider = FakeProvider::new();
    let mut session = attached(&provider).await;

    let mut register = form("new@example.com", "secret123");
    assert_eq!(register.toggle_mode(), EmailMode::Register);
    register.submit(&provider, &mut session).await.unwrap();
    assert!(session.pump().await);
    assert_eq!(session.view().phase(), SessionPhase::SignedIn);

    register.sign_out(&provider, &mut session).await.unwrap();
    assert!(session.pump().await);

    let mut login = form("new@example.com", "secret123");
    assert!(login.submit(&provider, &mut session).await.is_ok());
}

#[tokio::test]
async fn test_google_sign_in() {
    let provider = FakeProvider::new();
    let mut session = attached(&provider).await;
    let mut login = EmailSignIn::new();

    let notice = login
        .sign_in_with_google(&provider, &mut session, None)
        .await
        .unwrap_err();
    assert_eq!(notice.message, "Failed to sign in with Google. Please try again.");

    let notice = login
        .sign_in_with_google(&provider, &mut session, Some("forged".to_string()))
        .await
        .unwrap_err();
    assert_eq!(notice.message, "Failed to sign in with Google. Please try again.");

    let user = login
        .sign_in_with_google(&provider, &mut session, Some(VALID_GOOGLE_TOKEN.to_string()))
        .await
        .unwrap();
    assert_eq!(user.uid, "google-user");

    assert!(session.pump().await);
    assert_eq!(session.view().phase(), SessionPhase::SignedIn);
}

#[tokio::test]
async fn test_sign_out_failure() {
    let provider = FakeProvider::new()
        .with_account("user@example.com", "secret123")
        .await;
    let mut session = attached(&provider).await;
    let mut login = form("user@example.com", "secret123");
    login.submit(&provider, &mut session).await.unwrap();
    assert!(session.pump().await);

    provider.fail_sign_out().await;
    let notice = login.sign_out(&provider, &mut session).await.unwrap_err();

    assert_eq!(notice.message, "Failed to sign out. Please try again.");
    assert_eq!(session.view().phase(), SessionPhase::SignedIn);
    assert!(!session.view().loading);
}
