//! Firebase App configuration
//!
//! An [`App`] holds the project credentials that [`Auth`] and the sign-in
//! flows use. Options come from code or from the environment.

use crate::auth::Auth;
use crate::error::FirebaseError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Name of the app created without an explicit name
pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

/// Global map of App names to App instances
static APP_INSTANCES: Lazy<RwLock<HashMap<String, App>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Firebase App instance
///
/// Each app name has at most one App instance (singleton pattern).
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    name: String,
    options: AppOptions,
}

/// Google Sign-In client configuration
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GoogleSignInOptions {
    /// OAuth web client id, used to request ID tokens
    pub web_client_id: Option<String>,
    /// OAuth iOS client id
    pub ios_client_id: Option<String>,
}

/// Firebase App configuration options
#[derive(Clone, PartialEq, Eq)]
pub struct AppOptions {
    /// Firebase API key
    pub api_key: String,
    /// Google Cloud project ID
    pub project_id: String,
    /// App name (optional, defaults to "[DEFAULT]")
    pub app_name: Option<String>,
    /// Google Sign-In client ids
    pub google: GoogleSignInOptions,
}

impl AppOptions {
    /// Options with the required fields set
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            app_name: None,
            google: GoogleSignInOptions::default(),
        }
    }

    /// Read options from the process environment
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `FIREBASE_API_KEY` | `api_key` (required) |
    /// | `FIREBASE_PROJECT_ID` | `project_id` (required) |
    /// | `FIREBASE_APP_NAME` | `app_name` |
    /// | `GOOGLE_WEB_CLIENT_ID` | `google.web_client_id` |
    /// | `GOOGLE_IOS_CLIENT_ID` | `google.ios_client_id` |
    pub fn from_env() -> Result<Self, FirebaseError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read options through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FirebaseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("FIREBASE_API_KEY").ok_or(FirebaseError::ApiKeyNotConfigured)?;
        let project_id = get("FIREBASE_PROJECT_ID")
            .ok_or_else(|| FirebaseError::config("FIREBASE_PROJECT_ID is not set"))?;

        Ok(Self {
            api_key,
            project_id,
            app_name: get("FIREBASE_APP_NAME"),
            google: GoogleSignInOptions {
                web_client_id: get("GOOGLE_WEB_CLIENT_ID"),
                ios_client_id: get("GOOGLE_IOS_CLIENT_ID"),
            },
        })
    }
}

impl std::fmt::Debug for AppOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppOptions")
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("app_name", &self.app_name)
            .field("google", &self.google)
            .finish()
    }
}

impl App {
    /// Create a new Firebase App with the given options
    ///
    /// If an app with the same name already exists, returns the existing instance.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_auth_flows::{App, AppOptions};
    ///
    /// let app = App::create(AppOptions::new("YOUR_API_KEY", "your-project-id")).await?;
    /// let auth = app.auth().await?;
    /// println!("{}", app.diagnostics(&auth).await);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(options: AppOptions) -> Result<Self, FirebaseError> {
        // Validate options (error case first)
        if options.api_key.is_empty() {
            return Err(FirebaseError::ApiKeyNotConfigured);
        }
        if options.project_id.is_empty() {
            return Err(FirebaseError::config("Project ID cannot be empty"));
        }

        let name = match options.app_name.clone() {
            None => DEFAULT_APP_NAME.to_string(),
            Some(n) => n,
        };

        let mut instances = APP_INSTANCES.write().await;

        // Check if instance already exists
        if let Some(app) = instances.get(&name) {
            return Ok(app.clone());
        }

        debug!(app = %name, ?options, "creating Firebase app");
        let app = App {
            inner: Arc::new(AppInner {
                name: name.clone(),
                options,
            }),
        };

        instances.insert(name, app.clone());

        Ok(app)
    }

    /// Get the default Firebase App instance
    ///
    /// Returns the app with name "[DEFAULT]" if it exists.
    pub async fn get_instance() -> Result<Self, FirebaseError> {
        Self::get_instance_with_name(DEFAULT_APP_NAME).await
    }

    /// Get a named Firebase App instance
    pub async fn get_instance_with_name(name: &str) -> Result<Self, FirebaseError> {
        let instances = APP_INSTANCES.read().await;
        instances.get(name).cloned().ok_or_else(|| {
            FirebaseError::config(format!(
                "Firebase App '{}' not found. Call App::create() first.",
                name
            ))
        })
    }

    /// Get the app name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the app options
    pub fn options(&self) -> &AppOptions {
        &self.inner.options
    }

    /// Auth instance for this app's API key
    pub async fn auth(&self) -> Result<Auth, FirebaseError> {
        Auth::get_auth(self.inner.options.api_key.clone()).await
    }

    /// Short configuration summary for troubleshooting
    pub async fn diagnostics(&self, auth: &Auth) -> String {
        let signed_in = auth.current_user().await.is_some();
        debug!(app = %self.name(), options = ?self.options(), signed_in, "Firebase config");

        format!(
            "App: {}\nCurrent User: {}",
            self.name(),
            if signed_in { "Signed In" } else { "Not Signed In" }
        )
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App").field("name", &self.inner.name).finish()
    }
}
