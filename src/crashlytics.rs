//! Crash reporting controls
//!
//! [`CrashReporter`] is the seam to a crash-reporting backend.
//! [`Crashlytics`] is an in-process implementation that keeps breadcrumbs
//! and non-fatal errors and forwards everything to `tracing`.
//! [`CrashlyticsPanel`] is the controller behind a crash-testing screen.
//!
//! # Example
//! ```
//! # tokio_test::block_on(async {
//! use firebase_auth_flows::crashlytics::{Crashlytics, CrashlyticsPanel};
//!
//! let mut panel = CrashlyticsPanel::new(Crashlytics::new(false));
//! assert_eq!(panel.status(), "Crashlytics is disabled");
//!
//! panel.toggle().await.unwrap();
//! assert_eq!(panel.status(), "Crashlytics is enabled");
//! # });
//! ```

use crate::auth::notice::Notice;
use crate::error::FirebaseError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::VecDeque;
use tracing::{debug, error, info, warn};

/// Breadcrumbs kept before the oldest is dropped
pub const MAX_BREADCRUMBS: usize = 64;

/// Error reported to the crash backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    /// Error type name
    pub name: String,
    /// Error message
    pub message: String,
}

impl ReportedError {
    /// Error named `name` with `message`
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<&FirebaseError> for ReportedError {
    fn from(err: &FirebaseError) -> Self {
        let name = match err {
            FirebaseError::Auth(_) => "AuthError",
            FirebaseError::PhoneAuth(_) => "PhoneAuthError",
            FirebaseError::Network(_) => "NetworkError",
            FirebaseError::Config(_) | FirebaseError::ApiKeyNotConfigured => "ConfigError",
            FirebaseError::Internal(_) => "FirebaseError",
        };
        Self::new(name, err.to_string())
    }
}

/// Timestamped log line attached to future crash reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    /// Message text
    pub message: String,
    /// When it was logged
    pub logged_at: DateTime<Utc>,
}

/// Non-fatal error captured by the reporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// The error
    pub error: ReportedError,
    /// Optional grouping category
    pub category: Option<String>,
    /// When it was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Crash-reporting backend
#[allow(async_fn_in_trait)]
pub trait CrashReporter {
    /// Whether crash and error collection is on
    fn is_collection_enabled(&self) -> bool;

    /// Turn collection on or off
    async fn set_collection_enabled(&mut self, enabled: bool) -> Result<(), FirebaseError>;

    /// Add a breadcrumb
    fn log(&mut self, message: &str);

    /// Record a non-fatal error
    fn record_error(&mut self, error: ReportedError, category: Option<&str>);

    /// Terminate the process immediately
    fn crash(&mut self) -> !;
}

/// In-process crash reporter backed by `tracing`
#[derive(Debug, Clone)]
pub struct Crashlytics {
    collection_enabled: bool,
    breadcrumbs: VecDeque<Breadcrumb>,
    recorded: Vec<ErrorRecord>,
}

impl Default for Crashlytics {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Crashlytics {
    /// Reporter with collection initially on or off
    pub fn new(collection_enabled: bool) -> Self {
        Self {
            collection_enabled,
            breadcrumbs: VecDeque::with_capacity(MAX_BREADCRUMBS),
            recorded: Vec::new(),
        }
    }

    /// Breadcrumbs, oldest first
    pub fn breadcrumbs(&self) -> impl Iterator<Item = &Breadcrumb> {
        self.breadcrumbs.iter()
    }

    /// Non-fatal errors recorded while collection was on
    pub fn recorded_errors(&self) -> &[ErrorRecord] {
        &self.recorded
    }
}

impl CrashReporter for Crashlytics {
    fn is_collection_enabled(&self) -> bool {
        self.collection_enabled
    }

    async fn set_collection_enabled(&mut self, enabled: bool) -> Result<(), FirebaseError> {
        self.collection_enabled = enabled;
        info!(enabled, "crash collection updated");
        Ok(())
    }

    fn log(&mut self, message: &str) {
        if self.breadcrumbs.len() == MAX_BREADCRUMBS {
            self.breadcrumbs.pop_front();
        }
        self.breadcrumbs.push_back(Breadcrumb {
            message: message.to_string(),
            logged_at: Utc::now(),
        });
        debug!(message, "breadcrumb");
    }

    fn record_error(&mut self, error: ReportedError, category: Option<&str>) {
        if !self.collection_enabled {
            debug!(name = %error.name, "collection disabled, dropping error");
            return;
        }

        warn!(name = %error.name, message = %error.message, category, "non-fatal error recorded");
        self.recorded.push(ErrorRecord {
            error,
            category: category.map(str::to_string),
            recorded_at: Utc::now(),
        });
    }

    fn crash(&mut self) -> ! {
        error!(
            breadcrumbs = self.breadcrumbs.len(),
            recorded = self.recorded.len(),
            "forced crash"
        );
        std::process::abort()
    }
}

/// Controller for the crash-testing screen
#[derive(Debug)]
pub struct CrashlyticsPanel<R: CrashReporter> {
    reporter: R,
    enabled: bool,
}

impl<R: CrashReporter> CrashlyticsPanel<R> {
    /// Panel reading the reporter's current collection flag
    pub fn new(reporter: R) -> Self {
        let enabled = reporter.is_collection_enabled();
        Self { reporter, enabled }
    }

    /// Underlying reporter
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Collection flag as last read from the reporter
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Status line, e.g. "Crashlytics is enabled"
    pub fn status(&self) -> String {
        format!("Crashlytics is {}", on_off(self.enabled))
    }

    /// Flip collection, re-read the flag and leave a timestamped breadcrumb
    pub async fn toggle(&mut self) -> Result<Notice, Notice> {
        let requested = !self.enabled;

        if let Err(err) = self.reporter.set_collection_enabled(requested).await {
            error!(error = %err, "failed to toggle crash collection");
            return Err(Notice::error("Failed to toggle Crashlytics"));
        }

        self.enabled = self.reporter.is_collection_enabled();
        self.reporter.log(&format!(
            "Crashlytics {} at {}",
            on_off(requested),
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ));

        Ok(Notice::success(format!("Crashlytics {}", on_off(requested))))
    }

    /// Record two non-fatal errors around a breadcrumb
    pub fn log_non_fatal_error(&mut self) -> Notice {
        self.reporter.record_error(
            ReportedError::new("NonFatalTestError", "This is a non-fatal error for testing"),
            Some("NonFatalError"),
        );
        self.reporter.log("Non-fatal error logged successfully");
        self.reporter.record_error(
            ReportedError::new("SecondTestError", "Second non-fatal error for testing"),
            Some("SecondError"),
        );

        Notice::success("Multiple non-fatal errors logged to Crashlytics")
    }

    /// Record one network, one validation and one database error
    pub fn log_various_errors(&mut self) -> Notice {
        let samples = [
            ("NetworkError", "Failed to fetch data from API"),
            ("ValidationError", "Invalid user input data"),
            ("DatabaseError", "Database connection failed"),
        ];
        for (name, message) in samples {
            self.reporter.record_error(ReportedError::new(name, message), Some(name));
        }
        self.reporter.log("Multiple error types logged for testing");

        Notice::success("Various error types logged to Crashlytics")
    }

    /// Crash immediately after a breadcrumb
    pub fn test_crash(&mut self) -> ! {
        self.reporter.log("About to crash the app for testing");
        self.reporter.crash()
    }

    /// Record a test error with context breadcrumbs, then crash
    pub fn trigger_error_and_crash(&mut self) -> ! {
        self.reporter.log("Starting error simulation process");
        self.reporter.log(&format!(
            "User triggered error at: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        self.reporter.record_error(
            ReportedError::new(
                "TestCrashlyticsError",
                "User triggered test error for Crashlytics testing",
            ),
            Some("TestError"),
        );
        self.reporter.crash()
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}
