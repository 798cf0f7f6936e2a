//! Authenticated session lifecycle and account form validation.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::validation::ValidationErrors;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Identifier wrapper for user accounts (employers and employees alike).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Employer,
    Employee,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Employer => "employer",
            UserRole::Employee => "employee",
        }
    }

    pub const fn dashboard_path(self) -> &'static str {
        match self {
            UserRole::Employer => "/employer/dashboard",
            UserRole::Employee => "/employee/dashboard",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub user_type: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Opaque bearer token issued by the API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: AuthToken,
}

impl Session {
    pub fn role(&self) -> UserRole {
        self.user.user_type
    }
}

/// Explicit session state owned by the workflow manager.
#[derive(Debug, Clone, Default)]
pub enum SessionContext {
    #[default]
    Anonymous,
    Authenticated(Session),
}

impl SessionContext {
    pub fn login(&mut self, session: Session) {
        info!(user_id = %session.user.id, role = %session.role(), "session started");
        *self = SessionContext::Authenticated(session);
    }

    /// Drop the session. Returns the user that was signed in, if any.
    pub fn logout(&mut self) -> Option<User> {
        match std::mem::take(self) {
            SessionContext::Authenticated(session) => {
                info!(user_id = %session.user.id, "session ended");
                Some(session.user)
            }
            SessionContext::Anonymous => None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionContext::Authenticated(session) => Some(session),
            SessionContext::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    pub fn role(&self) -> Option<UserRole> {
        self.session().map(Session::role)
    }

    /// Where a signed-in user lands; anonymous users go to the login screen.
    pub fn landing_path(&self) -> &'static str {
        self.role().map_or("/login", UserRole::dashboard_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.email.trim().is_empty() {
            errors.push("email", "Email is required");
        }
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }
        errors.into_result()
    }
}

/// Registration form as typed by the user, including the confirmation field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub role: UserRole,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("static email pattern compiles"))
}

impl Registration {
    /// Collects every field error rather than stopping at the first.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.email.is_empty() {
            errors.push("email", "Email is required");
        } else if !email_pattern().is_match(&self.email) {
            errors.push("email", "Email is invalid");
        }

        if self.password.is_empty() {
            errors.push("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push("password", "Password must be at least 6 characters");
        }

        if self.password != self.confirm_password {
            errors.push("confirm_password", "Passwords do not match");
        }

        if self.name.trim().is_empty() {
            errors.push("name", "Name is required");
        }

        errors.into_result()
    }
}
