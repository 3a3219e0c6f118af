//! wiki::identity
//!
//! The acting identity ("doer") a mutation is attributed to.

/// Supplies commit attribution for the user performing a mutation.
pub trait ActingIdentity {
    /// Name recorded as author and committer.
    fn display_name(&self) -> String;

    /// Email recorded as author and committer.
    fn email(&self) -> &str;
}

/// A minimal user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Login name
    pub name: String,
    /// Optional full name; preferred for display when non-empty
    pub full_name: Option<String>,
    pub email: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_name: None,
            email: email.into(),
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }
}

impl ActingIdentity for User {
    fn display_name(&self) -> String {
        match self.full_name.as_deref().map(str::trim) {
            Some(full) if !full.is_empty() => full.to_string(),
            _ => self.name.clone(),
        }
    }

    fn email(&self) -> &str {
        &self.email
    }
}
