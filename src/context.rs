//! # User Context
//!
//! The capability object carried with each report request.
//!
//! Consumed as already-authenticated input: token parsing and
//! caseload/role lookup happen upstream. Policy evaluation reads this
//! context and nothing else, so evaluation stays a pure function.

/// Identity and entitlements of the caller issuing a report request
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    /// Authenticated username
    pub username: String,

    /// Raw auth token, when one was presented
    pub auth_token: Option<String>,

    /// Roles held by the user
    pub roles: Vec<String>,

    /// The caseload the user is currently acting under
    pub active_caseload: Option<String>,

    /// All caseloads the user belongs to
    pub caseloads: Vec<String>,
}

impl UserContext {
    /// Create a context for a named user with no entitlements
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    /// Attach a raw auth token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Attach a role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Set the active caseload (also recorded in the caseload set)
    pub fn with_active_caseload(mut self, caseload: impl Into<String>) -> Self {
        let caseload = caseload.into();
        if !self.caseloads.contains(&caseload) {
            self.caseloads.push(caseload.clone());
        }
        self.active_caseload = Some(caseload);
        self
    }

    /// Add a caseload to the caseload set
    pub fn with_caseload(mut self, caseload: impl Into<String>) -> Self {
        self.caseloads.push(caseload.into());
        self
    }

    /// Returns true if the user holds the given role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns true if the user holds any role at all
    pub fn has_any_role(&self) -> bool {
        !self.roles.is_empty()
    }
}
