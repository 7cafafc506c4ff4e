use std::collections::HashSet;
use std::sync::Arc;

use super::config::AuthConfig;
use super::jwt_auth::UserIdentity;

/// Decides whether a verified user may use the administrative endpoints.
pub trait AccessPolicy: Send + Sync {
    fn is_admin(&self, user: &UserIdentity) -> bool;
}

#[derive(Debug, Default)]
pub struct EmailAllowlist {
    emails: HashSet<String>,
}

impl EmailAllowlist {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|email| email.as_ref().trim().to_lowercase())
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }
}

impl AccessPolicy for EmailAllowlist {
    fn is_admin(&self, user: &UserIdentity) -> bool {
        self.emails.contains(&user.email.trim().to_lowercase())
    }
}

#[derive(Debug)]
pub struct RoleClaim {
    role: String,
}

impl RoleClaim {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

impl AccessPolicy for RoleClaim {
    fn is_admin(&self, user: &UserIdentity) -> bool {
        user.role.as_deref() == Some(self.role.as_str())
    }
}

/// Admits a user if any inner policy does.
#[derive(Default)]
pub struct AnyOf(Vec<Box<dyn AccessPolicy>>);

impl AnyOf {
    pub fn with(mut self, policy: impl AccessPolicy + 'static) -> Self {
        self.0.push(Box::new(policy));
        self
    }
}

impl AccessPolicy for AnyOf {
    fn is_admin(&self, user: &UserIdentity) -> bool {
        self.0.iter().any(|policy| policy.is_admin(user))
    }
}

pub fn policy_from_config(config: &AuthConfig) -> Arc<dyn AccessPolicy> {
    let mut policy = AnyOf::default().with(EmailAllowlist::new(&config.admin_emails));
    if let Some(role) = &config.admin_role {
        policy = policy.with(RoleClaim::new(role.clone()));
    }
    Arc::new(policy)
}
