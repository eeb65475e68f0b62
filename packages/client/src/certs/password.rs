//! Password callbacks
//!
//! Callbacks are synchronous; the engine blocks until they answer.

use zeroize::Zeroizing;

use crate::config::PasswordMode;

/// A password that is wiped from memory when dropped.
pub type Password = Zeroizing<String>;

/// Source of passwords for decrypting and encrypting key material.
pub trait PasswordCallback {
    /// Password for decrypting `resource`; `None` means not available.
    fn query_password(&self, resource: &str) -> Option<Password>;

    /// Fresh password for encrypting `resource` on export.
    fn query_new_password(&self, resource: &str) -> Option<Password>;

    /// Re-query after a previously returned password failed.
    fn password_required(&self, resource: &str) -> Option<Password>;
}

/// Never answers a password query.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPassword;

impl PasswordCallback for NoPassword {
    fn query_password(&self, _resource: &str) -> Option<Password> {
        None
    }

    fn query_new_password(&self, _resource: &str) -> Option<Password> {
        None
    }

    fn password_required(&self, _resource: &str) -> Option<Password> {
        None
    }
}

/// Answers every query with the same password.
///
/// A re-query after a failed attempt yields `None`, the password is known to
/// be wrong at that point.
#[derive(Clone)]
pub struct FixedPassword {
    password: Password,
}

impl FixedPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
        }
    }
}

impl std::fmt::Debug for FixedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedPassword").finish_non_exhaustive()
    }
}

impl PasswordCallback for FixedPassword {
    fn query_password(&self, _resource: &str) -> Option<Password> {
        Some(self.password.clone())
    }

    fn query_new_password(&self, _resource: &str) -> Option<Password> {
        Some(self.password.clone())
    }

    fn password_required(&self, _resource: &str) -> Option<Password> {
        None
    }
}

/// Select the callback to use for a configured password mode.
#[must_use]
pub fn select_callback<'a>(mode: PasswordMode, callback: &'a dyn PasswordCallback) -> &'a dyn PasswordCallback {
    static NO_PASSWORD: NoPassword = NoPassword;

    match mode {
        PasswordMode::None => &NO_PASSWORD,
        PasswordMode::Callback => callback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_password() {
        assert!(NoPassword.query_password("key.pem").is_none());
        assert!(NoPassword.query_new_password("key.pem").is_none());
    }

    #[test]
    fn test_fixed_password() {
        let callback = FixedPassword::new("secret");

        assert_eq!(callback.query_password("key.pem").as_deref().map(String::as_str), Some("secret"));
        assert!(callback.password_required("key.pem").is_none());
        assert!(!format!("{callback:?}").contains("secret"));
    }

    #[test]
    fn test_select_callback() {
        let fixed = FixedPassword::new("secret");

        assert!(select_callback(PasswordMode::None, &fixed).query_password("x").is_none());
        assert!(select_callback(PasswordMode::Callback, &fixed).query_password("x").is_some());
    }
}
