//! Login state and navigation as an explicit state machine.
//!
//! A [`Session`] value never changes in place: each action returns the next
//! state, and a rejected action leaves the caller holding the old one.

use crate::auth::CredentialVerifier;
use crate::error::{InsightsError, Result};

/// Login state of the single dashboard user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    /// No account selected
    #[default]
    LoggedOut,
    /// Authenticated for one account
    LoggedIn {
        /// Account the user logged in as
        account: String,
    },
}

/// What the dashboard shows for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View<'a> {
    /// Account picker and password form
    Login,
    /// Insight for the selected account
    Details(&'a str),
}

impl Session {
    /// Submit the login form.
    ///
    /// Succeeds only from `LoggedOut` with accepted credentials.
    pub fn submit(
        &self,
        name: &str,
        password: &str,
        verifier: &dyn CredentialVerifier,
    ) -> Result<Self> {
        match self {
            Self::LoggedIn { account } => Err(InsightsError::InvalidTransition(format!(
                "already logged in as {account}"
            ))),
            Self::LoggedOut if verifier.verify(name, password) => Ok(Self::LoggedIn {
                account: name.to_string(),
            }),
            Self::LoggedOut => Err(InsightsError::AuthenticationFailed),
        }
    }

    /// Log out from any state
    #[must_use]
    pub const fn logout(&self) -> Self {
        Self::LoggedOut
    }

    /// Current view
    #[must_use]
    pub fn view(&self) -> View<'_> {
        match self {
            Self::LoggedOut => View::Login,
            Self::LoggedIn { account } => View::Details(account),
        }
    }

    /// Selected account, if logged in
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        match self {
            Self::LoggedOut => None,
            Self::LoggedIn { account } => Some(account),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DerivedPasswordVerifier;

    #[test]
    fn test_login_with_valid_credentials() {
        let session = Session::default();
        let next = session
            .submit("Acme", "acm@123", &DerivedPasswordVerifier)
            .expect("login should succeed");
        assert_eq!(next.view(), View::Details("Acme"));
        assert_eq!(next.account(), Some("Acme"));
    }

    #[test]
    fn test_rejected_login_keeps_logged_out() {
        let session = Session::default();
        let err = session.submit("Acme", "nope", &DerivedPasswordVerifier);
        assert!(matches!(err, Err(InsightsError::AuthenticationFailed)));
        assert_eq!(session.view(), View::Login);
    }

    #[test]
    fn test_submit_while_logged_in_is_invalid() {
        let session = Session::LoggedIn {
            account: "Acme".to_string(),
        };
        let err = session.submit("Globex", "glo@123", &DerivedPasswordVerifier);
        assert!(matches!(err, Err(InsightsError::InvalidTransition(_))));
    }

    #[test]
    fn test_logout_clears_account() {
        let session = Session::LoggedIn {
            account: "Acme".to_string(),
        };
        let next = session.logout();
        assert_eq!(next, Session::LoggedOut);
        assert_eq!(next.account(), None);
        assert_eq!(Session::LoggedOut.logout(), Session::LoggedOut);
    }
}
