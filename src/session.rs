use crate::holidaze::model::Profile;
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("You are not logged in. Please log in to continue.")]
    NotSignedIn,
}

/// A logged in user together with the token that authorizes their requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    user: Profile,
    access_token: String,
}

impl Session {
    pub fn new(user: Profile, access_token: String) -> Self {
        Self { user, access_token }
    }

    pub fn user(&self) -> &Profile {
        &self.user
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

// Keeps the token out of logs
impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user.name)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Holds the current session, if any. Populated by [`SessionContext::sign_in`] and emptied
/// by [`SessionContext::sign_out`].
#[derive(Debug, Default)]
pub struct SessionContext {
    current: Option<Session>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session it replaced.
    pub fn sign_in(&mut self, session: Session) -> Option<Session> {
        info!("Signed in as '{}'", session.user.name);

        self.current.replace(session)
    }

    pub fn sign_out(&mut self) -> Option<Session> {
        let previous = self.current.take();

        if let Some(session) = &previous {
            info!("Signed out '{}'", session.user.name);
        }

        previous
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn require(&self) -> Result<&Session, SessionError> {
        self.current.as_ref().ok_or(SessionError::NotSignedIn)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.current.as_ref().map(Session::access_token)
    }

    pub fn is_venue_manager(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|session| session.user.venue_manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(name: &str, token: &str) -> Session {
        Session::new(
            Profile {
                name: name.to_string(),
                email: format!("{name}@stud.noroff.no"),
                bio: None,
                avatar: None,
                venue_manager: false,
            },
            token.to_string(),
        )
    }

    #[test_log::test]
    fn should_start_signed_out() {
        let context = SessionContext::new();

        assert!(!context.is_signed_in());
        assert_eq!(context.access_token(), None);
        assert_eq!(context.require(), Err(SessionError::NotSignedIn));
    }

    #[test_log::test]
    fn should_hold_session_until_sign_out() {
        let mut context = SessionContext::new();

        assert_eq!(context.sign_in(session("first", "token-1")), None);
        assert_eq!(context.access_token(), Some("token-1"));

        let replaced = context.sign_in(session("second", "token-2"));
        assert_eq!(replaced.map(|s| s.user().name.clone()), Some("first".to_string()));
        assert_eq!(context.require().map(|s| s.access_token()), Ok("token-2"));

        let signed_out = context.sign_out();
        assert!(signed_out.is_some());
        assert!(context.current().is_none());
        assert!(context.sign_out().is_none());
    }

    #[test_log::test]
    fn debug_output_should_not_leak_the_token() {
        let output = format!("{:?}", session("guest", "secret-token"));

        assert!(!output.contains("secret-token"), "{output}");
        assert!(output.contains("guest"));
    }
}
