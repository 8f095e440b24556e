//! Access-token session issued by the newsroom identity provider.
//!
//! Signing in happens elsewhere; newsdesk only stores the resulting token and
//! decides from it whether views may fetch.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NewsdeskError, NewsdeskResult};

/// Environment variable that takes precedence over the session file.
pub const ACCESS_TOKEN_ENV: &str = "NEWSDESK_ACCESS_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Loading,
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// What the authentication collaborator reports: a status and, once
/// authenticated, the session carrying the access token.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub status: SessionStatus,
    pub session: Option<Session>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Session {
            access_token: access_token.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    fn load(path: &Path) -> NewsdeskResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)?;
        let session: Session = toml::from_str(&contents).map_err(|e| {
            NewsdeskError::Session(format!(
                "Failed to parse session from {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(session))
    }

    pub fn save(&self, path: &Path) -> NewsdeskResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| NewsdeskError::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        // Owner-only from the moment it exists, the file holds a bearer token
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path)?;

        // mode() only applies on create, tighten a file left by an older save
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(contents.as_bytes())?;

        Ok(())
    }

    /// Remove a stored session. Returns false if there was none.
    pub fn remove(path: &Path) -> NewsdeskResult<bool> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }
}

impl SessionState {
    pub fn unauthenticated() -> Self {
        SessionState {
            status: SessionStatus::Unauthenticated,
            session: None,
        }
    }

    pub fn authenticated(session: Session) -> Self {
        SessionState {
            status: SessionStatus::Authenticated,
            session: Some(session),
        }
    }

    /// Resolve the session from the environment or the session file.
    pub fn load(path: &Path) -> NewsdeskResult<Self> {
        let from_env = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty());

        Self::resolve(from_env, path)
    }

    fn resolve(env_token: Option<String>, path: &Path) -> NewsdeskResult<Self> {
        if let Some(token) = env_token {
            return Ok(Self::authenticated(Session::new(token, None)));
        }

        match Session::load(path)? {
            Some(session) if !session.is_expired() && !session.access_token.is_empty() => {
                Ok(Self::authenticated(session))
            }
            Some(_) => {
                tracing::debug!(path = %path.display(), "stored session expired");
                Ok(Self::unauthenticated())
            }
            None => Ok(Self::unauthenticated()),
        }
    }

    /// The access token, only while authenticated and not yet expired.
    ///
    /// Expiry is checked on every call since a long-running view outlives
    /// the moment the session was loaded.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token_at(Utc::now())
    }

    fn access_token_at(&self, now: DateTime<Utc>) -> Option<&str> {
        match self.status {
            SessionStatus::Authenticated => self
                .session
                .as_ref()
                .filter(|s| !s.is_expired_at(now))
                .map(|s| s.access_token.as_str()),
            SessionStatus::Loading | SessionStatus::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn missing_file_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let state = SessionState::resolve(None, &dir.path().join("session.toml")).unwrap();

        assert_eq!(state.status, SessionStatus::Unauthenticated);
        assert_eq!(state.access_token(), None);
    }

    #[test]
    fn saved_session_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("session.toml");

        let session = Session::new("token-abc", Some(Utc::now() + Duration::hours(1)));
        session.save(&path).unwrap();

        let state = SessionState::resolve(None, &path).unwrap();
        assert_eq!(state.status, SessionStatus::Authenticated);
        assert_eq!(state.access_token(), Some("token-abc"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn expired_session_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");

        Session::new("old", Some(Utc::now() - Duration::minutes(1)))
            .save(&path)
            .unwrap();

        let state = SessionState::resolve(None, &path).unwrap();
        assert!(!state.is_authenticated());
    }

    #[test]
    fn token_stops_once_session_expires() {
        let expires_at = Utc::now() + Duration::hours(8);
        let state = SessionState::authenticated(Session::new("t", Some(expires_at)));

        assert_eq!(state.access_token_at(expires_at - Duration::minutes(1)), Some("t"));
        assert_eq!(state.access_token_at(expires_at), None);
        assert_eq!(state.access_token_at(expires_at + Duration::hours(1)), None);
    }

    #[test]
    fn authenticated_but_expired_is_not_authenticated() {
        let state = SessionState::authenticated(Session::new(
            "t",
            Some(Utc::now() - Duration::minutes(1)),
        ));

        assert_eq!(state.status, SessionStatus::Authenticated);
        assert_eq!(state.access_token(), None);
        assert!(!state.is_authenticated());
    }

    #[cfg(unix)]
    #[test]
    fn save_tightens_existing_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "stale").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        Session::new("fresh", None).save(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(std::fs::read_to_string(&path).unwrap().contains("fresh"));
    }

    #[test]
    fn env_token_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let state =
            SessionState::resolve(Some("env-token".to_string()), &dir.path().join("none")).unwrap();

        assert_eq!(state.access_token(), Some("env-token"));
    }

    #[test]
    fn loading_has_no_token() {
        let state = SessionState {
            status: SessionStatus::Loading,
            session: Some(Session::new("t", None)),
        };
        assert_eq!(state.access_token(), None);
    }

    #[test]
    fn remove_reports_whether_a_session_existed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");

        assert!(!Session::remove(&path).unwrap());
        Session::new("t", None).save(&path).unwrap();
        assert!(Session::remove(&path).unwrap());
        assert!(!path.exists());
    }
}
