//! Shared-secret admin gate and the persisted "logged in" marker.

use std::fs;
use std::io;
use std::path::PathBuf;

use log::{info, warn};
use thiserror::Error;

/// Contents of the marker file for an authenticated session.
const AUTHENTICATED: &str = "true";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid observation credentials.")]
    InvalidCredentials,

    #[error("Could not update the session file: {0}")]
    Persist(#[from] io::Error),
}

/// Compares login attempts against the configured admin secret.
#[derive(Debug, Clone)]
pub struct AdminGate {
    secret: String,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn check(&self, attempt: &str) -> Result<(), AuthError> {
        if attempt == self.secret {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Whether the admin console is unlocked on this machine. Loaded once at
/// startup from the marker file; only [`Session::login`] and
/// [`Session::logout`] change it afterwards.
#[derive(Debug)]
pub struct Session {
    marker: PathBuf,
    authenticated: bool,
}

impl Session {
    pub fn load(marker: PathBuf) -> Self {
        let authenticated = match fs::read_to_string(&marker) {
            Ok(contents) => contents.trim() == AUTHENTICATED,
            Err(err) if err.kind() == io::ErrorKind::NotFound => false,
            Err(err) => {
                warn!("Could not read session file {}: {err}", marker.display());
                false
            }
        };
        if authenticated {
            info!("Resuming admin session from {}", marker.display());
        }
        Self {
            marker,
            authenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn login(&mut self, gate: &AdminGate, attempt: &str) -> Result<(), AuthError> {
        gate.check(attempt)?;
        if let Some(parent) = self.marker.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.marker, AUTHENTICATED)?;
        self.authenticated = true;
        info!("Admin session started");
        Ok(())
    }

    /// End the session. The in-memory flag is cleared even when the marker
    /// cannot be removed.
    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.authenticated = false;
        match fs::remove_file(&self.marker) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        info!("Admin session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn wrong_password_is_rejected_with_message() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::load(dir.path().join("admin_session"));
        let err = session
            .login(&AdminGate::new("admin123"), "letmein")
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid observation credentials.");
        assert!(!session.is_authenticated());
        assert!(!dir.path().join("admin_session").exists());
    }

    #[test]
    fn login_survives_restart_until_logout() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("nested").join("admin_session");
        let gate = AdminGate::new("s3cret");

        let mut session = Session::load(marker.clone());
        assert!(!session.is_authenticated());
        session.login(&gate, "s3cret").unwrap();

        let mut restored = Session::load(marker.clone());
        assert!(restored.is_authenticated());

        restored.logout().unwrap();
        assert!(!restored.is_authenticated());
        assert!(!Session::load(marker).is_authenticated());
    }

    #[test]
    fn logout_without_marker_is_fine() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::load(dir.path().join("admin_session"));
        assert!(session.logout().is_ok());
    }

    #[test]
    fn unexpected_marker_contents_do_not_authenticate() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("admin_session");
        fs::write(&marker, "false").unwrap();
        assert!(!Session::load(marker).is_authenticated());
    }
}
