pub mod drive;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("credentials: {0}")]
    Credentials(String),
    #[error("drive api: {0}")]
    Api(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
}

/// Serialized OAuth credentials, stored as JSON where the original
/// deployment kept a pickle file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Treats a token expiring within the next minute as already
    /// expired, so an in-flight upload does not race the deadline.
    pub fn is_expired(&self) -> bool {
        matches!(self.expiry, Some(t) if t <= Utc::now() + Duration::seconds(60))
    }
}

/// Injected credential persistence, so the Drive boundary is testable
/// with a fake instead of a real token file.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<CachedToken, UploadError>;
    fn store(&self, token: &CachedToken) -> Result<(), UploadError>;
}

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialStore for FileTokenStore {
    fn load(&self) -> Result<CachedToken, UploadError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            UploadError::Credentials(format!(
                "token cache {} unreadable ({e}); provision it before enabling uploads",
                self.path.display()
            ))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| UploadError::Credentials(format!("token cache is not valid JSON: {e}")))
    }

    fn store(&self, token: &CachedToken) -> Result<(), UploadError> {
        let raw = serde_json::to_string_pretty(token)
            .map_err(|e| UploadError::Credentials(format!("token serialization failed: {e}")))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expiry: Option<DateTime<Utc>>) -> CachedToken {
        CachedToken {
            access_token: "at".into(),
            refresh_token: Some("rt".into()),
            client_id: "id".into(),
            client_secret: "secret".into(),
            expiry,
        }
    }

    #[test]
    fn token_without_expiry_is_not_expired() {
        assert!(!token(None).is_expired());
    }

    #[test]
    fn token_past_its_deadline_is_expired() {
        assert!(token(Some(Utc::now() - Duration::hours(1))).is_expired());
        assert!(!token(Some(Utc::now() + Duration::hours(1))).is_expired());
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        let t = token(Some(Utc::now() + Duration::hours(1)));
        store.store(&t).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.access_token, t.access_token);
        assert_eq!(loaded.refresh_token, t.refresh_token);
    }

    #[test]
    fn missing_file_is_a_credentials_error() {
        let store = FileTokenStore::new(PathBuf::from("/nonexistent/token.json"));
        assert!(matches!(
            store.load(),
            Err(UploadError::Credentials(_))
        ));
    }
}
