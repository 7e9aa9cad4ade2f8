use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::{CredentialStore, UploadError};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&fields=id,name,webViewLink";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const BOUNDARY: &str = "certo_upload_boundary";

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "webViewLink", default)]
    pub web_view_link: Option<String>,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<UploadedFile>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Best-effort secondary write to a Google Drive folder. Every operation
/// returns a `Result`; the caller decides to log-and-continue, so a
/// Drive outage never affects the certificate download itself.
pub struct DriveClient {
    client: Client,
    folder_name: String,
    store: Arc<dyn CredentialStore>,
}

impl DriveClient {
    pub fn new(folder_name: String, store: Arc<dyn CredentialStore>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            folder_name,
            store,
        }
    }

    /// Uploads the PNG under `filename` into the configured folder and
    /// returns the remote id plus view link.
    pub async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<UploadedFile, UploadError> {
        let token = self.access_token().await?;
        let folder_id = self.find_or_create_folder(&token).await?;

        let metadata = serde_json::json!({
            "name": filename,
            "parents": [folder_id],
        });

        // Drive's multipart upload wants multipart/related: one JSON
        // metadata part, one media part.
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
                 --{BOUNDARY}\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--").as_bytes());

        let response = self
            .client
            .post(UPLOAD_URL)
            .bearer_auth(&token)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(UploadError::Api(format!("upload failed ({status}): {text}")));
        }

        let file: UploadedFile = serde_json::from_str(&text)
            .map_err(|e| UploadError::Api(format!("unexpected upload response: {e}")))?;
        info!(id = %file.id, "certificate uploaded to Drive");
        Ok(file)
    }

    /// Returns a valid access token, refreshing and re-persisting the
    /// cached one when it has expired. The interactive consent flow is
    /// out of scope; without a refresh token the operator has to
    /// re-provision the cache.
    async fn access_token(&self) -> Result<String, UploadError> {
        let mut token = self.store.load()?;
        if !token.is_expired() {
            return Ok(token.access_token);
        }

        let refresh = token.refresh_token.clone().ok_or_else(|| {
            UploadError::Credentials(
                "cached token expired and holds no refresh token; re-provision the token cache"
                    .to_string(),
            )
        })?;

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", token.client_id.as_str()),
                ("client_secret", token.client_secret.as_str()),
                ("refresh_token", refresh.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(UploadError::Credentials(format!(
                "token refresh failed ({status}): {text}"
            )));
        }

        let parsed: RefreshResponse = serde_json::from_str(&text)
            .map_err(|e| UploadError::Credentials(format!("unexpected token response: {e}")))?;

        token.access_token = parsed.access_token.clone();
        token.expiry = parsed
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        self.store.store(&token)?;

        Ok(parsed.access_token)
    }

    /// Looks the destination folder up by name, creating it on first
    /// use, and returns its id.
    async fn find_or_create_folder(&self, token: &str) -> Result<String, UploadError> {
        let query = format!(
            "name='{}' and mimeType='{FOLDER_MIME}' and trashed=false",
            self.folder_name
        );
        let response = self
            .client
            .get(FILES_URL)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name)"),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(UploadError::Api(format!(
                "folder lookup failed ({status}): {text}"
            )));
        }

        let list: FileList = serde_json::from_str(&text)
            .map_err(|e| UploadError::Api(format!("unexpected folder listing: {e}")))?;
        if let Some(folder) = list.files.into_iter().next() {
            info!(folder = %self.folder_name, "using existing Drive folder");
            return Ok(folder.id);
        }

        let response = self
            .client
            .post(FILES_URL)
            .bearer_auth(token)
            .query(&[("fields", "id")])
            .json(&serde_json::json!({
                "name": self.folder_name,
                "mimeType": FOLDER_MIME,
            }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(UploadError::Api(format!(
                "folder creation failed ({status}): {text}"
            )));
        }

        #[derive(Deserialize)]
        struct Created {
            id: String,
        }
        let created: Created = serde_json::from_str(&text)
            .map_err(|e| UploadError::Api(format!("unexpected folder response: {e}")))?;
        info!(folder = %self.folder_name, "created Drive folder");
        Ok(created.id)
    }
}
