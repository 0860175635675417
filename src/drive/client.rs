use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DriveConfig;
use crate::document::{FileDescriptor, FOLDER_MIME, SHORTCUT_MIME};
use crate::drive::auth::TokenProvider;
use crate::drive::error::DriveError;

const FILE_FIELDS: &str =
    "id,name,mimeType,createdTime,modifiedTime,webViewLink,parents,shortcutDetails";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutDetails {
    pub target_id: String,
    #[serde(default)]
    pub target_mime_type: String,
}

/// A file entry as returned by the Drive v3 API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub created_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    pub web_view_link: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    pub shortcut_details: Option<ShortcutDetails>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }

    pub fn is_shortcut(&self) -> bool {
        self.mime_type == SHORTCUT_MIME
    }

    pub fn into_descriptor(self, path: Vec<String>) -> FileDescriptor {
        FileDescriptor {
            id: self.id,
            name: self.name,
            mime_type: self.mime_type,
            path,
            created_time: self.created_time,
            modified_time: self.modified_time,
            web_view_link: self.web_view_link,
        }
    }
}

/// One page of a folder listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    pub next_page_token: Option<String>,
}

/// The subset of the Drive API the walker and builder depend on.
#[async_trait]
pub trait DriveApi: Send + Sync {
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<FilePage, DriveError>;

    async fn get_file(&self, file_id: &str) -> Result<DriveFile, DriveError>;

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, DriveError>;

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError>;
}

pub struct DriveClient {
    client: Client,
    api_base: String,
    page_size: u32,
    tokens: Arc<dyn TokenProvider>,
}

impl DriveClient {
    pub fn new(config: &DriveConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, DriveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            tokens,
        })
    }

    fn children_query(folder_id: &str) -> String {
        format!(
            "'{}' in parents and trashed = false",
            folder_id.replace('\\', "\\\\").replace('\'', "\\'")
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, DriveError> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(DriveError::from_response(status, message));
        }

        Ok(response)
    }
}

#[async_trait]
impl DriveApi for DriveClient {
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<FilePage, DriveError> {
        let fields = format!("nextPageToken,files({})", FILE_FIELDS);
        let page_size = self.page_size.to_string();
        let query = Self::children_query(folder_id);

        let mut params: Vec<(&str, &str)> = vec![
            ("q", query.as_str()),
            ("fields", fields.as_str()),
            ("pageSize", page_size.as_str()),
            ("orderBy", "name"),
            ("spaces", "drive"),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let request = self
            .client
            .get(format!("{}/files", self.api_base))
            .query(&params);

        let response = self.send(request).await?;
        response
            .json::<FilePage>()
            .await
            .map_err(|e| DriveError::Decode(e.to_string()))
    }

    async fn get_file(&self, file_id: &str) -> Result<DriveFile, DriveError> {
        let request = self
            .client
            .get(format!("{}/files/{}", self.api_base, file_id))
            .query(&[("fields", FILE_FIELDS), ("supportsAllDrives", "true")]);

        let response = self.send(request).await?;
        response
            .json::<DriveFile>()
            .await
            .map_err(|e| DriveError::Decode(e.to_string()))
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, DriveError> {
        let request = self
            .client
            .get(format!("{}/files/{}/export", self.api_base, file_id))
            .query(&[("mimeType", mime_type)]);

        let response = self.send(request).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        let request = self
            .client
            .get(format!("{}/files/{}", self.api_base, file_id))
            .query(&[("alt", "media"), ("supportsAllDrives", "true")]);

        let response = self.send(request).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
