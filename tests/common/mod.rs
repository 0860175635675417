#![allow(dead_code)]

use async_trait::async_trait;
use drive_knowledge_base::document::{FOLDER_MIME, SHORTCUT_MIME};
use drive_knowledge_base::drive::{DriveApi, DriveError, DriveFile, FilePage, ShortcutDetails};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory drive. Folders map to their children; listings are split into
/// pages of `page_size` entries.
#[derive(Default)]
pub struct FakeDrive {
    pub files: HashMap<String, DriveFile>,
    pub children: HashMap<String, Vec<String>>,
    pub contents: HashMap<String, Vec<u8>>,
    pub denied: HashSet<String>,
    pub throttled: HashSet<String>,
    /// Export formats the fake refuses with a server error.
    pub failing_exports: HashSet<String>,
    /// `(file id, mime type)` of every export call, in call order.
    pub exports: Mutex<Vec<(String, String)>>,
    pub unauthorized: bool,
    pub page_size: usize,
    pub repeat_page_token: bool,
    pub list_calls: AtomicUsize,
}

impl FakeDrive {
    pub fn new() -> Self {
        let mut drive = Self {
            page_size: 100,
            ..Default::default()
        };
        drive.files.insert(
            "root".to_string(),
            file("root", "My Drive", FOLDER_MIME),
        );
        drive.children.insert("root".to_string(), Vec::new());
        drive
    }

    pub fn add_folder(&mut self, parent: &str, id: &str, name: &str) -> &mut Self {
        self.insert(parent, file(id, name, FOLDER_MIME));
        self.children.entry(id.to_string()).or_default();
        self
    }

    pub fn add_file(&mut self, parent: &str, id: &str, name: &str, mime_type: &str, content: &[u8]) -> &mut Self {
        self.insert(parent, file(id, name, mime_type));
        self.contents.insert(id.to_string(), content.to_vec());
        self
    }

    pub fn add_shortcut(&mut self, parent: &str, id: &str, name: &str, target_id: &str) -> &mut Self {
        let target_mime = self
            .files
            .get(target_id)
            .map(|f| f.mime_type.clone())
            .unwrap_or_default();
        let mut shortcut = file(id, name, SHORTCUT_MIME);
        shortcut.shortcut_details = Some(ShortcutDetails {
            target_id: target_id.to_string(),
            target_mime_type: target_mime,
        });
        self.insert(parent, shortcut);
        self
    }

    pub fn deny(&mut self, id: &str) -> &mut Self {
        self.denied.insert(id.to_string());
        self
    }

    pub fn throttle(&mut self, id: &str) -> &mut Self {
        self.throttled.insert(id.to_string());
        self
    }

    pub fn exported(&self) -> Vec<(String, String)> {
        self.exports.lock().unwrap().clone()
    }

    fn insert(&mut self, parent: &str, mut file: DriveFile) {
        file.parents = vec![parent.to_string()];
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(file.id.clone());
        self.files.insert(file.id.clone(), file);
    }

    fn check(&self, id: &str) -> Result<(), DriveError> {
        if self.unauthorized {
            return Err(DriveError::Unauthorized("token expired".to_string()));
        }
        if self.denied.contains(id) {
            return Err(DriveError::AccessDenied(format!("no access to {}", id)));
        }
        if self.throttled.contains(id) {
            return Err(DriveError::RateLimited("User rate limit exceeded".to_string()));
        }
        Ok(())
    }
}

pub fn file(id: &str, name: &str, mime_type: &str) -> DriveFile {
    DriveFile {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        web_view_link: Some(format!("https://drive.google.com/file/d/{}/view", id)),
        ..Default::default()
    }
}

#[async_trait]
impl DriveApi for FakeDrive {
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<FilePage, DriveError> {
        self.check(folder_id)?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let ids = self
            .children
            .get(folder_id)
            .ok_or_else(|| DriveError::NotFound(folder_id.to_string()))?;

        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(ids.len());
        let files = ids[start..end]
            .iter()
            .map(|id| self.files[id].clone())
            .collect();
        let next_page_token = if self.repeat_page_token {
            Some("0".to_string())
        } else if end < ids.len() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(FilePage {
            files,
            next_page_token,
        })
    }

    async fn get_file(&self, file_id: &str) -> Result<DriveFile, DriveError> {
        self.check(file_id)?;
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, DriveError> {
        self.exports
            .lock()
            .unwrap()
            .push((file_id.to_string(), mime_type.to_string()));
        if self.failing_exports.contains(mime_type) {
            return Err(DriveError::Http {
                status: 500,
                message: format!("export to {} failed", mime_type),
            });
        }
        self.download(file_id).await
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        self.check(file_id)?;
        self.contents
            .get(file_id)
            .cloned()
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))
    }
}
