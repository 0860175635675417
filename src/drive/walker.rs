use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::document::{FileDescriptor, FOLDER_MIME};
use crate::drive::client::{DriveApi, DriveFile};
use crate::drive::error::DriveError;

/// Drive alias for the authenticated user's "My Drive".
pub const ROOT_ALIAS: &str = "root";

#[derive(Default)]
struct WalkState {
    visited_folders: HashSet<String>,
    emitted_files: HashSet<String>,
    descriptors: Vec<FileDescriptor>,
}

/// Enumerates every file reachable from a root folder, depth-first.
///
/// Children of a folder are visited in `(name, id)` order so that two walks
/// over an unchanged tree produce the same sequence.
pub struct FolderWalker {
    drive: Arc<dyn DriveApi>,
}

impl FolderWalker {
    pub fn new(drive: Arc<dyn DriveApi>) -> Self {
        Self { drive }
    }

    pub async fn walk(&self, root_id: Option<&str>) -> Result<Vec<FileDescriptor>, DriveError> {
        let root_id = root_id.unwrap_or(ROOT_ALIAS);
        let root = self.drive.get_file(root_id).await?;
        info!("Walking Drive folder '{}' ({})", root.name, root_id);

        let mut state = WalkState::default();
        state.visited_folders.insert(root_id.to_string());
        if root.id != root_id {
            state.visited_folders.insert(root.id.clone());
        }

        // Any failure listing the root itself is fatal.
        let children = self.list_all(root_id).await?;
        self.visit_children(children, vec![root.name], &mut state)
            .await?;

        info!("Found {} files", state.descriptors.len());
        Ok(state.descriptors)
    }

    async fn list_all(&self, folder_id: &str) -> Result<Vec<DriveFile>, DriveError> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens: HashSet<String> = HashSet::new();
        let mut pages = 0usize;

        loop {
            let page = self
                .drive
                .list_children(folder_id, page_token.as_deref())
                .await?;
            pages += 1;
            files.extend(page.files);

            match page.next_page_token {
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    return Err(DriveError::Pagination(format!(
                        "Listing of {} returned page token {} twice",
                        folder_id, next
                    )));
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!("Listed {} children of {} in {} page(s)", files.len(), folder_id, pages);
        files.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(files)
    }

    fn visit_children<'a>(
        &'a self,
        children: Vec<DriveFile>,
        path: Vec<String>,
        state: &'a mut WalkState,
    ) -> BoxFuture<'a, Result<(), DriveError>> {
        async move {
            for child in children {
                if child.is_folder() {
                    self.enter_folder(&child.id, &child.name, &path, state)
                        .await?;
                } else if child.is_shortcut() {
                    self.follow_shortcut(child, &path, state).await?;
                } else {
                    Self::emit(child, &path, state);
                }
            }
            Ok(())
        }
        .boxed()
    }

    async fn enter_folder(
        &self,
        folder_id: &str,
        name: &str,
        path: &[String],
        state: &mut WalkState,
    ) -> Result<(), DriveError> {
        if !state.visited_folders.insert(folder_id.to_string()) {
            debug!("Skipping already visited folder {} ({})", name, folder_id);
            return Ok(());
        }

        let children = match self.list_all(folder_id).await {
            Ok(children) => children,
            Err(e) if e.is_branch_local() => {
                warn!("Skipping folder '{}' ({}): {}", name, folder_id, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut child_path = path.to_vec();
        child_path.push(name.to_string());
        self.visit_children(children, child_path, state).await
    }

    async fn follow_shortcut(
        &self,
        shortcut: DriveFile,
        path: &[String],
        state: &mut WalkState,
    ) -> Result<(), DriveError> {
        let Some(details) = shortcut.shortcut_details else {
            warn!("Shortcut '{}' has no target, skipping", shortcut.name);
            return Ok(());
        };

        if details.target_mime_type == FOLDER_MIME {
            return self
                .enter_folder(&details.target_id, &shortcut.name, path, state)
                .await;
        }

        if state.emitted_files.contains(&details.target_id) {
            debug!("Shortcut '{}' points at an already listed file", shortcut.name);
            return Ok(());
        }

        let target = match self.drive.get_file(&details.target_id).await {
            Ok(target) => target,
            Err(e) if e.is_branch_local() => {
                warn!("Skipping shortcut '{}': {}", shortcut.name, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        // The target's own mime type wins over the cached one on the shortcut.
        if target.is_folder() {
            let name = target.name.clone();
            return self.enter_folder(&target.id, &name, path, state).await;
        }
        Self::emit(target, path, state);
        Ok(())
    }

    fn emit(file: DriveFile, path: &[String], state: &mut WalkState) {
        if !state.emitted_files.insert(file.id.clone()) {
            debug!("File {} already listed", file.id);
            return;
        }
        debug!("Found file: {}", file.name);
        state.descriptors.push(file.into_descriptor(path.to_vec()));
    }
}
