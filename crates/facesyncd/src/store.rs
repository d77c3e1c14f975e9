//! Reference backing stores for the bundled host: an in-memory content
//! repository projection and a local-filesystem file store. Production
//! hosts supply their own implementations of the core traits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use facesync_core::repository::{
    ContentRepository, FileStore, FileStoreError, RepositoryError,
};
use facesync_core::types::{Media, MediaId, Member, MemberId};

/// In-memory projection of the host's member and media records, kept
/// current by the event feed.
#[derive(Default)]
pub struct MemoryRepository {
    members: RwLock<HashMap<MemberId, Member>>,
    medias: RwLock<HashMap<MediaId, Media>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_member(&self, member: Member) {
        self.members
            .write()
            .expect("member map poisoned")
            .insert(member.id.clone(), member);
    }

    pub fn upsert_media(&self, media: Media) {
        self.medias
            .write()
            .expect("media map poisoned")
            .insert(media.id.clone(), media);
    }

    pub fn remove_member(&self, id: &MemberId) {
        self.members.write().expect("member map poisoned").remove(id);
    }
}

#[async_trait]
impl ContentRepository for MemoryRepository {
    async fn media_by_id(&self, id: &MediaId) -> Result<Option<Media>, RepositoryError> {
        Ok(self.medias.read().expect("media map poisoned").get(id).cloned())
    }

    async fn members_by_person_id(&self, person_id: Uuid) -> Result<Vec<Member>, RepositoryError> {
        Ok(self
            .members
            .read()
            .expect("member map poisoned")
            .values()
            .filter(|m| m.person_id == Some(person_id))
            .cloned()
            .collect())
    }
}

/// Serves media images from a root directory, with the stored source
/// interpreted as a root-relative path.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    fn resolve_image_path(&self, media: &Media) -> Result<PathBuf, FileStoreError> {
        let source = media
            .image_source()
            .ok_or_else(|| FileStoreError::NoSource(media.id.clone()))?;
        Ok(self.root.join(source.trim_start_matches('/')))
    }

    async fn read_image(&self, media: &Media) -> Result<Vec<u8>, FileStoreError> {
        let path = self.resolve_image_path(media)?;
        Ok(tokio::fs::read(path).await?)
    }
}
