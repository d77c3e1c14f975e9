//! Collaborator boundaries to the host's content repository and file
//! storage. The pipeline only ever reads through these; entity writes
//! travel back to the host as mutated records on the event reply.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{Media, MediaId, Member};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("repository backend error: {0}")]
    Backend(String),
}

/// Typed lookups into the host's content repository.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Fetch a media item by id. `Ok(None)` when it does not exist.
    async fn media_by_id(&self, id: &MediaId) -> Result<Option<Media>, RepositoryError>;

    /// All members whose `person_id` equals the given value.
    ///
    /// More than one hit violates the one-enrollment-per-member invariant;
    /// callers treat that as an integrity warning, not an error.
    async fn members_by_person_id(&self, person_id: Uuid) -> Result<Vec<Member>, RepositoryError>;
}

#[derive(Error, Debug)]
pub enum FileStoreError {
    #[error("media {0} has no usable image source")]
    NoSource(MediaId),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Read-only access to the image files behind media items.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Absolute path of the media item's image file.
    fn resolve_image_path(&self, media: &Media) -> Result<PathBuf, FileStoreError>;

    /// Read the image bytes. Opened read-only immediately before the remote
    /// call that consumes them and never held across one.
    async fn read_image(&self, media: &Media) -> Result<Vec<u8>, FileStoreError>;
}
