//! Member-facing handlers: enrollment rebuild on save, cleanup on delete.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use facesync_core::client::{ClientError, FaceClient, PROFILE_ATTRIBUTES};
use facesync_core::repository::{ContentRepository, FileStore, FileStoreError, RepositoryError};
use facesync_core::types::{FaceProfile, MediaId, Member};

use crate::group::Trainer;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("profile media {0} not found")]
    MediaNotFound(MediaId),
    #[error("no face detected in profile picture")]
    NoFaceDetected,
    #[error("unreadable profile image: {0}")]
    Image(#[from] FileStoreError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Rebuilds a member's remote enrollment whenever the member is saved.
///
/// Delete-then-recreate: the previous person (if any) is removed
/// best-effort, then a fresh person is created and the profile picture
/// enrolled as its face. A member therefore never accumulates more than
/// one live enrollment.
pub struct MemberSynchronizer {
    client: Arc<dyn FaceClient>,
    repository: Arc<dyn ContentRepository>,
    files: Arc<dyn FileStore>,
    trainer: Trainer,
    group_id: String,
}

impl MemberSynchronizer {
    pub fn new(
        client: Arc<dyn FaceClient>,
        repository: Arc<dyn ContentRepository>,
        files: Arc<dyn FileStore>,
        trainer: Trainer,
        group_id: String,
    ) -> Self {
        Self {
            client,
            repository,
            files,
            trainer,
            group_id,
        }
    }

    /// Handle one member-saved batch, in order, each member independently:
    /// a failed sync leaves that member's enrollment fields untouched and
    /// moves on. At most one training request per batch, issued only when
    /// some enrollment actually changed.
    pub async fn members_saved(&self, batch: Vec<Member>) -> Vec<Member> {
        let mut out = Vec::with_capacity(batch.len());
        let mut enrollment_changed = false;

        for member in batch {
            let picture = member
                .profile_picture
                .clone()
                .filter(|p| !p.0.trim().is_empty());
            let Some(picture) = picture else {
                // No profile picture is a normal state, not an error.
                out.push(member);
                continue;
            };

            match self.sync_member(&member, &picture).await {
                Ok(updated) => {
                    tracing::info!(
                        member = %updated.id,
                        person_id = ?updated.person_id,
                        "member enrollment rebuilt"
                    );
                    enrollment_changed = true;
                    out.push(updated);
                }
                Err(e) => {
                    tracing::warn!(member = %member.id, error = %e, "member face sync failed");
                    out.push(member);
                }
            }
        }

        if enrollment_changed {
            self.trainer.request_training();
        }
        out
    }

    /// Run the full sync pipeline for one member. Any failure aborts this
    /// member only; enrollment fields are written solely on full success.
    async fn sync_member(&self, member: &Member, picture: &MediaId) -> Result<Member, SyncError> {
        let media = self
            .repository
            .media_by_id(picture)
            .await?
            .ok_or_else(|| SyncError::MediaNotFound(picture.clone()))?;
        let image = self.files.read_image(&media).await?;

        // Best-effort cleanup of the previous enrollment; never blocking.
        if let Some(previous) = member.person_id {
            match self.client.delete_person(&self.group_id, previous).await {
                Ok(()) | Err(ClientError::NotFound) => {}
                Err(e) => tracing::warn!(
                    member = %member.id,
                    person_id = %previous,
                    error = %e,
                    "stale person cleanup failed"
                ),
            }
        }

        let detections = self.client.detect(image.clone(), &PROFILE_ATTRIBUTES).await?;
        let primary = detections.first().ok_or(SyncError::NoFaceDetected)?;

        let person_id = self.client.create_person(&self.group_id, &member.name).await?;
        let face_id = self
            .client
            .add_person_face(&self.group_id, person_id, image)
            .await?;

        let mut updated = member.clone();
        updated.face = primary.face_attributes.as_ref().map(FaceProfile::from);
        updated.person_id = Some(person_id);
        updated.face_id = Some(face_id);
        updated.synced_at = Some(Utc::now());
        Ok(updated)
    }
}

/// Best-effort removal of the remote person when a member is deleted.
///
/// Failures are swallowed by design: the member is going away either way,
/// and an orphaned remote person is preferable to a blocked deletion.
pub struct MemberDeletionHandler {
    client: Arc<dyn FaceClient>,
    group_id: String,
}

impl MemberDeletionHandler {
    pub fn new(client: Arc<dyn FaceClient>, group_id: String) -> Self {
        Self { client, group_id }
    }

    pub async fn members_deleted(&self, batch: &[Member]) {
        for member in batch {
            let Some(person_id) = member.person_id else {
                continue;
            };
            match self.client.delete_person(&self.group_id, person_id).await {
                Ok(()) => {
                    tracing::debug!(member = %member.id, person_id = %person_id, "person removed");
                }
                Err(ClientError::NotFound) => {
                    tracing::debug!(member = %member.id, person_id = %person_id, "person already gone");
                }
                Err(e) => tracing::warn!(
                    member = %member.id,
                    person_id = %person_id,
                    error = %e,
                    "person removal failed; member deletion proceeds"
                ),
            }
        }
    }
}
