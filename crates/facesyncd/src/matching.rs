//! Matches faces found in saved media back to enrolled members.

use std::sync::Arc;

use thiserror::Error;

use facesync_core::client::{ClientError, FaceClient};
use facesync_core::repository::{ContentRepository, FileStore, FileStoreError, RepositoryError};
use facesync_core::types::{Media, MemberId};

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("unreadable media image: {0}")]
    Image(#[from] FileStoreError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Handles media-saved events: detect faces, identify each against the
/// group, map candidate persons back to member records.
///
/// Strictly best-effort. `matched_members` is only written when at least
/// one candidate resolved to a known member; zero faces or zero matches
/// leaves the media untouched.
pub struct MediaMatcher {
    client: Arc<dyn FaceClient>,
    repository: Arc<dyn ContentRepository>,
    files: Arc<dyn FileStore>,
    group_id: String,
    max_candidates: u8,
}

impl MediaMatcher {
    pub fn new(
        client: Arc<dyn FaceClient>,
        repository: Arc<dyn ContentRepository>,
        files: Arc<dyn FileStore>,
        group_id: String,
        max_candidates: u8,
    ) -> Self {
        Self {
            client,
            repository,
            files,
            group_id,
            max_candidates,
        }
    }

    /// Handle one media-saved batch. Items are independent: a failed match
    /// logs a warning and passes that media through unchanged.
    pub async fn medias_saved(&self, batch: Vec<Media>) -> Vec<Media> {
        let mut out = Vec::with_capacity(batch.len());
        for media in batch {
            match self.match_media(&media).await {
                Ok(matched) => out.push(matched),
                Err(e) => {
                    tracing::warn!(media = %media.id, error = %e, "media face match failed");
                    out.push(media);
                }
            }
        }
        out
    }

    async fn match_media(&self, media: &Media) -> Result<Media, MatchError> {
        let image = self.files.read_image(media).await?;
        let detections = self.client.detect(image, &[]).await?;
        if detections.is_empty() {
            tracing::debug!(media = %media.id, "no faces in media");
            return Ok(media.clone());
        }

        let face_ids: Vec<_> = detections.iter().map(|d| d.face_id).collect();
        let results = self
            .client
            .identify(&self.group_id, &face_ids, self.max_candidates)
            .await?;

        // First-seen order, one entry per member however many faces hit it.
        let mut matched: Vec<MemberId> = Vec::new();
        for result in &results {
            for candidate in &result.candidates {
                let members = self
                    .repository
                    .members_by_person_id(candidate.person_id)
                    .await?;
                if members.len() > 1 {
                    tracing::warn!(
                        person_id = %candidate.person_id,
                        members = members.len(),
                        "multiple members share one person enrollment"
                    );
                }
                for member in members {
                    if !matched.contains(&member.id) {
                        matched.push(member.id);
                    }
                }
            }
        }

        let mut updated = media.clone();
        if !matched.is_empty() {
            tracing::info!(
                media = %updated.id,
                faces = face_ids.len(),
                members = matched.len(),
                "media matched to members"
            );
            updated.matched_members = Some(matched);
        }
        Ok(updated)
    }
}
