//! Pipeline engine: a single worker task owning the handlers, driven
//! through a channel-backed handle.
//!
//! Hosts that are already async call the `*_saved`/`*_deleted` methods
//! directly; synchronous hosts use the `blocking_*` variants, which park
//! the calling thread until the worker replies.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use facesync_core::client::FaceClient;
use facesync_core::repository::{ContentRepository, FileStore};
use facesync_core::types::{Media, Member};

use crate::config::Config;
use crate::group::{GroupManager, Trainer};
use crate::matching::MediaMatcher;
use crate::sync::{MemberDeletionHandler, MemberSynchronizer};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine worker is gone")]
    ChannelClosed,
}

enum EngineRequest {
    MembersSaved {
        batch: Vec<Member>,
        reply: oneshot::Sender<Vec<Member>>,
    },
    MediasSaved {
        batch: Vec<Media>,
        reply: oneshot::Sender<Vec<Media>>,
    },
    MembersDeleted {
        batch: Vec<Member>,
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to the engine worker.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Sync saved members' enrollments; returns the updated records.
    pub async fn members_saved(&self, batch: Vec<Member>) -> Result<Vec<Member>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::MembersSaved { batch, reply })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Match saved medias against enrolled members; returns the updated
    /// records.
    pub async fn medias_saved(&self, batch: Vec<Media>) -> Result<Vec<Media>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::MediasSaved { batch, reply })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Clean up remote enrollments for deleted members, best-effort.
    pub async fn members_deleted(&self, batch: Vec<Member>) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::MembersDeleted { batch, reply })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// [`Self::members_saved`] for synchronous hosts. Must be called from
    /// outside the async runtime.
    pub fn blocking_members_saved(&self, batch: Vec<Member>) -> Result<Vec<Member>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .blocking_send(EngineRequest::MembersSaved { batch, reply })
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.blocking_recv().map_err(|_| EngineError::ChannelClosed)
    }

    /// [`Self::medias_saved`] for synchronous hosts. Must be called from
    /// outside the async runtime.
    pub fn blocking_medias_saved(&self, batch: Vec<Media>) -> Result<Vec<Media>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .blocking_send(EngineRequest::MediasSaved { batch, reply })
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.blocking_recv().map_err(|_| EngineError::ChannelClosed)
    }

    /// [`Self::members_deleted`] for synchronous hosts. Must be called from
    /// outside the async runtime.
    pub fn blocking_members_deleted(&self, batch: Vec<Member>) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .blocking_send(EngineRequest::MembersDeleted { batch, reply })
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.blocking_recv().map_err(|_| EngineError::ChannelClosed)
    }
}

struct Engine {
    synchronizer: MemberSynchronizer,
    matcher: MediaMatcher,
    deletions: MemberDeletionHandler,
}

impl Engine {
    async fn run(self, group: GroupManager, mut rx: mpsc::Receiver<EngineRequest>) {
        group.ensure_group().await;
        tracing::info!("engine ready");

        while let Some(request) = rx.recv().await {
            match request {
                EngineRequest::MembersSaved { batch, reply } => {
                    let out = self.synchronizer.members_saved(batch).await;
                    let _ = reply.send(out);
                }
                EngineRequest::MediasSaved { batch, reply } => {
                    let out = self.matcher.medias_saved(batch).await;
                    let _ = reply.send(out);
                }
                EngineRequest::MembersDeleted { batch, reply } => {
                    self.deletions.members_deleted(&batch).await;
                    let _ = reply.send(());
                }
            }
        }
        tracing::debug!("engine loop finished");
    }
}

/// Build the handlers and spawn the worker task. The worker ensures the
/// person group exists before serving its first request, and exits when
/// the last handle is dropped.
pub fn spawn_engine(
    config: &Config,
    client: Arc<dyn FaceClient>,
    repository: Arc<dyn ContentRepository>,
    files: Arc<dyn FileStore>,
) -> EngineHandle {
    let group = GroupManager::new(
        client.clone(),
        config.group_id.clone(),
        config.group_name.clone(),
    );
    let trainer = Trainer::new(client.clone(), config.group_id.clone());
    let engine = Engine {
        synchronizer: MemberSynchronizer::new(
            client.clone(),
            repository.clone(),
            files.clone(),
            trainer,
            config.group_id.clone(),
        ),
        matcher: MediaMatcher::new(
            client.clone(),
            repository,
            files,
            config.group_id.clone(),
            config.max_candidates,
        ),
        deletions: MemberDeletionHandler::new(client, config.group_id.clone()),
    };

    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(engine.run(group, rx));
    EngineHandle { tx }
}
