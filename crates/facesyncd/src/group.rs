//! Person-group lifecycle: idempotent creation and retraining requests.

use std::sync::Arc;

use facesync_core::client::{ClientError, FaceClient};

/// Ensures the single recognition namespace exists.
pub struct GroupManager {
    client: Arc<dyn FaceClient>,
    group_id: String,
    group_name: String,
}

impl GroupManager {
    pub fn new(client: Arc<dyn FaceClient>, group_id: String, group_name: String) -> Self {
        Self {
            client,
            group_id,
            group_name,
        }
    }

    /// Create the group if needed. Never fails the caller: "already exists"
    /// is the expected steady state, anything else is logged as a warning —
    /// a missing group surfaces again on the next enrollment call.
    pub async fn ensure_group(&self) {
        match self
            .client
            .create_group(&self.group_id, &self.group_name)
            .await
        {
            Ok(()) => tracing::info!(group = %self.group_id, "person group created"),
            Err(ClientError::AlreadyExists) => {
                tracing::debug!(group = %self.group_id, "person group already exists");
            }
            Err(e) => tracing::warn!(
                group = %self.group_id,
                error = %e,
                "person group creation failed; enrollment and identify calls may fail"
            ),
        }
    }
}

/// Requests retraining of the group's identification index.
///
/// Fire-and-forget: the caller never waits for training to complete, so an
/// identify issued right after an enrollment may still run against the
/// stale index. Accepted eventual-consistency window.
pub struct Trainer {
    client: Arc<dyn FaceClient>,
    group_id: String,
}

impl Trainer {
    pub fn new(client: Arc<dyn FaceClient>, group_id: String) -> Self {
        Self { client, group_id }
    }

    /// Spawn the train request and return immediately. Failures are logged,
    /// never propagated.
    pub fn request_training(&self) -> tokio::task::JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let group_id = self.group_id.clone();
        tokio::spawn(async move {
            match client.train_group(&group_id).await {
                Ok(()) => tracing::debug!(group = %group_id, "group training requested"),
                Err(e) => {
                    tracing::warn!(group = %group_id, error = %e, "group training request failed");
                }
            }
        })
    }
}
