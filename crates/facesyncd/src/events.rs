//! Wire format of the bundled host's event feed: newline-delimited JSON,
//! one save/delete event per line in, one reply per line out.

use serde::{Deserialize, Serialize};

use facesync_core::types::{Media, Member};

use crate::engine::{EngineError, EngineHandle};
use crate::store::MemoryRepository;

/// One content event, tagged by `"event"`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SaveEvent {
    MembersSaved { members: Vec<Member> },
    MediasSaved { medias: Vec<Media> },
    MembersDeleted { members: Vec<Member> },
}

/// Reply emitted after an event is handled, carrying the mutated records.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EventReply {
    MembersSynced { members: Vec<Member> },
    MediasMatched { medias: Vec<Media> },
    MembersRemoved { count: usize },
}

/// Route one event through the engine, keeping the repository projection
/// current on both sides of the call.
pub async fn dispatch(
    event: SaveEvent,
    repository: &MemoryRepository,
    engine: &EngineHandle,
) -> Result<EventReply, EngineError> {
    match event {
        SaveEvent::MembersSaved { members } => {
            for member in &members {
                repository.upsert_member(member.clone());
            }
            let members = engine.members_saved(members).await?;
            for member in &members {
                repository.upsert_member(member.clone());
            }
            Ok(EventReply::MembersSynced { members })
        }
        SaveEvent::MediasSaved { medias } => {
            for media in &medias {
                repository.upsert_media(media.clone());
            }
            let medias = engine.medias_saved(medias).await?;
            for media in &medias {
                repository.upsert_media(media.clone());
            }
            Ok(EventReply::MediasMatched { medias })
        }
        SaveEvent::MembersDeleted { members } => {
            let count = members.len();
            engine.members_deleted(members.clone()).await?;
            for member in &members {
                repository.remove_member(&member.id);
            }
            Ok(EventReply::MembersRemoved { count })
        }
    }
}
