//! facesync-core — Domain records and collaborator boundaries.
//!
//! Defines the Member/Media records the pipeline mutates, the wire-level
//! types of the remote recognition service, and the traits through which
//! the host's content repository and file storage are reached.

pub mod client;
pub mod repository;
pub mod types;

pub use client::{Candidate, ClientError, Detection, FaceAttribute, FaceClient, IdentifyResult};
pub use repository::{ContentRepository, FileStore, FileStoreError, RepositoryError};
pub use types::{FaceProfile, Media, MediaId, Member, MemberId};
