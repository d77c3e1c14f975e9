//! Collaborator boundary to the remote face-recognition service.
//!
//! Wire types mirror the service's JSON; the pipeline never sees anything
//! below this trait. Implementations live outside this crate (HTTP client
//! in `facesync-http`, scripted fakes in tests).

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Default candidate cap for identify calls, per face.
pub const DEFAULT_MAX_CANDIDATES: u8 = 5;

/// Face attributes the service can derive during detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceAttribute {
    Age,
    Gender,
    Glasses,
    Makeup,
    Hair,
}

impl FaceAttribute {
    /// Wire name used in the detect query string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FaceAttribute::Age => "age",
            FaceAttribute::Gender => "gender",
            FaceAttribute::Glasses => "glasses",
            FaceAttribute::Makeup => "makeup",
            FaceAttribute::Hair => "hair",
        }
    }
}

/// Attribute set requested when syncing a member's profile picture.
pub const PROFILE_ATTRIBUTES: [FaceAttribute; 5] = [
    FaceAttribute::Age,
    FaceAttribute::Gender,
    FaceAttribute::Glasses,
    FaceAttribute::Makeup,
    FaceAttribute::Hair,
];

/// One detected face. Transient: lives only for the handling of a single
/// save event. The `face_id` is the service's short-lived detection handle,
/// not an enrollment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub face_id: Uuid,
    pub face_rectangle: FaceRectangle,
    #[serde(default)]
    pub face_attributes: Option<FaceAttributes>,
}

/// Bounding region of a detected face, in pixels.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceRectangle {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAttributes {
    #[serde(default)]
    pub age: Option<f32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub glasses: Option<String>,
    #[serde(default)]
    pub makeup: Option<Makeup>,
    #[serde(default)]
    pub hair: Option<Hair>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Makeup {
    pub eye_makeup: bool,
    pub lip_makeup: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hair {
    #[serde(default)]
    pub hair_color: Vec<HairColor>,
}

impl Hair {
    /// Highest-confidence reported hair color, if any.
    pub fn dominant_color(&self) -> Option<&str> {
        self.hair_color
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|c| c.color.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HairColor {
    pub color: String,
    pub confidence: f64,
}

/// Identification outcome for one detected face: ranked candidates, at most
/// the requested cap, possibly empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResult {
    pub face_id: Uuid,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// A ranked identify candidate: an enrolled person plus confidence.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub person_id: Uuid,
    pub confidence: f64,
}

/// Error taxonomy for remote recognition calls.
///
/// `AlreadyExists` and `NotFound` are ignorable in the contexts that expect
/// them (idempotent group creation, best-effort person deletion); everything
/// else is fatal for the entity being processed.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("recognition service unavailable: {0}")]
    Unavailable(String),
    #[error("resource already exists")]
    AlreadyExists,
    #[error("resource not found")]
    NotFound,
    #[error("invalid or unreadable image")]
    InvalidImage,
    #[error("service rejected request ({status} {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("malformed service response: {0}")]
    Decode(String),
}

/// Thin interface over the recognition service.
///
/// One method per consumed remote operation; no retry or caching policy at
/// this layer.
#[async_trait]
pub trait FaceClient: Send + Sync {
    /// Create the person group. `Err(AlreadyExists)` when it is already there.
    async fn create_group(&self, group_id: &str, name: &str) -> Result<(), ClientError>;

    /// Delete an enrolled person and all of its persisted faces.
    async fn delete_person(&self, group_id: &str, person_id: Uuid) -> Result<(), ClientError>;

    /// Detect faces in an image, optionally extracting attributes.
    /// Zero detections is a normal, non-error outcome.
    async fn detect(
        &self,
        image: Vec<u8>,
        attributes: &[FaceAttribute],
    ) -> Result<Vec<Detection>, ClientError>;

    /// Match detected faces against the group's enrolled persons.
    async fn identify(
        &self,
        group_id: &str,
        face_ids: &[Uuid],
        max_candidates: u8,
    ) -> Result<Vec<IdentifyResult>, ClientError>;

    /// Create a person in the group; returns its `person_id`.
    async fn create_person(&self, group_id: &str, name: &str) -> Result<Uuid, ClientError>;

    /// Persist a face for an existing person; returns the persisted face id.
    async fn add_person_face(
        &self,
        group_id: &str,
        person_id: Uuid,
        image: Vec<u8>,
    ) -> Result<Uuid, ClientError>;

    /// Kick off retraining of the group's identification index.
    async fn train_group(&self, group_id: &str) -> Result<(), ClientError>;
}
