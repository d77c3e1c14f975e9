use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::FaceAttributes;

/// Identity of a member record in the content repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub String);

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identity of a media item in the content repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub String);

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A member record, as handed to the pipeline by the host's save/delete
/// events.
///
/// `person_id`, `face_id`, `face` and `synced_at` are owned by the member
/// synchronizer: it overwrites them on every successful sync and nothing
/// else mutates them. `person_id` unset means "not enrolled".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    /// Display name; also used as the remote person's name.
    pub name: String,
    /// Reference to the media item holding the profile picture.
    #[serde(default)]
    pub profile_picture: Option<MediaId>,
    /// Opaque identifier of this member's person in the recognition group.
    /// The sole correlation key between members and the remote namespace.
    #[serde(default)]
    pub person_id: Option<Uuid>,
    /// Identifier of the enrolled (persisted) face descriptor.
    #[serde(default)]
    pub face_id: Option<Uuid>,
    /// Attributes derived from the profile picture on the last sync.
    #[serde(default)]
    pub face: Option<FaceProfile>,
    #[serde(default)]
    pub synced_at: Option<DateTime<Utc>>,
}

impl Member {
    /// A member with only identity and name set, nothing enrolled.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: MemberId(id.into()),
            name: name.into(),
            profile_picture: None,
            person_id: None,
            face_id: None,
            face: None,
            synced_at: None,
        }
    }
}

/// Descriptive attributes extracted from the primary face of a member's
/// profile picture. Overwritten wholesale on each sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceProfile {
    pub age: Option<f32>,
    pub gender: Option<String>,
    pub glasses: Option<String>,
    pub eye_makeup: bool,
    pub lip_makeup: bool,
    /// Dominant hair color, when the service reported one.
    pub hair_color: Option<String>,
}

impl From<&FaceAttributes> for FaceProfile {
    fn from(attrs: &FaceAttributes) -> Self {
        Self {
            age: attrs.age,
            gender: attrs.gender.clone(),
            glasses: attrs.glasses.clone(),
            eye_makeup: attrs.makeup.as_ref().map(|m| m.eye_makeup).unwrap_or(false),
            lip_makeup: attrs.makeup.as_ref().map(|m| m.lip_makeup).unwrap_or(false),
            hair_color: attrs
                .hair
                .as_ref()
                .and_then(|h| h.dominant_color())
                .map(str::to_string),
        }
    }
}

/// A media item. `matched_members` is only ever written by the media
/// matcher, and only with members whose `person_id` matched an identify
/// candidate. Best-effort: absence does not mean "nobody pictured".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: MediaId,
    /// Stored image source: a raw relative path, or the JSON crop
    /// descriptor some repositories persist instead.
    pub source: String,
    #[serde(default)]
    pub matched_members: Option<Vec<MemberId>>,
}

impl Media {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: MediaId(id.into()),
            source: source.into(),
            matched_members: None,
        }
    }

    /// Resolve the stored source to a relative image path.
    ///
    /// The source may be a JSON crop descriptor (`{"src": "/media/x.jpg", ...}`)
    /// or a plain path. Falls back to the raw value when it is not valid
    /// descriptor JSON; returns `None` when blank either way.
    pub fn image_source(&self) -> Option<String> {
        if let Ok(descriptor) = serde_json::from_str::<CropDescriptor>(&self.source) {
            if descriptor.src.trim().is_empty() {
                return None;
            }
            return Some(descriptor.src);
        }
        let raw = self.source.trim();
        if raw.is_empty() {
            None
        } else {
            Some(raw.to_string())
        }
    }
}

/// Image-crop descriptor as persisted by the content repository.
#[derive(Debug, Deserialize)]
struct CropDescriptor {
    src: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Hair, HairColor, Makeup};

    #[test]
    fn test_image_source_from_crop_descriptor() {
        let media = Media::new(
            "m1",
            r#"{"src": "/media/1001/portrait.jpg", "focalPoint": {"left": 0.5, "top": 0.5}}"#,
        );
        assert_eq!(media.image_source().as_deref(), Some("/media/1001/portrait.jpg"));
    }

    #[test]
    fn test_image_source_raw_path_fallback() {
        let media = Media::new("m1", "/media/1001/portrait.jpg");
        assert_eq!(media.image_source().as_deref(), Some("/media/1001/portrait.jpg"));
    }

    #[test]
    fn test_image_source_blank() {
        assert_eq!(Media::new("m1", "   ").image_source(), None);
        assert_eq!(Media::new("m1", r#"{"src": ""}"#).image_source(), None);
    }

    #[test]
    fn test_image_source_malformed_json_is_raw() {
        // Not a descriptor, but not blank either: treat as a literal path.
        let media = Media::new("m1", "{not-json");
        assert_eq!(media.image_source().as_deref(), Some("{not-json"));
    }

    #[test]
    fn test_face_profile_from_attributes() {
        let attrs = FaceAttributes {
            age: Some(33.5),
            gender: Some("female".into()),
            glasses: Some("ReadingGlasses".into()),
            makeup: Some(Makeup {
                eye_makeup: true,
                lip_makeup: false,
            }),
            hair: Some(Hair {
                hair_color: vec![
                    HairColor {
                        color: "blond".into(),
                        confidence: 0.4,
                    },
                    HairColor {
                        color: "brown".into(),
                        confidence: 0.9,
                    },
                ],
            }),
        };

        let profile = FaceProfile::from(&attrs);
        assert_eq!(profile.age, Some(33.5));
        assert_eq!(profile.gender.as_deref(), Some("female"));
        assert_eq!(profile.glasses.as_deref(), Some("ReadingGlasses"));
        assert!(profile.eye_makeup);
        assert!(!profile.lip_makeup);
        assert_eq!(profile.hair_color.as_deref(), Some("brown"));
    }

    #[test]
    fn test_face_profile_missing_optional_blocks() {
        let attrs = FaceAttributes {
            age: None,
            gender: None,
            glasses: None,
            makeup: None,
            hair: None,
        };
        let profile = FaceProfile::from(&attrs);
        assert!(!profile.eye_makeup);
        assert!(!profile.lip_makeup);
        assert!(profile.hair_color.is_none());
    }

    #[test]
    fn test_member_round_trips_camel_case() {
        let mut member = Member::new("1042", "Jane Appleseed");
        member.person_id = Some(Uuid::nil());

        let json = serde_json::to_value(&member).unwrap();
        assert!(json.get("personId").is_some());
        assert!(json.get("profilePicture").is_some());

        let back: Member = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, member.id);
        assert_eq!(back.person_id, Some(Uuid::nil()));
    }
}
