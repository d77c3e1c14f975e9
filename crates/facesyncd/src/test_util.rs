//! Shared test doubles: a scripted recognition client, in-memory backing
//! stores, and fixture builders for the handler tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use facesync_core::client::{
    Candidate, ClientError, Detection, FaceAttribute, FaceAttributes, FaceClient, FaceRectangle,
    Hair, HairColor, IdentifyResult, Makeup,
};
use facesync_core::repository::{FileStore, FileStoreError};
use facesync_core::types::{Media, MediaId, Member};

use crate::group::Trainer;
use crate::matching::MediaMatcher;
use crate::store::MemoryRepository;
use crate::sync::MemberSynchronizer;

/// One observed remote call, reduced to what the tests assert on.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateGroup(String),
    DeletePerson(Uuid),
    Detect { attributes: usize },
    Identify { faces: usize, max: u8 },
    CreatePerson(String),
    AddFace(Uuid),
    Train,
}

#[derive(Default)]
struct Scripts {
    create_group: VecDeque<Result<(), ClientError>>,
    delete_person: VecDeque<Result<(), ClientError>>,
    detect: VecDeque<Result<Vec<Detection>, ClientError>>,
    identify: VecDeque<Result<Vec<IdentifyResult>, ClientError>>,
    create_person: VecDeque<Result<Uuid, ClientError>>,
    add_face: VecDeque<Result<Uuid, ClientError>>,
    train: VecDeque<Result<(), ClientError>>,
}

/// Fake [`FaceClient`] driven by per-operation scripted results. When a
/// script queue is empty the call succeeds with a benign default, so tests
/// only script the calls they care about.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    scripts: Mutex<Scripts>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_create_group(&self, result: Result<(), ClientError>) {
        self.scripts.lock().unwrap().create_group.push_back(result);
    }

    pub fn script_delete_person(&self, result: Result<(), ClientError>) {
        self.scripts.lock().unwrap().delete_person.push_back(result);
    }

    pub fn script_detect(&self, result: Result<Vec<Detection>, ClientError>) {
        self.scripts.lock().unwrap().detect.push_back(result);
    }

    pub fn script_identify(&self, result: Result<Vec<IdentifyResult>, ClientError>) {
        self.scripts.lock().unwrap().identify.push_back(result);
    }

    pub fn script_create_person(&self, result: Result<Uuid, ClientError>) {
        self.scripts.lock().unwrap().create_person.push_back(result);
    }

    pub fn script_add_face(&self, result: Result<Uuid, ClientError>) {
        self.scripts.lock().unwrap().add_face.push_back(result);
    }

    pub fn script_train(&self, result: Result<(), ClientError>) {
        self.scripts.lock().unwrap().train.push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn train_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == Call::Train)
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl FaceClient for ScriptedClient {
    async fn create_group(&self, group_id: &str, _name: &str) -> Result<(), ClientError> {
        self.record(Call::CreateGroup(group_id.to_string()));
        self.scripts
            .lock()
            .unwrap()
            .create_group
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn delete_person(&self, _group_id: &str, person_id: Uuid) -> Result<(), ClientError> {
        self.record(Call::DeletePerson(person_id));
        self.scripts
            .lock()
            .unwrap()
            .delete_person
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn detect(
        &self,
        _image: Vec<u8>,
        attributes: &[FaceAttribute],
    ) -> Result<Vec<Detection>, ClientError> {
        self.record(Call::Detect {
            attributes: attributes.len(),
        });
        self.scripts
            .lock()
            .unwrap()
            .detect
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }

    async fn identify(
        &self,
        _group_id: &str,
        face_ids: &[Uuid],
        max_candidates: u8,
    ) -> Result<Vec<IdentifyResult>, ClientError> {
        self.record(Call::Identify {
            faces: face_ids.len(),
            max: max_candidates,
        });
        self.scripts
            .lock()
            .unwrap()
            .identify
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }

    async fn create_person(&self, _group_id: &str, name: &str) -> Result<Uuid, ClientError> {
        self.record(Call::CreatePerson(name.to_string()));
        self.scripts
            .lock()
            .unwrap()
            .create_person
            .pop_front()
            .unwrap_or_else(|| Ok(Uuid::new_v4()))
    }

    async fn add_person_face(
        &self,
        _group_id: &str,
        person_id: Uuid,
        _image: Vec<u8>,
    ) -> Result<Uuid, ClientError> {
        self.record(Call::AddFace(person_id));
        self.scripts
            .lock()
            .unwrap()
            .add_face
            .pop_front()
            .unwrap_or_else(|| Ok(Uuid::new_v4()))
    }

    async fn train_group(&self, _group_id: &str) -> Result<(), ClientError> {
        self.record(Call::Train);
        self.scripts
            .lock()
            .unwrap()
            .train
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// [`FileStore`] fake serving image bytes keyed by media id.
#[derive(Default)]
pub(crate) struct MemoryFiles {
    images: Mutex<HashMap<MediaId, Vec<u8>>>,
}

impl MemoryFiles {
    pub fn insert(&self, id: impl Into<String>, bytes: &[u8]) {
        self.images
            .lock()
            .unwrap()
            .insert(MediaId(id.into()), bytes.to_vec());
    }
}

#[async_trait]
impl FileStore for MemoryFiles {
    fn resolve_image_path(&self, media: &Media) -> Result<std::path::PathBuf, FileStoreError> {
        media
            .image_source()
            .map(std::path::PathBuf::from)
            .ok_or_else(|| FileStoreError::NoSource(media.id.clone()))
    }

    async fn read_image(&self, media: &Media) -> Result<Vec<u8>, FileStoreError> {
        self.images
            .lock()
            .unwrap()
            .get(&media.id)
            .cloned()
            .ok_or_else(|| {
                FileStoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    media.id.0.clone(),
                ))
            })
    }
}

pub(crate) struct SyncFixture {
    pub synchronizer: MemberSynchronizer,
    pub repository: Arc<MemoryRepository>,
    pub files: Arc<MemoryFiles>,
}

impl SyncFixture {
    /// Register a media record plus the bytes behind it.
    pub fn add_image(&self, media_id: &str, source: &str, bytes: &[u8]) {
        self.repository.upsert_media(Media::new(media_id, source));
        self.files.insert(media_id, bytes);
    }
}

pub(crate) fn new_synchronizer() -> (Arc<ScriptedClient>, SyncFixture) {
    let client = Arc::new(ScriptedClient::new());
    let repository = Arc::new(MemoryRepository::new());
    let files = Arc::new(MemoryFiles::default());
    let synchronizer = MemberSynchronizer::new(
        client.clone(),
        repository.clone(),
        files.clone(),
        Trainer::new(client.clone(), "members".into()),
        "members".into(),
    );
    (
        client,
        SyncFixture {
            synchronizer,
            repository,
            files,
        },
    )
}

pub(crate) struct MatchFixture {
    pub matcher: MediaMatcher,
    pub repository: Arc<MemoryRepository>,
    pub files: Arc<MemoryFiles>,
}

impl MatchFixture {
    pub fn add_image(&self, media_id: &str, source: &str, bytes: &[u8]) {
        self.repository.upsert_media(Media::new(media_id, source));
        self.files.insert(media_id, bytes);
    }
}

pub(crate) fn new_matcher(max_candidates: u8) -> (Arc<ScriptedClient>, MatchFixture) {
    let client = Arc::new(ScriptedClient::new());
    let repository = Arc::new(MemoryRepository::new());
    let files = Arc::new(MemoryFiles::default());
    let matcher = MediaMatcher::new(
        client.clone(),
        repository.clone(),
        files.clone(),
        "members".into(),
        max_candidates,
    );
    (
        client,
        MatchFixture {
            matcher,
            repository,
            files,
        },
    )
}

pub(crate) fn member_with_picture(id: &str, name: &str, picture: &str) -> Member {
    let mut member = Member::new(id, name);
    member.profile_picture = Some(MediaId(picture.into()));
    member
}

pub(crate) fn detection() -> Detection {
    Detection {
        face_id: Uuid::new_v4(),
        face_rectangle: FaceRectangle {
            top: 10,
            left: 10,
            width: 100,
            height: 100,
        },
        face_attributes: None,
    }
}

pub(crate) fn detection_with_attributes() -> Detection {
    let mut d = detection();
    d.face_attributes = Some(FaceAttributes {
        age: Some(27.0),
        gender: Some("male".into()),
        glasses: Some("NoGlasses".into()),
        makeup: Some(Makeup {
            eye_makeup: false,
            lip_makeup: false,
        }),
        hair: Some(Hair {
            hair_color: vec![HairColor {
                color: "brown".into(),
                confidence: 0.95,
            }],
        }),
    });
    d
}

pub(crate) fn candidate(person_id: Uuid, confidence: f64) -> Candidate {
    Candidate {
        person_id,
        confidence,
    }
}

pub(crate) fn identify_result(face_id: Uuid, candidates: Vec<Candidate>) -> IdentifyResult {
    IdentifyResult {
        face_id,
        candidates,
    }
}

/// Poll a condition until it holds, for spawned fire-and-forget work.
pub(crate) async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not met within timeout");
}
