//! Unit tests for the worker model bounded context.


use crate::worker_model::{
    adapters::{
        cipher::AesGcmCipher,
        memory::{InMemoryCoordinationStore, InMemoryWorkerModelRepository},
    },
    domain::{GroupId, ModelSpec, ModelType},
    services::CredentialVault,
};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex};

/// Clock that only moves when told to.
#[derive(Debug)]
pub(super) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(super) fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 10, 1, 9, 0, 0)
            .single()
            .expect("valid start instant");
        Self {
            now: Mutex::new(start),
        }
    }

    pub(super) fn advance_secs(&self, seconds: i64) {
        let mut now = self.now.lock().expect("clock lock");
        *now += TimeDelta::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

pub(super) const SHARED_INFRA: GroupId = GroupId::new(1);
pub(super) const TEAM_A: GroupId = GroupId::new(10);
pub(super) const TEAM_B: GroupId = GroupId::new(20);

pub(super) type TestStore = InMemoryCoordinationStore<ManualClock>;

/// In-memory collaborators sharing one manual clock.
pub(super) struct Harness {
    pub(super) clock: Arc<ManualClock>,
    pub(super) repository: Arc<InMemoryWorkerModelRepository>,
    pub(super) store: Arc<TestStore>,
    pub(super) vault: CredentialVault<AesGcmCipher>,
}

impl Harness {
    pub(super) fn new() -> Self {
        let clock = Arc::new(ManualClock::new());
        let cipher = AesGcmCipher::from_key(&[42_u8; 32]).expect("32-byte key is valid");
        Self {
            repository: Arc::new(InMemoryWorkerModelRepository::new()),
            store: Arc::new(InMemoryCoordinationStore::new(Arc::clone(&clock))),
            vault: CredentialVault::new(Arc::new(cipher)),
            clock,
        }
    }
}

pub(super) fn docker_spec(image: &str) -> ModelSpec {
    ModelSpec::new(ModelType::Docker, image)
}

pub(super) fn private_docker_spec(image: &str) -> ModelSpec {
    let mut spec = docker_spec(image);
    spec.registry.private = true;
    spec
}
