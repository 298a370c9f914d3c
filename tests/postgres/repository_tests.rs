//! Worker model repository behaviour against a real `PostgreSQL` schema.

use super::helpers::{
    ManualClock, SHARED_INFRA, TEAM, TestDatabase, docker, shared_test_cluster, test_runtime,
};
use hatchery::worker_model::{
    adapters::postgres::PostgresWorkerModelRepository,
    domain::{
        GroupId, GroupScope, ModelFilter, ModelId, ModelKey, ModelName, ModelSpec, NewWorkerModel,
        RecheckEpoch, RecordSpawnError, RegistrationState, Requirement, RequirementType,
        StateLoadOption, WorkerModel,
    },
    ports::{WorkerModelRepository, WorkerModelRepositoryError},
};
use mockable::Clock;
use pg_embedded_setup_unpriv::TestCluster;
use rstest::rstest;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn new_model(name: &str, group: GroupId, spec: ModelSpec) -> NewWorkerModel {
    NewWorkerModel::new(
        ModelName::new(name).expect("valid model name"),
        group,
        spec,
        None,
        &ManualClock::new(),
    )
}

fn insert(
    rt: &Runtime,
    repo: &PostgresWorkerModelRepository,
    model: &NewWorkerModel,
) -> WorkerModel {
    rt.block_on(repo.insert(model)).expect("insert should succeed")
}

fn find_one(rt: &Runtime, repo: &PostgresWorkerModelRepository, id: ModelId) -> WorkerModel {
    rt.block_on(repo.find(&ModelKey::Id(id)))
        .expect("lookup should succeed")
        .into_iter()
        .next()
        .expect("model should exist")
}

fn registered_at(clock: &ManualClock) -> RegistrationState {
    RegistrationState::registered(
        Some("linux".to_owned()),
        Some("amd64".to_owned()),
        RecheckEpoch::new(2),
        clock.utc(),
    )
}

fn names(models: &[WorkerModel]) -> BTreeSet<String> {
    models
        .iter()
        .map(|model| model.name().as_str().to_owned())
        .collect()
}

#[rstest]
fn stored_model_round_trips_through_both_keys(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "repo_round_trip").expect("database setup");
    let repo = db.repository();
    let rt = test_runtime();

    let mut spec = docker("registry.local/app:1");
    spec.registry.private = true;
    spec.registry.username = Some("ci".to_owned());
    spec.envs.insert("WORKER_TTL".to_owned(), "{{ ttl }}".to_owned());
    let mut draft = new_model("private-app", TEAM, spec.clone());
    draft.password = Some("c2VhbGVk".to_owned());
    let created = insert(&rt, &repo, &draft);

    let by_name = rt
        .block_on(repo.find(&ModelKey::Name(draft.name.clone())))
        .expect("lookup should succeed");
    assert_eq!(by_name, vec![created.clone()]);
    let by_id = find_one(&rt, &repo, created.id());
    assert_eq!(by_id.spec(), &spec);
    assert_eq!(by_id.password(), Some("c2VhbGVk"));
    assert!(by_id.needs_registration());
    assert!(
        rt.block_on(repo.find(&ModelKey::Id(ModelId::new(9_999))))
            .expect("lookup should succeed")
            .is_empty()
    );
}

#[rstest]
fn duplicate_names_map_to_duplicate_name(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "repo_duplicate").expect("database setup");
    let repo = db.repository();
    let rt = test_runtime();

    insert(&rt, &repo, &new_model("debian-12", TEAM, docker("debian:12")));
    let second = insert(&rt, &repo, &new_model("debian-13", TEAM, docker("debian:13")));

    assert!(matches!(
        rt.block_on(repo.insert(&new_model("debian-12", SHARED_INFRA, docker("debian:12")))),
        Err(WorkerModelRepositoryError::DuplicateName(name)) if name.as_str() == "debian-12"
    ));

    let mut renamed = second;
    let clock = ManualClock::new();
    renamed.apply_update(
        ModelName::new("debian-12").expect("valid model name"),
        TEAM,
        docker("debian:13"),
        &clock,
    );
    assert!(matches!(
        rt.block_on(repo.update(&renamed)),
        Err(WorkerModelRepositoryError::DuplicateName(_))
    ));
}

#[rstest]
#[case(StateLoadOption::Register, &["pending"])]
#[case(StateLoadOption::Disabled, &["disabled"])]
#[case(StateLoadOption::SpawnError, &["failing"])]
#[case(StateLoadOption::Deprecated, &["deprecated"])]
#[case(StateLoadOption::Active, &["disabled", "failing", "pending", "shared"])]
#[case(StateLoadOption::Official, &["shared"])]
fn list_applies_state_filters(
    shared_test_cluster: &'static TestCluster,
    #[case] state: StateLoadOption,
    #[case] expected: &[&str],
) {
    let db = TestDatabase::create(shared_test_cluster, "repo_states").expect("database setup");
    let repo = db.repository();
    let rt = test_runtime();
    let clock = ManualClock::new();

    insert(&rt, &repo, &new_model("pending", TEAM, docker("pending:1")));
    let mut disabled_spec = docker("disabled:1");
    disabled_spec.disabled = true;
    let mut deprecated_spec = docker("deprecated:1");
    deprecated_spec.is_deprecated = true;
    for (name, group, spec) in [
        ("disabled", TEAM, disabled_spec),
        ("deprecated", TEAM, deprecated_spec),
        ("failing", TEAM, docker("failing:1")),
        ("shared", SHARED_INFRA, docker("shared:1")),
    ] {
        let created = insert(&rt, &repo, &new_model(name, group, spec));
        rt.block_on(repo.complete_registration(created.id(), None, &registered_at(&clock), &[]))
            .expect("registration should succeed");
        if name == "failing" {
            rt.block_on(repo.record_spawn_error(
                created.id(),
                &RecordSpawnError::new("pull failed"),
                clock.utc(),
            ))
            .expect("spawn error should be recorded");
        }
    }

    let listed = rt
        .block_on(repo.list(
            &ModelFilter::new(GroupScope::All, SHARED_INFRA).with_state(Some(state)),
        ))
        .expect("listing should succeed");

    let expected_names: BTreeSet<String> =
        expected.iter().map(|name| (*name).to_owned()).collect();
    assert_eq!(names(&listed), expected_names);
}

#[rstest]
fn list_applies_scope_and_binary_filters(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "repo_binary").expect("database setup");
    let repo = db.repository();
    let rt = test_runtime();
    let clock = ManualClock::new();

    let with_git = insert(&rt, &repo, &new_model("with-git", TEAM, docker("git:1")));
    let shared_git = insert(&rt, &repo, &new_model("shared-git", SHARED_INFRA, docker("git:2")));
    let without_git = insert(&rt, &repo, &new_model("without-git", TEAM, docker("plain:1")));
    for (id, capabilities) in [
        (with_git.id(), vec![Requirement::binary("git"), Requirement::binary("bash")]),
        (shared_git.id(), vec![Requirement::binary("git")]),
        (without_git.id(), vec![Requirement::binary("bash")]),
    ] {
        rt.block_on(repo.complete_registration(id, None, &registered_at(&clock), &capabilities))
            .expect("registration should succeed");
    }

    let everyone = rt
        .block_on(repo.list(&ModelFilter::new(GroupScope::All, SHARED_INFRA).with_binary("git")))
        .expect("listing should succeed");
    assert_eq!(
        names(&everyone),
        BTreeSet::from(["shared-git".to_owned(), "with-git".to_owned()])
    );

    let team_only = rt
        .block_on(repo.list(
            &ModelFilter::new(GroupScope::Groups([TEAM].into()), SHARED_INFRA).with_binary("git"),
        ))
        .expect("listing should succeed");
    assert_eq!(names(&team_only), BTreeSet::from(["with-git".to_owned()]));

    let binaries: Vec<String> = rt
        .block_on(repo.binary_capabilities())
        .expect("binaries should load")
        .iter()
        .map(|requirement| requirement.value().to_owned())
        .collect();
    assert_eq!(binaries, ["bash", "git"]);
}

#[rstest]
fn delete_cascades_to_capabilities(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "repo_cascade").expect("database setup");
    let repo = db.repository();
    let rt = test_runtime();
    let clock = ManualClock::new();

    let created = insert(&rt, &repo, &new_model("builder", TEAM, docker("builder:1")));
    rt.block_on(repo.complete_registration(
        created.id(),
        None,
        &registered_at(&clock),
        &[
            Requirement::binary("git"),
            Requirement::new("platform", RequirementType::OsArch, "linux/amd64"),
        ],
    ))
    .expect("registration should succeed");
    assert_eq!(
        rt.block_on(repo.capabilities(created.id()))
            .expect("capabilities should load")
            .len(),
        2
    );

    rt.block_on(repo.delete(created.id()))
        .expect("delete should succeed");

    assert!(
        rt.block_on(repo.capabilities(created.id()))
            .expect("capabilities should load")
            .is_empty()
    );
    assert!(
        rt.block_on(repo.binary_capabilities())
            .expect("binaries should load")
            .is_empty()
    );
    assert!(matches!(
        rt.block_on(repo.delete(created.id())),
        Err(WorkerModelRepositoryError::NotFound(id)) if id == created.id()
    ));
}

#[rstest]
fn registration_write_leaves_descriptive_fields_alone(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "repo_registration").expect("database setup");
    let repo = db.repository();
    let rt = test_runtime();
    let clock = ManualClock::new();

    let created = insert(&rt, &repo, &new_model("builder", TEAM, docker("debian:12")));
    let revision = created.user_last_modified();
    rt.block_on(repo.record_spawn_error(
        created.id(),
        &RecordSpawnError::new("boom"),
        clock.utc(),
    ))
    .expect("spawn error should be recorded");

    clock.advance_secs(30);
    let mut edited = find_one(&rt, &repo, created.id());
    edited.apply_update(edited.name().clone(), TEAM, docker("debian:13"), &clock);
    rt.block_on(repo.update(&edited))
        .expect("user edit should succeed");

    assert!(matches!(
        rt.block_on(repo.complete_registration(
            created.id(),
            Some(revision),
            &registered_at(&clock),
            &[Requirement::binary("git")],
        )),
        Err(WorkerModelRepositoryError::StaleRegistration(id)) if id == created.id()
    ));
    let after_stale = find_one(&rt, &repo, created.id());
    assert!(after_stale.needs_registration());
    assert!(
        rt.block_on(repo.capabilities(created.id()))
            .expect("capabilities should load")
            .is_empty()
    );

    let registered = rt
        .block_on(repo.complete_registration(
            created.id(),
            None,
            &registered_at(&clock),
            &[Requirement::binary("git")],
        ))
        .expect("registration should succeed");
    assert_eq!(registered.spec().image, "debian:13");
    assert!(!registered.needs_registration());
    assert_eq!(registered.spawn_errors().count, 0);
    assert_eq!(registered.user_last_modified(), clock.utc());
    assert_eq!(registered, find_one(&rt, &repo, created.id()));

    assert!(matches!(
        rt.block_on(repo.complete_registration(
            ModelId::new(9_999),
            None,
            &registered_at(&clock),
            &[],
        )),
        Err(WorkerModelRepositoryError::NotFound(_))
    ));
}

#[rstest]
fn concurrent_spawn_errors_are_all_counted(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "repo_spawn_errors").expect("database setup");
    let repo = Arc::new(db.shared_repository(4));
    let rt = test_runtime();
    let clock = ManualClock::new();
    let at = clock.utc();

    let created = insert(&rt, &repo, &new_model("flaky", TEAM, docker("flaky:1")));
    rt.block_on(async {
        let handles: Vec<_> = (0..8)
            .map(|attempt| {
                let reporter = Arc::clone(&repo);
                let id = created.id();
                tokio::spawn(async move {
                    reporter
                        .record_spawn_error(
                            id,
                            &RecordSpawnError::new(format!("attempt {attempt}")),
                            at,
                        )
                        .await
                        .expect("spawn error should be recorded");
                })
            })
            .collect();
        for handle in handles {
            handle.await.expect("reporter task should finish");
        }
    });

    let stored = find_one(&rt, &repo, created.id());
    assert_eq!(stored.spawn_errors().count, 8);
    assert!(stored.spawn_errors().last_error.is_some());
}
