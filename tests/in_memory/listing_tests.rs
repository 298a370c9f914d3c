//! Access scoping of model listings.

use super::helpers::{Fleet, PLATFORM, SHARED_INFRA, TEAM, docker, fleet};
use hatchery::worker_model::{
    domain::{CreateModel, GroupId, Requester, StateLoadOption, WorkerModel},
    services::CredentialAccess,
};
use rstest::rstest;

const OTHER_TEAM: GroupId = GroupId::new(30);

async fn seed(fleet: &Fleet) {
    let mut restricted = docker("registry.local/team-only");
    restricted.restricted = true;
    let mut disabled = docker("registry.local/retired");
    disabled.disabled = true;
    let mut deprecated = docker("ubuntu:20.04");
    deprecated.is_deprecated = true;

    let commands = [
        CreateModel::new("shared-debian", SHARED_INFRA, docker("debian:12")),
        CreateModel::new("shared-ubuntu", SHARED_INFRA, deprecated),
        CreateModel::new("team-app", TEAM, docker("registry.local/app")),
        CreateModel::new("team-only", TEAM, restricted),
        CreateModel::new("team-retired", TEAM, disabled),
        CreateModel::new("other-app", OTHER_TEAM, docker("registry.local/other")),
    ];
    for command in commands {
        fleet
            .lifecycle
            .create(command)
            .await
            .expect("seeding should succeed");
    }
}

fn names(models: &[WorkerModel]) -> Vec<&str> {
    models.iter().map(|model| model.name().as_str()).collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn members_see_their_groups_and_shared_infrastructure(fleet: Fleet) {
    seed(&fleet).await;
    let member = Requester::member("alice", [TEAM]);

    let visible = fleet
        .view
        .list_for_user(&member, None)
        .await
        .expect("listing should succeed");

    assert_eq!(
        names(&visible),
        ["shared-debian", "shared-ubuntu", "team-app", "team-only", "team-retired"]
    );
}

#[rstest]
#[case(StateLoadOption::Official, &["shared-debian", "shared-ubuntu"])]
#[case(StateLoadOption::Deprecated, &["shared-ubuntu"])]
#[case(StateLoadOption::Disabled, &["team-retired"])]
#[case(StateLoadOption::Register, &["other-app", "shared-debian", "shared-ubuntu", "team-app", "team-only", "team-retired"])]
#[tokio::test(flavor = "multi_thread")]
async fn admins_filter_by_state(
    fleet: Fleet,
    #[case] state: StateLoadOption,
    #[case] expected: &[&str],
) {
    seed(&fleet).await;

    let visible = fleet
        .view
        .list_for_user(&Requester::admin("root"), Some(state))
        .await
        .expect("listing should succeed");

    assert_eq!(names(&visible), expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn privileged_hatcheries_skip_restricted_and_disabled_models(fleet: Fleet) {
    seed(&fleet).await;

    let usable = fleet
        .view
        .list_usable_by_group(PLATFORM, PLATFORM, CredentialAccess::Redacted)
        .await
        .expect("listing should succeed");

    assert_eq!(
        names(&usable),
        ["other-app", "shared-debian", "shared-ubuntu", "team-app"]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn team_hatcheries_only_spawn_their_enabled_models(fleet: Fleet) {
    seed(&fleet).await;

    let usable = fleet
        .view
        .list_usable_by_group(TEAM, PLATFORM, CredentialAccess::Redacted)
        .await
        .expect("listing should succeed");

    assert_eq!(names(&usable), ["team-app", "team-only"]);
}
