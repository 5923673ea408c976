//! Fixtures shared by the access-control tests.

use trellis::{List, Namespace, Principal, Right, SqlStore, TeamId, UserId};

pub async fn store() -> SqlStore {
    SqlStore::in_memory().await.expect("in-memory store")
}

pub fn user(id: i64) -> Principal {
    Principal::user(id)
}

pub async fn namespace(store: &SqlStore, owner: i64) -> Namespace {
    store
        .create_namespace("namespace", UserId(owner))
        .await
        .expect("create namespace")
}

pub async fn list(store: &SqlStore, namespace: &Namespace, owner: i64) -> List {
    store
        .create_list(namespace.id, "list", UserId(owner))
        .await
        .expect("create list")
}

/// A team holding exactly `members`.
pub async fn team(store: &SqlStore, members: &[i64]) -> TeamId {
    let team = store.create_team("team").await.expect("create team");
    for member in members {
        store
            .add_team_member(team.id, UserId(*member))
            .await
            .expect("add member");
    }
    team.id
}

pub const RIGHTS: [Right; 3] = [Right::Read, Right::Write, Right::Admin];
