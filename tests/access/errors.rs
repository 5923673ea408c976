//! Failure handling at the boundary.
//!
//! Denials map to distinct status codes. Store failures are never turned
//! into denials and never reach the client verbatim.

use hyper::StatusCode;
use trellis::access::{self, Entity};
use trellis::archive::ArchiveState;
use trellis::model::{List, Namespace};
use trellis::store::{GrantStore, ListQuery};
use trellis::task::Task;
use trellis::{Error, LinkShare, ListId, NamespaceId, Right, TaskId, TeamId, UserId};

use super::support::user;

/// A grant store whose backend is gone.
struct Unavailable;

fn down<T>() -> trellis::Result<T> {
    Err(Error::Internal("connection refused: 10.0.0.7:5432".into()))
}

impl GrantStore for Unavailable {
    async fn teams_containing(&self, _: UserId) -> trellis::Result<Vec<TeamId>> {
        down()
    }
    async fn namespace_grant(&self, _: NamespaceId, _: &[TeamId]) -> trellis::Result<Right> {
        down()
    }
    async fn list_grant(&self, _: ListId, _: UserId, _: &[TeamId]) -> trellis::Result<Right> {
        down()
    }
    async fn get_namespace(&self, _: NamespaceId) -> trellis::Result<Option<Namespace>> {
        down()
    }
    async fn get_list(&self, _: ListId) -> trellis::Result<Option<List>> {
        down()
    }
    async fn archive_state(&self, _: ListId) -> trellis::Result<Option<ArchiveState>> {
        down()
    }
    async fn link_share_by_token(&self, _: &str) -> trellis::Result<Option<LinkShare>> {
        down()
    }
    async fn get_task(&self, _: TaskId) -> trellis::Result<Option<Task>> {
        down()
    }
    async fn lists_for_user(&self, _: UserId, _: &ListQuery) -> trellis::Result<Vec<List>> {
        down()
    }
    async fn count_lists_for_user(&self, _: UserId, _: &ListQuery) -> trellis::Result<u64> {
        down()
    }
    async fn has_favorites(&self, _: UserId) -> trellis::Result<bool> {
        down()
    }
}

async fn body_of(err: Error) -> (StatusCode, String) {
    let resp = err.into_response();
    let status = resp.status();
    let bytes = http_body_util::BodyExt::collect(resp.into_body())
        .await
        .unwrap()
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn store_failure_is_an_error_not_a_denial() {
    let result = access::authorize(&Unavailable, &user(1), Entity::List(ListId(1)), Right::Read).await;
    let err = result.unwrap_err();
    assert!(!err.is_not_found());

    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("10.0.0.7"), "backend address leaked: {body}");
}

#[tokio::test]
async fn link_share_resolution_surfaces_store_failure() {
    let service = trellis::config::Service::default();
    let result = trellis::principal::resolve_link_share(&Unavailable, &service, "abc").await;
    assert!(matches!(result, Err(Error::Internal(_))));
}

#[tokio::test]
async fn denials_have_distinct_statuses() {
    let forbidden = Error::Forbidden {
        entity: Entity::List(ListId(1)),
        need: Right::Write,
    };
    let (status, body) = body_of(forbidden).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("write access required on list 1"));

    let (status, body) = body_of(Error::ListArchived(ListId(1))).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert!(body.contains("list 1 is archived"));

    let (status, _) = body_of(Error::NamespaceNotFound(NamespaceId(4))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
