//! Link shares: one list, one right, nothing else.

use trellis::access::{self, Entity};
use trellis::config::Service;
use trellis::list::{self, Filter};
use trellis::principal::resolve_link_share;
use trellis::share;
use trellis::task::{self, NewTask};
use trellis::{Error, Principal, Right, UserId, level, namespace};

use super::support::{self, user};

#[tokio::test]
async fn token_resolves_to_bound_list_only() {
    let store = support::store().await;
    let service = Service::default();
    let ns = support::namespace(&store, 1).await;
    let bound = support::list(&store, &ns, 1).await;
    let other = support::list(&store, &ns, 1).await;
    // Grants on the other list do not matter to a link share.
    let team = support::team(&store, &[1]).await;
    store.grant_list_team(other.id, team, Right::Admin).await.unwrap();

    let (_, token) = share::create_link_share(&store, &service, &user(1), bound.id, Right::Write)
        .await
        .unwrap();
    let principal = resolve_link_share(&store, &service, &token).await.unwrap();

    assert_eq!(list::effective_right(&store, &principal, bound.id).await.unwrap(), Right::Write);
    assert_eq!(list::effective_right(&store, &principal, other.id).await.unwrap(), Right::None);
    assert!(!namespace::can_read(&store, &principal, ns.id).await.unwrap());

    let visible = list::accessible(&store, &principal, &Filter::default(), &service)
        .await
        .unwrap();
    assert_eq!(visible.lists.iter().map(|l| l.id).collect::<Vec<_>>(), vec![bound.id]);
}

#[tokio::test]
async fn unknown_or_disabled_tokens_are_refused() {
    let store = support::store().await;
    let service = Service::default();
    assert!(matches!(
        resolve_link_share(&store, &service, "does-not-exist").await,
        Err(Error::InvalidLinkShare)
    ));
    assert!(matches!(
        resolve_link_share(&store, &service, "").await,
        Err(Error::InvalidLinkShare)
    ));

    let disabled = Service {
        enable_link_sharing: false,
        ..Service::default()
    };
    assert!(matches!(
        resolve_link_share(&store, &disabled, "anything").await,
        Err(Error::LinkSharingDisabled)
    ));
}

#[tokio::test]
async fn writable_link_share_creates_tasks_for_its_issuer() {
    let store = support::store().await;
    let service = Service::default();
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 1).await;
    let (_, token) = share::create_link_share(&store, &service, &user(1), l.id, Right::Write)
        .await
        .unwrap();
    let principal = resolve_link_share(&store, &service, &token).await.unwrap();

    let perm = access::require::<level::Write, _>(&store, &principal, Entity::List(l.id))
        .await
        .unwrap();
    let created = task::create(
        &store,
        perm,
        NewTask {
            list_id: l.id,
            title: "from a link".into(),
            description: None,
            priority: 0,
            due_date: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(created.created_by, UserId(1));
}

#[tokio::test]
async fn read_only_link_share_cannot_write() {
    let store = support::store().await;
    let service = Service::default();
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 1).await;
    let (link, _) = share::create_link_share(&store, &service, &user(1), l.id, Right::Read)
        .await
        .unwrap();
    let principal = Principal::from(link);

    assert!(list::can_read(&store, &principal, l.id).await.unwrap());
    let err = access::require::<level::Write, _>(&store, &principal, Entity::List(l.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));
}

#[tokio::test]
async fn link_share_cannot_reshare() {
    let store = support::store().await;
    let service = Service::default();
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 1).await;
    let (link, _) = share::create_link_share(&store, &service, &user(1), l.id, Right::Admin)
        .await
        .unwrap();
    let principal = Principal::from(link);

    let err = share::create_link_share(&store, &service, &principal, l.id, Right::Read)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));

    let target = share::Target::ListUser {
        list: l.id,
        user: UserId(4),
    };
    assert!(share::grant(&store, &principal, target, Right::Read).await.is_err());
}
