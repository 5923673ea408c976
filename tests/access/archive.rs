//! Archival turns lists and namespaces read-only regardless of rights.

use trellis::access::{self, Entity};
use trellis::archive::{self, Archived};
use trellis::{Denial, Error, Right, Verdict, list};

use super::support::{self, user};

#[tokio::test]
async fn archived_list_blocks_owner_and_namespace_admin() {
    let store = support::store().await;
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 2).await;
    store.set_list_archived(l.id, true).await.unwrap();

    for who in [user(1), user(2)] {
        let verdict = access::authorize(&store, &who, Entity::List(l.id), Right::Write)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Deny(Denial::Archived(Archived::List(l.id))));

        let verdict = access::authorize(&store, &who, Entity::List(l.id), Right::Read)
            .await
            .unwrap();
        assert!(verdict.is_allowed());
        assert!(list::can_read(&store, &who, l.id).await.unwrap());
    }
}

/// List not archived, parent namespace archived.
#[tokio::test]
async fn archived_namespace_is_reported_for_its_lists() {
    let store = support::store().await;
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 1).await;
    store.set_namespace_archived(ns.id, true).await.unwrap();

    let err = archive::check_writable(&store, &l).await.unwrap_err();
    assert!(matches!(err, Error::NamespaceArchived(id) if id == ns.id));
    assert!(list::can_read(&store, &user(1), l.id).await.unwrap());

    let err = access::require::<trellis::level::Write, _>(&store, &user(1), Entity::Namespace(ns.id))
        .await
        .unwrap_err();
    assert!(err.is_archived());
}

#[tokio::test]
async fn unarchive_is_the_only_write_allowed() {
    let store = support::store().await;
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 1).await;
    store.set_list_archived(l.id, true).await.unwrap();

    let verdict = access::authorize_unarchive(&store, &user(1), Entity::List(l.id))
        .await
        .unwrap();
    assert_eq!(verdict, Verdict::Allow(Right::Admin));
    store.set_list_archived(l.id, false).await.unwrap();

    let verdict = access::authorize(&store, &user(1), Entity::List(l.id), Right::Write)
        .await
        .unwrap();
    assert!(verdict.is_allowed());
}

#[tokio::test]
async fn unarchive_still_needs_write() {
    let store = support::store().await;
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 1).await;
    store.grant_list_user(l.id, trellis::UserId(2), Right::Read).await.unwrap();
    store.set_list_archived(l.id, true).await.unwrap();

    let verdict = access::authorize_unarchive(&store, &user(2), Entity::List(l.id))
        .await
        .unwrap();
    assert!(matches!(
        verdict,
        Verdict::Deny(Denial::InsufficientRight { need: Right::Write, .. })
    ));
}

#[tokio::test]
async fn archive_state_is_hidden_from_strangers() {
    let store = support::store().await;
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 1).await;
    store.set_list_archived(l.id, true).await.unwrap();

    let verdict = access::authorize(&store, &user(9), Entity::List(l.id), Right::Write)
        .await
        .unwrap();
    assert!(matches!(verdict, Verdict::Deny(Denial::InsufficientRight { .. })));
}
