//! List rights: ownership, direct shares and inheritance.

use trellis::list::{self, Filter};
use trellis::share::{self, Target};
use trellis::task::NewTask;
use trellis::{ListId, Right, UserId};
use trellis::config::Service;

use super::support::{self, user};

/// List owned by A inside a namespace owned by C, with no grants at all.
#[tokio::test]
async fn owner_and_namespace_owner_read_stranger_does_not() {
    let store = support::store().await;
    let ns = support::namespace(&store, 3).await;
    let l = support::list(&store, &ns, 1).await;

    assert!(list::can_read(&store, &user(1), l.id).await.unwrap());
    assert!(list::can_read(&store, &user(3), l.id).await.unwrap());
    assert!(list::is_admin(&store, &user(3), l.id).await.unwrap());
    assert!(!list::can_read(&store, &user(4), l.id).await.unwrap());
}

#[tokio::test]
async fn direct_user_share_needs_no_namespace_relationship() {
    let store = support::store().await;
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 1).await;
    store.grant_list_user(l.id, UserId(5), Right::Read).await.unwrap();

    assert!(list::can_read(&store, &user(5), l.id).await.unwrap());
    assert!(!list::can_write(&store, &user(5), l.id).await.unwrap());
    assert!(!trellis::namespace::can_read(&store, &user(5), ns.id).await.unwrap());
}

#[tokio::test]
async fn team_share_and_user_share_merge_by_max() {
    let store = support::store().await;
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 1).await;
    let team = support::team(&store, &[5]).await;
    store.grant_list_user(l.id, UserId(5), Right::Read).await.unwrap();
    store.grant_list_team(l.id, team, Right::Admin).await.unwrap();

    assert_eq!(list::effective_right(&store, &user(5), l.id).await.unwrap(), Right::Admin);
    assert!(list::can_delete(&store, &user(5), l.id).await.unwrap());
}

#[tokio::test]
async fn only_admin_manages_shares() {
    let store = support::store().await;
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 1).await;
    store.grant_list_user(l.id, UserId(2), Right::Write).await.unwrap();
    let target = Target::ListUser {
        list: l.id,
        user: UserId(3),
    };

    assert!(share::can_manage(&store, &user(1), &target).await.unwrap());
    assert!(!share::can_manage(&store, &user(2), &target).await.unwrap());
}

#[tokio::test]
async fn listing_covers_every_grant_path() {
    let store = support::store().await;
    let service = Service::default();

    // Owned list in someone else's namespace.
    let foreign = support::namespace(&store, 9).await;
    let owned = support::list(&store, &foreign, 1).await;
    // Every list of an owned namespace.
    let mine = support::namespace(&store, 1).await;
    let inherited = support::list(&store, &mine, 7).await;
    // Direct share.
    let shared = support::list(&store, &foreign, 9).await;
    store.grant_list_user(shared.id, UserId(1), Right::Read).await.unwrap();
    // Team share on a list and on a namespace.
    let team = support::team(&store, &[1]).await;
    let team_list = support::list(&store, &foreign, 9).await;
    store.grant_list_team(team_list.id, team, Right::Write).await.unwrap();
    let team_ns = support::namespace(&store, 9).await;
    let via_ns = support::list(&store, &team_ns, 9).await;
    store.grant_namespace_team(team_ns.id, team, Right::Read).await.unwrap();
    // Not reachable.
    let _hidden = support::list(&store, &foreign, 9).await;

    let page = list::accessible(&store, &user(1), &Filter::default(), &service)
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    let mut ids: Vec<ListId> = page.lists.iter().map(|l| l.id).collect();
    ids.sort();
    let mut expected = vec![owned.id, inherited.id, shared.id, team_list.id, via_ns.id];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn listing_search_and_pagination() {
    let store = support::store().await;
    let ns = support::namespace(&store, 1).await;
    let groceries = store.create_list(ns.id, "groceries", UserId(1)).await.unwrap();
    let chores = store.create_list(ns.id, "chores", UserId(1)).await.unwrap();
    let garden = store.create_list(ns.id, "garden", UserId(1)).await.unwrap();
    let service = Service::default();

    let by_title = Filter {
        search: "gro".into(),
        ..Filter::default()
    };
    let found = list::accessible(&store, &user(1), &by_title, &service).await.unwrap();
    assert_eq!(found.lists.iter().map(|l| l.id).collect::<Vec<_>>(), vec![groceries.id]);

    let by_ids = Filter {
        search: format!("{},{}", chores.id.get(), garden.id.get()),
        ..Filter::default()
    };
    let found = list::accessible(&store, &user(1), &by_ids, &service).await.unwrap();
    assert_eq!(found.lists.iter().map(|l| l.id).collect::<Vec<_>>(), vec![chores.id, garden.id]);

    let second_page = Filter {
        page: 2,
        per_page: 2,
        ..Filter::default()
    };
    let found = list::accessible(&store, &user(1), &second_page, &service).await.unwrap();
    assert_eq!(found.lists.iter().map(|l| l.id).collect::<Vec<_>>(), vec![garden.id]);
    assert_eq!(found.total, 3);
}

#[tokio::test]
async fn favorites_never_leaks_to_other_users() {
    let store = support::store().await;
    let ns = support::namespace(&store, 1).await;
    let l = support::list(&store, &ns, 1).await;
    store.grant_list_user(l.id, UserId(2), Right::Read).await.unwrap();
    let task = store
        .insert_task(
            &NewTask {
                list_id: l.id,
                title: "milk".into(),
                description: None,
                priority: 0,
                due_date: None,
            },
            UserId(1),
        )
        .await
        .unwrap();
    store.add_favorite(UserId(1), task.id).await.unwrap();
    let service = Service::default();

    let mine = list::accessible(&store, &user(1), &Filter::default(), &service).await.unwrap();
    assert!(mine.lists[0].is_favorites());
    assert_eq!(mine.lists[0].owner_id, UserId(1));

    let theirs = list::accessible(&store, &user(2), &Filter::default(), &service).await.unwrap();
    assert!(theirs.lists.iter().all(|l| !l.is_favorites()));

    // Favorites disappears once the favorited task is out of reach.
    store.add_favorite(UserId(2), task.id).await.unwrap();
    let theirs = list::accessible(&store, &user(2), &Filter::default(), &service).await.unwrap();
    assert!(theirs.lists[0].is_favorites());
    assert_eq!(theirs.lists[0].owner_id, UserId(2));
    store.revoke_list_user(l.id, UserId(2)).await.unwrap();
    let after = list::accessible(&store, &user(2), &Filter::default(), &service).await.unwrap();
    assert_eq!(after.total, 0);
    assert!(after.lists.is_empty());
}
