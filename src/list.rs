//! List authorizer and list listing.
//!
//! A user's right on a list is the max over four independent paths: list
//! ownership, a direct user or team share of the list, and whatever the user
//! holds on the parent namespace. The paths are merged, never intersected, so
//! a narrow list share reaches users with no namespace relationship at all.
//!
//! Two cases are dispatched before any of that: link shares resolve to their
//! stored right on their own list only, and the Favorites pseudo list belongs
//! to whoever asks for it.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::access::{Grant, Via};
use crate::config::Service;
use crate::error::{Error, Result};
use crate::model::{List, ListId, NamespaceId, UserId};
use crate::namespace;
use crate::permission::Right;
use crate::principal::Principal;
use crate::store::{GrantStore, ListQuery, Search};

/// A list id, split into the persisted and the synthesized case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Real(ListId),
    Favorites,
}

impl From<ListId> for Target {
    fn from(id: ListId) -> Self {
        if id == ListId::FAVORITES {
            Target::Favorites
        } else {
            Target::Real(id)
        }
    }
}

/// Effective right of `principal` on list `id`.
///
/// Fails with `ListNotFound` for unknown ids. Store failures propagate.
#[instrument(level = "debug", skip(store, principal), fields(principal = %principal))]
pub async fn effective_right<S: GrantStore>(store: &S, principal: &Principal, id: ListId) -> Result<Right> {
    let grant = grant(store, principal, id).await?;
    debug!(right = %grant.right, via = ?grant.via, "list right resolved");
    Ok(grant.right)
}

async fn grant<S: GrantStore>(store: &S, principal: &Principal, id: ListId) -> Result<Grant> {
    let user = match principal {
        Principal::LinkShare(share) => {
            // Unknown ids still report not found, the bound one included.
            if Target::from(id) != Target::Favorites {
                load(store, id).await?;
            }
            return Ok(Grant::new(share.right_on(id), Via::LinkShare));
        }
        Principal::User(user) => *user,
    };

    match Target::from(id) {
        Target::Favorites => Ok(Grant::new(Right::Admin, Via::Favorites)),
        Target::Real(id) => {
            let list = load(store, id).await?;
            user_grant(store, user, &list).await
        }
    }
}

async fn user_grant<S: GrantStore>(store: &S, user: UserId, list: &List) -> Result<Grant> {
    if list.owner_id == user {
        return Ok(Grant::new(Right::Admin, Via::Owner));
    }

    let teams = store.teams_containing(user).await?;
    let direct = Grant::new(store.list_grant(list.id, user, &teams).await?, Via::ListShare);
    if direct.right == Right::Admin {
        return Ok(direct);
    }

    let parent = namespace::load(store, list.namespace_id).await?;
    let mut inherited = namespace::grant_for(store, user, &parent, &teams).await?;
    if inherited.via == Via::Owner {
        inherited.via = Via::NamespaceOwner;
    }
    Ok(direct.max(inherited))
}

pub async fn can_read<S: GrantStore>(store: &S, principal: &Principal, id: ListId) -> Result<bool> {
    Ok(effective_right(store, principal, id).await?.satisfies(Right::Read))
}

/// Write on a list also covers creating tasks inside it.
pub async fn can_write<S: GrantStore>(store: &S, principal: &Principal, id: ListId) -> Result<bool> {
    Ok(effective_right(store, principal, id).await?.satisfies(Right::Write))
}

pub async fn is_admin<S: GrantStore>(store: &S, principal: &Principal, id: ListId) -> Result<bool> {
    Ok(effective_right(store, principal, id).await?.satisfies(Right::Admin))
}

/// Creating a list needs Write on the namespace it goes into.
pub async fn can_create<S: GrantStore>(
    store: &S,
    principal: &Principal,
    namespace: NamespaceId,
) -> Result<bool> {
    namespace::can_write(store, principal, namespace).await
}

/// Updating needs Write on the stored list. Favorites has no row to update.
pub async fn can_update<S: GrantStore>(store: &S, principal: &Principal, id: ListId) -> Result<bool> {
    if Target::from(id) == Target::Favorites {
        return Ok(false);
    }
    can_write(store, principal, id).await
}

/// Deleting needs Admin on the stored list. Favorites cannot be deleted.
pub async fn can_delete<S: GrantStore>(store: &S, principal: &Principal, id: ListId) -> Result<bool> {
    if Target::from(id) == Target::Favorites {
        return Ok(false);
    }
    is_admin(store, principal, id).await
}

pub(crate) async fn load<S: GrantStore>(store: &S, id: ListId) -> Result<List> {
    store.get_list(id).await?.ok_or(Error::ListNotFound(id))
}

/// Listing parameters as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Comma separated list ids or a title fragment. See [`parse_search`].
    pub search: String,
    pub include_archived: bool,
    /// 1-based. Zero is treated as the first page.
    pub page: u32,
    /// Zero or anything above the configured maximum means the maximum.
    pub per_page: u32,
}

impl Filter {
    fn query(&self, service: &Service) -> ListQuery {
        let max = service.max_items_per_page;
        let limit = if self.per_page == 0 { max } else { self.per_page.min(max) };
        let page = self.page.max(1);
        ListQuery {
            search: parse_search(&self.search),
            include_archived: self.include_archived,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

/// One page of a listing and the number of items across all pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Page {
    pub lists: Vec<List>,
    pub total: u64,
}

/// Split a search string into list ids or a title fragment.
///
/// Every comma separated part that parses as an integer is taken as an id and
/// the rest is ignored. Only when no part is numeric does the whole string
/// become a title search, so `"3,groceries"` searches for list 3.
pub fn parse_search(search: &str) -> Search {
    let search = search.trim();
    if search.is_empty() {
        return Search::Any;
    }
    let ids: Vec<ListId> = search
        .split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok().map(ListId))
        .collect();
    if ids.is_empty() {
        Search::Title(search.to_string())
    } else {
        Search::Ids(ids)
    }
}

/// Every list `principal` may read, filtered and paginated.
///
/// A link share sees at most its own list, under the same filter. A user's
/// Favorites list takes the first slot of the first page whenever they have
/// favorited a task they can still reach and no search is given; it counts
/// towards both the page size and the total.
#[instrument(level = "debug", skip(store, principal, service), fields(principal = %principal))]
pub async fn accessible<S: GrantStore>(
    store: &S,
    principal: &Principal,
    filter: &Filter,
    service: &Service,
) -> Result<Page> {
    let query = filter.query(service);
    let user = match principal {
        Principal::LinkShare(share) => return bound_list(store, share.list_id, &query).await,
        Principal::User(user) => *user,
    };

    let favorites = query.search == Search::Any && store.has_favorites(user).await?;
    let mut real = query.clone();
    if favorites {
        if query.offset == 0 {
            real.limit = query.limit.saturating_sub(1);
        } else {
            real.offset = query.offset - 1;
        }
    }

    let mut lists = if real.limit == 0 {
        Vec::new()
    } else {
        store.lists_for_user(user, &real).await?
    };
    if favorites && query.offset == 0 && query.limit > 0 {
        lists.insert(0, List::favorites(user));
    }
    let total = store.count_lists_for_user(user, &query).await? + u64::from(favorites);
    debug!(count = lists.len(), total, "lists listed");
    Ok(Page { lists, total })
}

async fn bound_list<S: GrantStore>(store: &S, id: ListId, query: &ListQuery) -> Result<Page> {
    let Some(list) = store.get_list(id).await? else {
        return Ok(Page::default());
    };
    let archived = match store.archive_state(id).await? {
        Some(state) => state.cause(id).is_some(),
        None => false,
    };
    if (archived && !query.include_archived) || !query.search.matches(&list) {
        return Ok(Page::default());
    }
    let lists = if query.offset == 0 && query.limit > 0 { vec![list] } else { Vec::new() };
    Ok(Page { lists, total: 1 })
}
