//! Namespace authorizer.
//!
//! A user's right on a namespace is Admin when they own it, otherwise the
//! highest right any of their teams was granted on it. Link shares are bound
//! to a single list and hold nothing on namespaces.
//!
//! Every predicate takes an id and loads the namespace from the store, so a
//! decision never depends on caller-supplied owner or archive fields.

use tracing::{debug, instrument};

use crate::access::{Grant, Via};
use crate::error::{Error, Result};
use crate::model::{Namespace, NamespaceId, TeamId, UserId};
use crate::permission::Right;
use crate::principal::Principal;
use crate::store::GrantStore;

/// Effective right of `principal` on namespace `id`.
///
/// Fails with `NamespaceNotFound` when the id does not resolve, so callers can
/// tell "no such namespace" from "no access".
#[instrument(level = "debug", skip(store, principal), fields(principal = %principal))]
pub async fn effective_right<S: GrantStore>(
    store: &S,
    principal: &Principal,
    id: NamespaceId,
) -> Result<Right> {
    let namespace = load(store, id).await?;
    let grant = match principal {
        Principal::User(user) => {
            let teams = store.teams_containing(*user).await?;
            grant_for(store, *user, &namespace, &teams).await?
        }
        Principal::LinkShare(_) => Grant::NONE,
    };
    debug!(right = %grant.right, via = ?grant.via, "namespace right resolved");
    Ok(grant.right)
}

pub async fn can_read<S: GrantStore>(store: &S, principal: &Principal, id: NamespaceId) -> Result<bool> {
    Ok(effective_right(store, principal, id).await?.satisfies(Right::Read))
}

pub async fn can_write<S: GrantStore>(store: &S, principal: &Principal, id: NamespaceId) -> Result<bool> {
    Ok(effective_right(store, principal, id).await?.satisfies(Right::Write))
}

pub async fn is_admin<S: GrantStore>(store: &S, principal: &Principal, id: NamespaceId) -> Result<bool> {
    Ok(effective_right(store, principal, id).await?.satisfies(Right::Admin))
}

/// Any user may create a namespace; there is nothing to check rights against
/// yet. Link shares never create anything outside their list.
pub fn can_create(principal: &Principal) -> bool {
    matches!(principal, Principal::User(_))
}

/// Updating requires Admin on the stored namespace.
pub async fn can_update<S: GrantStore>(store: &S, principal: &Principal, id: NamespaceId) -> Result<bool> {
    is_admin(store, principal, id).await
}

/// Deleting requires Admin on the stored namespace.
pub async fn can_delete<S: GrantStore>(store: &S, principal: &Principal, id: NamespaceId) -> Result<bool> {
    is_admin(store, principal, id).await
}

/// Resolve `user` on an already loaded namespace with a known team set.
pub(crate) async fn grant_for<S: GrantStore>(
    store: &S,
    user: UserId,
    namespace: &Namespace,
    teams: &[TeamId],
) -> Result<Grant> {
    if namespace.owner_id == user {
        return Ok(Grant::new(Right::Admin, Via::Owner));
    }
    let right = store.namespace_grant(namespace.id, teams).await?;
    Ok(Grant::new(right, Via::NamespaceTeam))
}

pub(crate) async fn load<S: GrantStore>(store: &S, id: NamespaceId) -> Result<Namespace> {
    store
        .get_namespace(id)
        .await?
        .ok_or(Error::NamespaceNotFound(id))
}
