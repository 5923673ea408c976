//! Managing the grants the authorizers read.
//!
//! Sharing a list or namespace, changing a share and removing one all need
//! Admin on the shared entity. Link shares never manage shares of any kind.
//! Adding a share is a mutation and is refused on archived entities; revoking
//! is always possible so access can be withdrawn from archived data.

use tracing::{debug, instrument};

use crate::access::{self, Entity};
use crate::config::Service;
use crate::error::{Error, Result};
use crate::list;
use crate::model::{ListId, NamespaceId, TeamId, UserId};
use crate::permission::{Level, Right, level};
use crate::principal::{LinkShare, Principal};
use crate::store::{GrantStore, SqlStore};

/// A share relation, identified without its right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    ListUser { list: ListId, user: UserId },
    ListTeam { list: ListId, team: TeamId },
    NamespaceTeam { namespace: NamespaceId, team: TeamId },
}

impl Target {
    /// The entity whose Admin right governs this share.
    pub fn entity(&self) -> Entity {
        match *self {
            Target::ListUser { list, .. } | Target::ListTeam { list, .. } => Entity::List(list),
            Target::NamespaceTeam { namespace, .. } => Entity::Namespace(namespace),
        }
    }
}

/// Whether `principal` may create, change or remove `target`.
pub async fn can_manage<S: GrantStore>(store: &S, principal: &Principal, target: &Target) -> Result<bool> {
    if !matches!(principal, Principal::User(_)) {
        return Ok(false);
    }
    let right = access::effective_right(store, principal, target.entity()).await?;
    Ok(right.satisfies(level::Admin::RIGHT))
}

/// Create or overwrite `target` with `right`.
#[instrument(level = "debug", skip(store, principal), fields(principal = %principal))]
pub async fn grant(store: &SqlStore, principal: &Principal, target: Target, right: Right) -> Result<()> {
    if right == Right::None {
        return Err(Error::BadRequest("a share needs a right".into()));
    }
    let entity = target.entity();
    deny_link_share(principal, entity)?;
    access::require::<level::Admin, _>(store, principal, entity).await?;

    match target {
        Target::ListUser { list, user } => store.grant_list_user(list, user, right).await?,
        Target::ListTeam { list, team } => store.grant_list_team(list, team, right).await?,
        Target::NamespaceTeam { namespace, team } => {
            store.grant_namespace_team(namespace, team, right).await?
        }
    }
    debug!(?target, %right, "share granted");
    Ok(())
}

/// Remove `target`. Not subject to the archive guard.
#[instrument(level = "debug", skip(store, principal), fields(principal = %principal))]
pub async fn revoke(store: &SqlStore, principal: &Principal, target: Target) -> Result<()> {
    let entity = target.entity();
    deny_link_share(principal, entity)?;
    if !can_manage(store, principal, &target).await? {
        return Err(Error::Forbidden {
            entity,
            need: level::Admin::RIGHT,
        });
    }

    match target {
        Target::ListUser { list, user } => store.revoke_list_user(list, user).await?,
        Target::ListTeam { list, team } => store.revoke_list_team(list, team).await?,
        Target::NamespaceTeam { namespace, team } => store.revoke_namespace_team(namespace, team).await?,
    }
    debug!(?target, "share revoked");
    Ok(())
}

/// Whether `principal` may issue a link share with `right` on `list`.
///
/// Needs sharing to be enabled and a user holding Write on the list, or
/// Admin when the share itself would carry Admin.
pub async fn can_create_link_share<S: GrantStore>(
    store: &S,
    service: &Service,
    principal: &Principal,
    list: ListId,
    right: Right,
) -> Result<bool> {
    if !service.enable_link_sharing || right == Right::None || list == ListId::FAVORITES {
        return Ok(false);
    }
    if !matches!(principal, Principal::User(_)) {
        return Ok(false);
    }
    let have = list::effective_right(store, principal, list).await?;
    Ok(have.satisfies(link_share_need(right)))
}

/// Issue a link share and return it together with its token.
///
/// The token is only ever returned here.
#[instrument(level = "debug", skip(store, service, principal), fields(principal = %principal))]
pub async fn create_link_share(
    store: &SqlStore,
    service: &Service,
    principal: &Principal,
    list: ListId,
    right: Right,
) -> Result<(LinkShare, String)> {
    if !service.enable_link_sharing {
        return Err(Error::LinkSharingDisabled);
    }
    let entity = Entity::List(list);
    let user = match principal {
        Principal::User(user) => *user,
        Principal::LinkShare(_) => {
            return Err(Error::Forbidden {
                entity,
                need: Right::Admin,
            });
        }
    };
    if right == Right::None {
        return Err(Error::BadRequest("a link share needs a right".into()));
    }
    if list == ListId::FAVORITES {
        return Err(Error::BadRequest("Favorites cannot be shared".into()));
    }

    let need = link_share_need(right);
    access::authorize(store, principal, entity, need)
        .await?
        .into_result(entity)?;

    let (share, token) = store.insert_link_share(list, right, user).await?;
    debug!(share = %share.id, %list, %right, "link share issued");
    Ok((share, token))
}

fn link_share_need(right: Right) -> Right {
    if right == Right::Admin { Right::Admin } else { Right::Write }
}

fn deny_link_share(principal: &Principal, entity: Entity) -> Result<()> {
    match principal {
        Principal::User(_) => Ok(()),
        Principal::LinkShare(_) => Err(Error::Forbidden {
            entity,
            need: level::Admin::RIGHT,
        }),
    }
}
