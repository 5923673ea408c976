//! Uniform authorization entry point.
//!
//! Handlers ask one question: may this principal act on this entity with at
//! least this right? The answer is a [`Verdict`]. A denial carries a reason
//! so the caller can tell a missing entity from an insufficient right from an
//! archived one. Store failures are never folded into a verdict; they come
//! back as `Err` and the caller treats them as internal errors.
//!
//! Rights are evaluated before the archive guard so that a principal without
//! access never learns whether an entity is archived.

use std::fmt;

use tracing::{debug, instrument};

use crate::archive::{self, Archived, Target};
use crate::error::{Error, Result};
use crate::model::{ListId, NamespaceId};
use crate::permission::{Level, Permission, Right};
use crate::principal::Principal;
use crate::store::GrantStore;
use crate::{list, namespace};

/// Something rights are resolved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Namespace(NamespaceId),
    List(ListId),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Namespace(id) => write!(f, "{id}"),
            Entity::List(id) => write!(f, "{id}"),
        }
    }
}

/// The grant path a right was obtained through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Via {
    /// No path applies.
    Nothing,
    /// The principal owns the entity itself.
    Owner,
    /// The principal owns the list's namespace.
    NamespaceOwner,
    /// A team the principal belongs to was granted the namespace.
    NamespaceTeam,
    /// The list was shared with the principal directly or with one of its teams.
    ListShare,
    /// The principal is a link share bound to this list.
    LinkShare,
    /// The requester's own Favorites pseudo list.
    Favorites,
}

/// A right together with the path that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub right: Right,
    pub via: Via,
}

impl Grant {
    pub const NONE: Grant = Grant {
        right: Right::None,
        via: Via::Nothing,
    };

    pub fn new(right: Right, via: Via) -> Self {
        if right == Right::None {
            Self::NONE
        } else {
            Self { right, via }
        }
    }

    /// The more permissive of two grants. Ties keep `self`.
    pub fn max(self, other: Grant) -> Grant {
        if other.right > self.right { other } else { self }
    }
}

/// Why access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotFound,
    InsufficientRight { have: Right, need: Right },
    Archived(Archived),
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow(Right),
    Deny(Denial),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow(_))
    }

    /// Turn a denial into the matching error for `entity`.
    pub fn into_result(self, entity: Entity) -> Result<Right> {
        match self {
            Verdict::Allow(right) => Ok(right),
            Verdict::Deny(Denial::NotFound) => Err(match entity {
                Entity::Namespace(id) => Error::NamespaceNotFound(id),
                Entity::List(id) => Error::ListNotFound(id),
            }),
            Verdict::Deny(Denial::InsufficientRight { need, .. }) => {
                Err(Error::Forbidden { entity, need })
            }
            Verdict::Deny(Denial::Archived(cause)) => Err(cause.into()),
        }
    }
}

/// Resolve the effective right of `principal` on `entity`.
pub async fn effective_right<S: GrantStore>(
    store: &S,
    principal: &Principal,
    entity: Entity,
) -> Result<Right> {
    match entity {
        Entity::Namespace(id) => namespace::effective_right(store, principal, id).await,
        Entity::List(id) => list::effective_right(store, principal, id).await,
    }
}

/// Decide whether `principal` may act on `entity` with at least `need`.
///
/// Any `need` above `Read` is a mutation and is subject to the archive guard.
#[instrument(level = "debug", skip(store, principal), fields(principal = %principal))]
pub async fn authorize<S: GrantStore>(
    store: &S,
    principal: &Principal,
    entity: Entity,
    need: Right,
) -> Result<Verdict> {
    evaluate(store, principal, entity, need, true).await
}

/// Like [`authorize`] with `Write`, but skipping the archive guard.
///
/// Lifting the archived flag is the one mutation allowed on an archived
/// entity; handlers toggling the flag use this and nothing else.
#[instrument(level = "debug", skip(store, principal), fields(principal = %principal))]
pub async fn authorize_unarchive<S: GrantStore>(
    store: &S,
    principal: &Principal,
    entity: Entity,
) -> Result<Verdict> {
    evaluate(store, principal, entity, Right::Write, false).await
}

/// Obtain a typed permission proof, or the error describing the denial.
pub async fn require<L: Level, S: GrantStore>(
    store: &S,
    principal: &Principal,
    entity: Entity,
) -> Result<Permission<L>> {
    let right = authorize(store, principal, entity, L::RIGHT)
        .await?
        .into_result(entity)?;
    Ok(Permission::new(principal.clone(), entity, right))
}

async fn evaluate<S: GrantStore>(
    store: &S,
    principal: &Principal,
    entity: Entity,
    need: Right,
    guard_archive: bool,
) -> Result<Verdict> {
    let have = match effective_right(store, principal, entity).await {
        Ok(right) => right,
        Err(e) if e.is_not_found() => {
            debug!(%entity, "denied: not found");
            return Ok(Verdict::Deny(Denial::NotFound));
        }
        Err(e) => return Err(e),
    };

    if !have.satisfies(need) {
        debug!(%entity, %have, %need, "denied: insufficient right");
        return Ok(Verdict::Deny(Denial::InsufficientRight { have, need }));
    }

    if guard_archive && need > Right::Read {
        let cause = match entity {
            Entity::List(id) => archive::archived_cause(store, Target::Existing(id)).await?,
            Entity::Namespace(id) => archive::namespace_cause(store, id).await?,
        };
        if let Some(cause) = cause {
            debug!(%entity, %cause, "denied: archived");
            return Ok(Verdict::Deny(Denial::Archived(cause)));
        }
    }

    Ok(Verdict::Allow(have))
}
