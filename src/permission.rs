//! The right lattice and typed permission proofs.
//!
//! Rights form a total order `None < Read < Write < Admin`. Whenever several
//! grant paths apply to the same principal and entity, the most permissive one
//! wins, so aggregation is a plain `max` over the lattice.
//!
//! On top of the runtime lattice this module provides compile-time levels.
//! A [`Permission<L>`] can only be obtained by passing a check in
//! [`crate::access::require`], and mutating operations consume one. A proof is
//! bound to the principal it was issued to and is neither `Clone` nor `Copy`;
//! operations still re-check it against the store right before they write.
//!
//! ```ignore
//! use trellis::access::{self, Entity};
//! use trellis::level::Write;
//!
//! let perm = access::require::<Write, _>(&store, &principal, Entity::List(list_id)).await?;
//! trellis::task::create(&store, perm, new_task).await?;
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::access::Entity;
use crate::principal::Principal;
use crate::error::{Error, Result};

/// Access level a principal holds on an entity.
///
/// Only `Read`, `Write` and `Admin` are ever stored as grants. `None` is the
/// absence of any grant.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Right {
    #[default]
    None,
    Read,
    Write,
    Admin,
}

impl Right {
    /// `have >= need`.
    pub fn satisfies(self, need: Right) -> bool {
        self >= need
    }

    /// The higher of two rights.
    pub fn max(self, other: Right) -> Right {
        Ord::max(self, other)
    }

    /// Decode a right as persisted by the store.
    pub fn from_stored(value: i64) -> Result<Right> {
        match value {
            1 => Ok(Right::Read),
            2 => Ok(Right::Write),
            3 => Ok(Right::Admin),
            other => Err(Error::Internal(format!("invalid stored right {other}"))),
        }
    }

    /// Encode a right for persistence. `None` is never stored.
    pub fn to_stored(self) -> Result<i64> {
        match self {
            Right::None => Err(Error::BadRequest("cannot grant an empty right".into())),
            Right::Read => Ok(1),
            Right::Write => Ok(2),
            Right::Admin => Ok(3),
        }
    }
}

impl FromIterator<Right> for Right {
    fn from_iter<I: IntoIterator<Item = Right>>(iter: I) -> Self {
        iter.into_iter().fold(Right::None, Right::max)
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Right::None => "none",
            Right::Read => "read",
            Right::Write => "write",
            Right::Admin => "admin",
        })
    }
}

/// Marker trait for compile-time permission levels.
pub trait Level: Clone + Copy + PartialEq + Eq + fmt::Debug {
    /// The lattice value this level demands.
    const RIGHT: Right;
}

/// Standard permission levels (Read < Write < Admin).
pub mod level {
    use super::{Level, Right};

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Read;

    impl Level for Read {
        const RIGHT: Right = Right::Read;
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Write;

    impl Level for Write {
        const RIGHT: Right = Right::Write;
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Admin;

    impl Level for Admin {
        const RIGHT: Right = Right::Admin;
    }
}

/// Proof that `principal` passed an `L`-level check on `entity`.
#[derive(Debug)]
pub struct Permission<L: Level> {
    principal: Principal,
    entity: Entity,
    held: Right,
    _level: PhantomData<L>,
}

impl<L: Level> Permission<L> {
    pub(crate) fn new(principal: Principal, entity: Entity, held: Right) -> Self {
        debug_assert!(held.satisfies(L::RIGHT));
        Self {
            principal,
            entity,
            held,
            _level: PhantomData,
        }
    }

    /// The principal the check was performed for.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// The entity the check was performed on.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// The effective right observed at check time. Always at least `L::RIGHT`.
    pub fn held(&self) -> Right {
        self.held
    }
}
