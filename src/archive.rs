//! Archive guard.
//!
//! A list is read-only while its own archived flag or its namespace's flag is
//! set. The guard is independent of rights: an admin is blocked exactly like
//! everyone else until the flag is lifted. Reads are never blocked.

use std::fmt;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{List, ListId, NamespaceId};
use crate::store::GrantStore;

/// Archived bits of a list and its parent namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveState {
    pub list_archived: bool,
    pub namespace_id: NamespaceId,
    pub namespace_archived: bool,
}

/// Which entity blocks the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archived {
    List(ListId),
    Namespace(NamespaceId),
}

impl From<Archived> for Error {
    fn from(archived: Archived) -> Self {
        match archived {
            Archived::List(id) => Error::ListArchived(id),
            Archived::Namespace(id) => Error::NamespaceArchived(id),
        }
    }
}

impl fmt::Display for Archived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Archived::List(id) => write!(f, "{id} is archived"),
            Archived::Namespace(id) => write!(f, "{id} is archived"),
        }
    }
}

/// What is about to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A persisted list.
    Existing(ListId),
    /// A list that does not exist yet and would be created in `namespace`.
    New { namespace: NamespaceId },
}

impl Target {
    pub fn of(list: &List) -> Self {
        if list.id == ListId::UNSAVED {
            Target::New {
                namespace: list.namespace_id,
            }
        } else {
            Target::Existing(list.id)
        }
    }
}

impl ArchiveState {
    /// The reported cause. The list flag wins when both are set since it is
    /// the more specific one.
    pub fn cause(&self, list: ListId) -> Option<Archived> {
        if self.list_archived {
            Some(Archived::List(list))
        } else if self.namespace_archived {
            Some(Archived::Namespace(self.namespace_id))
        } else {
            None
        }
    }
}

/// Find out whether `target` is blocked by archival.
pub async fn archived_cause<S: GrantStore>(store: &S, target: Target) -> Result<Option<Archived>> {
    match target {
        Target::New { namespace } => namespace_cause(store, namespace).await,
        Target::Existing(id) if id == ListId::FAVORITES => Ok(None),
        Target::Existing(id) => {
            let state = store
                .archive_state(id)
                .await?
                .ok_or(Error::ListNotFound(id))?;
            Ok(state.cause(id))
        }
    }
}

/// Fail with `ListArchived` or `NamespaceArchived` if `list` may not be written.
pub async fn check_writable<S: GrantStore>(store: &S, list: &List) -> Result<()> {
    check_target_writable(store, Target::of(list)).await
}

pub async fn check_target_writable<S: GrantStore>(store: &S, target: Target) -> Result<()> {
    match archived_cause(store, target).await? {
        Some(cause) => {
            debug!(?target, %cause, "write blocked by archive guard");
            Err(cause.into())
        }
        None => Ok(()),
    }
}

/// Fail with `NamespaceArchived` if `namespace` may not be written.
pub async fn check_namespace_writable<S: GrantStore>(store: &S, namespace: NamespaceId) -> Result<()> {
    match namespace_cause(store, namespace).await? {
        Some(cause) => Err(cause.into()),
        None => Ok(()),
    }
}

/// Archived cause for writes into `namespace` itself.
pub async fn namespace_cause<S: GrantStore>(store: &S, namespace: NamespaceId) -> Result<Option<Archived>> {
    let ns = store
        .get_namespace(namespace)
        .await?
        .ok_or(Error::NamespaceNotFound(namespace))?;
    Ok(ns.archived.then_some(Archived::Namespace(ns.id)))
}
