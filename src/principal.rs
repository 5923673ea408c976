//! Actors the engine authorizes.
//!
//! A principal is either a user identity or a link share. Link shares are
//! capabilities: whoever presents the token gets exactly the stored right on
//! exactly the stored list and nothing else.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Service;
use crate::error::{Error, Result};
use crate::model::{LinkShareId, ListId, UserId};
use crate::permission::Right;
use crate::store::GrantStore;

/// A capability bound to one list and one right at issue time.
///
/// There is no API to change the right of an issued share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkShare {
    pub id: LinkShareId,
    pub list_id: ListId,
    pub right: Right,
    pub shared_by: UserId,
}

impl LinkShare {
    /// The right this share grants on `list`.
    pub fn right_on(&self, list: ListId) -> Right {
        if list == self.list_id {
            self.right
        } else {
            Right::None
        }
    }
}

/// Who is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    User(UserId),
    LinkShare(LinkShare),
}

impl Principal {
    pub fn user(id: i64) -> Self {
        Principal::User(UserId(id))
    }

    /// The user identity, if this principal has one.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Principal::User(id) => Some(*id),
            Principal::LinkShare(_) => None,
        }
    }
}

impl From<UserId> for Principal {
    fn from(id: UserId) -> Self {
        Principal::User(id)
    }
}

impl From<LinkShare> for Principal {
    fn from(share: LinkShare) -> Self {
        Principal::LinkShare(share)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::User(id) => write!(f, "{id}"),
            Principal::LinkShare(share) => write!(f, "{}", share.id),
        }
    }
}

/// Generate a fresh, unguessable link share token.
pub fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Resolve a presented link share token into a principal.
pub async fn resolve_link_share<S: GrantStore>(
    store: &S,
    service: &Service,
    token: &str,
) -> Result<Principal> {
    if !service.enable_link_sharing {
        return Err(Error::LinkSharingDisabled);
    }
    if token.is_empty() {
        return Err(Error::InvalidLinkShare);
    }

    let share = store
        .link_share_by_token(token)
        .await?
        .ok_or(Error::InvalidLinkShare)?;
    debug!(share = %share.id, list = %share.list_id, right = %share.right, "link share resolved");
    Ok(Principal::LinkShare(share))
}
