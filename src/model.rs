//! Entity identifiers and the store-loaded entity records the engine reasons about.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " {}"), self.0)
            }
        }
    };
}

id_type!(
    /// Opaque user identity. The engine never owns user records.
    UserId,
    "user"
);
id_type!(
    /// Opaque team identity.
    TeamId,
    "team"
);
id_type!(NamespaceId, "namespace");
id_type!(ListId, "list");
id_type!(TaskId, "task");
id_type!(LinkShareId, "link share");

impl ListId {
    /// Sentinel id of the per-user Favorites pseudo list. Never persisted.
    pub const FAVORITES: ListId = ListId(-1);

    /// Id carried by a list that has not been created yet.
    pub const UNSAVED: ListId = ListId(0);
}

impl NamespaceId {
    /// Namespace id reported by the Favorites pseudo list.
    pub const FAVORITES: NamespaceId = NamespaceId(-1);
}

/// A namespace as loaded from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: NamespaceId,
    pub title: String,
    pub owner_id: UserId,
    #[serde(default)]
    pub archived: bool,
}

/// A list as loaded from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub title: String,
    pub namespace_id: NamespaceId,
    pub owner_id: UserId,
    #[serde(default)]
    pub archived: bool,
}

impl List {
    /// Synthesize the Favorites pseudo list for `user`.
    ///
    /// The result is built per request and owned by the requesting user only.
    pub fn favorites(user: UserId) -> Self {
        Self {
            id: ListId::FAVORITES,
            title: "Favorites".to_string(),
            namespace_id: NamespaceId::FAVORITES,
            owner_id: user,
            archived: false,
        }
    }

    pub fn is_favorites(&self) -> bool {
        self.id == ListId::FAVORITES
    }
}

/// A team. Membership is a separate fact held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}
