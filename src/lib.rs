//! Trellis - Access-control resolution for a multi-tenant task backend.
//!
//! Trellis answers one question for every request: what may this principal do
//! with this namespace or list?
//!
//! - **Permission**: The right lattice (None < Read < Write < Admin) and typed proofs
//! - **Namespace**: Rights from namespace ownership and team grants
//! - **List**: Rights from list ownership, direct shares and the parent namespace
//! - **Archive**: The guard that turns archived lists and namespaces read-only
//! - **Principal**: Users and link shares
//! - **Access**: A single `authorize` entry point with typed denial reasons
//! - **Store**: The grant store contract and its libsql implementation
//!
//! # Example
//!
//! ```ignore
//! use trellis::access::{self, Entity};
//! use trellis::{Principal, UserId, level};
//!
//! #[tokio::main]
//! async fn main() -> trellis::Result<()> {
//!     let config = trellis::Loader::default().load(None, Default::default())?;
//!     let store = trellis::SqlStore::open(&config.database.url).await?;
//!
//!     let alice = Principal::user(1);
//!     let ns = store.create_namespace("home", UserId(1)).await?;
//!     let list = store.create_list(ns.id, "groceries", UserId(1)).await?;
//!
//!     let perm = access::require::<level::Write, _>(&store, &alice, Entity::List(list.id)).await?;
//!     let new = trellis::task::NewTask {
//!         list_id: list.id,
//!         title: "milk".into(),
//!         description: None,
//!         priority: 0,
//!         due_date: None,
//!     };
//!     trellis::task::create(&store, perm, new).await?;
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod archive;
pub mod config;
pub mod db;
pub mod error;
pub mod list;
pub mod model;
pub mod namespace;
pub mod permission;
pub mod principal;
pub mod share;
pub mod store;
pub mod task;

// Re-export main types at crate root
pub use access::{Denial, Entity, Verdict, authorize};
pub use config::{Config, Loader};
pub use db::Handle as DbHandle;
pub use error::{Error, Result};
pub use model::{LinkShareId, List, ListId, Namespace, NamespaceId, TaskId, TeamId, UserId};
pub use permission::{Level, Permission, Right, level};
pub use principal::{LinkShare, Principal};
pub use store::{GrantStore, SqlStore};
