//! Tasks, the main consumer of list rights.
//!
//! Reading a task needs Read on its list. Every mutation needs Write on the
//! list and passes the archive guard. The task is always re-fetched by id
//! before deciding, so the list a caller claims a task lives in is never
//! trusted.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, instrument};

use crate::access::{self, Entity};
use crate::error::{Error, Result};
use crate::model::{ListId, TaskId, UserId};
use crate::permission::{Level, Permission, level};
use crate::principal::Principal;
use crate::store::{GrantStore, SqlStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub list_id: ListId,
    pub title: String,
    pub description: Option<String>,
    pub done: bool,
    pub priority: i64,
    /// Unix seconds.
    pub due_date: Option<i64>,
    pub created_by: UserId,
}

/// A task that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub list_id: ListId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub due_date: Option<i64>,
}

/// A partial update.
///
/// An absent field keeps the stored value. `description` and `due_date` can
/// also be cleared with an explicit `null`. A zero or empty value is a value
/// like any other and is written as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<i64>>,
    /// Move the task to another list.
    #[serde(default)]
    pub list_id: Option<ListId>,
}

// Present-but-null must become Some(None) rather than collapse into None.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Patch {
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(done) = self.done {
            task.done = done;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(list_id) = self.list_id {
            task.list_id = list_id;
        }
    }
}

/// Load a task `principal` may read.
#[instrument(level = "debug", skip(store, principal), fields(principal = %principal))]
pub async fn read<S: GrantStore>(store: &S, principal: &Principal, id: TaskId) -> Result<Task> {
    let task = load(store, id).await?;
    access::require::<level::Read, _>(store, principal, Entity::List(task.list_id)).await?;
    Ok(task)
}

/// Store `new` in the list `perm` was issued for.
///
/// The proof is checked again against the store before the insert, so a grant
/// revoked or a list archived after the proof was issued still stops the write.
/// Link shares create tasks on behalf of the user who issued them.
#[instrument(level = "debug", skip(store, perm, new), fields(author = %perm.principal(), list = %new.list_id))]
pub async fn create(store: &SqlStore, perm: Permission<level::Write>, new: NewTask) -> Result<Task> {
    let entity = Entity::List(new.list_id);
    if perm.entity() != entity {
        return Err(Error::Forbidden {
            entity,
            need: level::Write::RIGHT,
        });
    }
    if new.list_id == ListId::FAVORITES {
        return Err(Error::BadRequest("tasks cannot be created in Favorites".into()));
    }
    validate_title(&new.title)?;

    let author = perm.principal();
    access::require::<level::Write, _>(store, author, entity).await?;

    let created_by = match author {
        Principal::User(user) => *user,
        Principal::LinkShare(share) => share.shared_by,
    };
    let task = store.insert_task(&new, created_by).await?;
    debug!(task = %task.id, "task created");
    Ok(task)
}

/// Apply `patch` to task `id`.
///
/// Moving a task also needs Write on the destination list.
#[instrument(level = "debug", skip(store, principal, patch), fields(principal = %principal))]
pub async fn update(store: &SqlStore, principal: &Principal, id: TaskId, patch: Patch) -> Result<Task> {
    let mut task = load(store, id).await?;
    access::require::<level::Write, _>(store, principal, Entity::List(task.list_id)).await?;

    if let Some(dest) = patch.list_id
        && dest != task.list_id
    {
        if dest == ListId::FAVORITES {
            return Err(Error::BadRequest("tasks cannot be moved to Favorites".into()));
        }
        access::require::<level::Write, _>(store, principal, Entity::List(dest)).await?;
    }

    patch.apply(&mut task);
    validate_title(&task.title)?;
    store.save_task(&task).await?;
    debug!(task = %task.id, list = %task.list_id, "task updated");
    Ok(task)
}

#[instrument(level = "debug", skip(store, principal), fields(principal = %principal))]
pub async fn delete(store: &SqlStore, principal: &Principal, id: TaskId) -> Result<()> {
    let task = load(store, id).await?;
    access::require::<level::Write, _>(store, principal, Entity::List(task.list_id)).await?;
    store.remove_task(task.id).await?;
    debug!(task = %task.id, "task deleted");
    Ok(())
}

async fn load<S: GrantStore>(store: &S, id: TaskId) -> Result<Task> {
    store.get_task(id).await?.ok_or(Error::TaskNotFound(id))
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::BadRequest("task title must not be empty".into()));
    }
    Ok(())
}
