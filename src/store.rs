//! The grant store: the query contract the engine resolves against, and its
//! libsql implementation.
//!
//! The engine only ever reads through [`GrantStore`]. Every call observes the
//! store as it is at that moment; nothing is cached between decisions, so a
//! grant change takes effect on the next check.

use std::future::Future;

use libsql::{Connection, Row, Value, params};
use tracing::debug;

use crate::archive::ArchiveState;
use crate::db::{self, Handle};
use crate::error::{Error, Result};
use crate::model::{LinkShareId, List, ListId, Namespace, NamespaceId, Team, TaskId, TeamId, UserId};
use crate::permission::Right;
use crate::principal::{self, LinkShare};
use crate::task::{NewTask, Task};

/// What to match when listing lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Search {
    #[default]
    Any,
    Ids(Vec<ListId>),
    Title(String),
}

impl Search {
    /// Whether `list` passes this search. Title matching ignores ASCII case,
    /// like SQL `LIKE`.
    pub fn matches(&self, list: &List) -> bool {
        match self {
            Search::Any => true,
            Search::Ids(ids) => ids.is_empty() || ids.contains(&list.id),
            Search::Title(title) => list
                .title
                .to_ascii_lowercase()
                .contains(&title.to_ascii_lowercase()),
        }
    }
}

/// A resolved, bounded list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Search,
    pub include_archived: bool,
    pub limit: u32,
    pub offset: u32,
}

/// Read-side contract of the grant store.
pub trait GrantStore: Send + Sync {
    /// Ids of every team `user` is a direct member of.
    fn teams_containing(&self, user: UserId) -> impl Future<Output = Result<Vec<TeamId>>> + Send;

    /// Highest right any of `teams` holds on `namespace`.
    fn namespace_grant(
        &self,
        namespace: NamespaceId,
        teams: &[TeamId],
    ) -> impl Future<Output = Result<Right>> + Send;

    /// Highest right `user` holds on `list` through a direct user share or a
    /// direct team share of any of `teams`.
    fn list_grant(
        &self,
        list: ListId,
        user: UserId,
        teams: &[TeamId],
    ) -> impl Future<Output = Result<Right>> + Send;

    fn get_namespace(
        &self,
        id: NamespaceId,
    ) -> impl Future<Output = Result<Option<Namespace>>> + Send;

    fn get_list(&self, id: ListId) -> impl Future<Output = Result<Option<List>>> + Send;

    /// Archived bits of a list and its namespace, read in one query.
    fn archive_state(
        &self,
        list: ListId,
    ) -> impl Future<Output = Result<Option<ArchiveState>>> + Send;

    fn link_share_by_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<LinkShare>>> + Send;

    fn get_task(&self, id: TaskId) -> impl Future<Output = Result<Option<Task>>> + Send;

    /// Every list `user` reaches through any grant path, filtered and paged.
    fn lists_for_user(
        &self,
        user: UserId,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Vec<List>>> + Send;

    /// Number of lists `lists_for_user` would return without paging.
    fn count_lists_for_user(
        &self,
        user: UserId,
        query: &ListQuery,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Whether `user` has favorited at least one task on a list they can
    /// still reach.
    fn has_favorites(&self, user: UserId) -> impl Future<Output = Result<bool>> + Send;
}

/// Grant store backed by a libsql connection.
#[derive(Clone)]
pub struct SqlStore {
    // Keeps in-memory databases alive for as long as the store exists
    _db: Handle,
    conn: Connection,
}

impl SqlStore {
    /// Connect to `url`, apply the schema and return a ready store.
    pub async fn open(url: &str) -> Result<Self> {
        let db = Handle::new(db::connect(url).await?);
        let conn = db::connection(&db)?;
        db::migrate(&conn).await?;
        Ok(Self { _db: db, conn })
    }

    /// An isolated in-memory store.
    pub async fn in_memory() -> Result<Self> {
        Self::open(":memory:").await
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn fetch_one<T>(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
        map: impl Fn(&Row) -> Result<T>,
    ) -> Result<Option<T>> {
        let mut rows = self.conn.query(sql, params).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map(&row)?)),
            None => Ok(None),
        }
    }

    async fn fetch_all<T>(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
        map: impl Fn(&Row) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map(&row)?);
        }
        Ok(out)
    }

    async fn max_right(&self, sql: &str, params: Vec<Value>) -> Result<Right> {
        let stored = self
            .fetch_one(sql, params, |row| Ok(row.get::<Option<i64>>(0)?))
            .await?
            .flatten();
        stored.map_or(Ok(Right::None), Right::from_stored)
    }

    // Entity management. These writes belong to the sharing endpoints, not to
    // the resolution engine; the engine only reads what they leave behind.

    pub async fn create_namespace(&self, title: &str, owner: UserId) -> Result<Namespace> {
        self.conn
            .execute(
                "INSERT INTO namespaces (title, owner_id) VALUES (?1, ?2)",
                params![title, owner.get()],
            )
            .await?;
        let id = NamespaceId(self.conn.last_insert_rowid());
        debug!(namespace = %id, owner = %owner, "namespace created");
        Ok(Namespace {
            id,
            title: title.to_string(),
            owner_id: owner,
            archived: false,
        })
    }

    pub async fn create_list(
        &self,
        namespace: NamespaceId,
        title: &str,
        owner: UserId,
    ) -> Result<List> {
        if self.get_namespace(namespace).await?.is_none() {
            return Err(Error::NamespaceNotFound(namespace));
        }
        self.conn
            .execute(
                "INSERT INTO lists (title, namespace_id, owner_id) VALUES (?1, ?2, ?3)",
                params![title, namespace.get(), owner.get()],
            )
            .await?;
        let id = ListId(self.conn.last_insert_rowid());
        debug!(list = %id, namespace = %namespace, owner = %owner, "list created");
        Ok(List {
            id,
            title: title.to_string(),
            namespace_id: namespace,
            owner_id: owner,
            archived: false,
        })
    }

    pub async fn delete_list(&self, list: ListId) -> Result<()> {
        for sql in [
            "DELETE FROM favorites WHERE task_id IN (SELECT id FROM tasks WHERE list_id = ?1)",
            "DELETE FROM tasks WHERE list_id = ?1",
            "DELETE FROM team_lists WHERE list_id = ?1",
            "DELETE FROM users_lists WHERE list_id = ?1",
            "DELETE FROM link_shares WHERE list_id = ?1",
            "DELETE FROM lists WHERE id = ?1",
        ] {
            self.conn.execute(sql, params![list.get()]).await?;
        }
        Ok(())
    }

    pub async fn create_team(&self, name: &str) -> Result<Team> {
        self.conn
            .execute("INSERT INTO teams (name) VALUES (?1)", params![name])
            .await?;
        Ok(Team {
            id: TeamId(self.conn.last_insert_rowid()),
            name: name.to_string(),
        })
    }

    pub async fn add_team_member(&self, team: TeamId, user: UserId) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO team_members (team_id, user_id) VALUES (?1, ?2)",
                params![team.get(), user.get()],
            )
            .await?;
        Ok(())
    }

    pub async fn remove_team_member(&self, team: TeamId, user: UserId) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM team_members WHERE team_id = ?1 AND user_id = ?2",
                params![team.get(), user.get()],
            )
            .await?;
        Ok(())
    }

    /// Grant `right` to `team` on `namespace`, replacing any earlier grant.
    pub async fn grant_namespace_team(
        &self,
        namespace: NamespaceId,
        team: TeamId,
        right: Right,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO team_namespaces (team_id, namespace_id, level) VALUES (?1, ?2, ?3) \
                 ON CONFLICT (team_id, namespace_id) DO UPDATE SET level = excluded.level",
                params![team.get(), namespace.get(), right.to_stored()?],
            )
            .await?;
        Ok(())
    }

    /// Grant `right` to `team` on `list`, replacing any earlier grant.
    pub async fn grant_list_team(&self, list: ListId, team: TeamId, right: Right) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO team_lists (team_id, list_id, level) VALUES (?1, ?2, ?3) \
                 ON CONFLICT (team_id, list_id) DO UPDATE SET level = excluded.level",
                params![team.get(), list.get(), right.to_stored()?],
            )
            .await?;
        Ok(())
    }

    /// Grant `right` to `user` on `list`, replacing any earlier grant.
    pub async fn grant_list_user(&self, list: ListId, user: UserId, right: Right) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO users_lists (user_id, list_id, level) VALUES (?1, ?2, ?3) \
                 ON CONFLICT (user_id, list_id) DO UPDATE SET level = excluded.level",
                params![user.get(), list.get(), right.to_stored()?],
            )
            .await?;
        Ok(())
    }

    pub async fn revoke_namespace_team(&self, namespace: NamespaceId, team: TeamId) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM team_namespaces WHERE team_id = ?1 AND namespace_id = ?2",
                params![team.get(), namespace.get()],
            )
            .await?;
        Ok(())
    }

    pub async fn revoke_list_team(&self, list: ListId, team: TeamId) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM team_lists WHERE team_id = ?1 AND list_id = ?2",
                params![team.get(), list.get()],
            )
            .await?;
        Ok(())
    }

    pub async fn revoke_list_user(&self, list: ListId, user: UserId) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM users_lists WHERE user_id = ?1 AND list_id = ?2",
                params![user.get(), list.get()],
            )
            .await?;
        Ok(())
    }

    pub async fn set_namespace_archived(&self, namespace: NamespaceId, archived: bool) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE namespaces SET is_archived = ?1 WHERE id = ?2",
                params![archived as i64, namespace.get()],
            )
            .await?;
        if changed == 0 {
            return Err(Error::NamespaceNotFound(namespace));
        }
        Ok(())
    }

    pub async fn set_list_archived(&self, list: ListId, archived: bool) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE lists SET is_archived = ?1 WHERE id = ?2",
                params![archived as i64, list.get()],
            )
            .await?;
        if changed == 0 {
            return Err(Error::ListNotFound(list));
        }
        Ok(())
    }

    /// Persist a new link share and return it with its token.
    pub async fn insert_link_share(
        &self,
        list: ListId,
        right: Right,
        shared_by: UserId,
    ) -> Result<(LinkShare, String)> {
        let token = principal::new_token();
        self.conn
            .execute(
                "INSERT INTO link_shares (token, list_id, level, shared_by) VALUES (?1, ?2, ?3, ?4)",
                params![token.as_str(), list.get(), right.to_stored()?, shared_by.get()],
            )
            .await?;
        let share = LinkShare {
            id: LinkShareId(self.conn.last_insert_rowid()),
            list_id: list,
            right,
            shared_by,
        };
        Ok((share, token))
    }

    pub async fn insert_task(&self, new: &NewTask, created_by: UserId) -> Result<Task> {
        self.conn
            .execute(
                "INSERT INTO tasks (list_id, title, description, done, priority, due_date, created_by) \
                 VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6)",
                vec![
                    Value::Integer(new.list_id.get()),
                    Value::Text(new.title.clone()),
                    opt_text(new.description.clone()),
                    Value::Integer(new.priority),
                    opt_integer(new.due_date),
                    Value::Integer(created_by.get()),
                ],
            )
            .await?;
        let id = TaskId(self.conn.last_insert_rowid());
        self.get_task(id).await?.ok_or(Error::TaskNotFound(id))
    }

    pub async fn save_task(&self, task: &Task) -> Result<()> {
        self.conn
            .execute(
                "UPDATE tasks SET list_id = ?1, title = ?2, description = ?3, done = ?4, \
                 priority = ?5, due_date = ?6 WHERE id = ?7",
                vec![
                    Value::Integer(task.list_id.get()),
                    Value::Text(task.title.clone()),
                    opt_text(task.description.clone()),
                    Value::Integer(task.done as i64),
                    Value::Integer(task.priority),
                    opt_integer(task.due_date),
                    Value::Integer(task.id.get()),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn remove_task(&self, task: TaskId) -> Result<()> {
        self.conn
            .execute("DELETE FROM favorites WHERE task_id = ?1", params![task.get()])
            .await?;
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![task.get()])
            .await?;
        Ok(())
    }

    pub async fn add_favorite(&self, user: UserId, task: TaskId) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO favorites (user_id, task_id) VALUES (?1, ?2)",
                params![user.get(), task.get()],
            )
            .await?;
        Ok(())
    }
}

impl GrantStore for SqlStore {
    async fn teams_containing(&self, user: UserId) -> Result<Vec<TeamId>> {
        self.fetch_all(
            "SELECT team_id FROM team_members WHERE user_id = ?1 ORDER BY team_id",
            params![user.get()],
            |row| Ok(TeamId(row.get::<i64>(0)?)),
        )
        .await
    }

    async fn namespace_grant(&self, namespace: NamespaceId, teams: &[TeamId]) -> Result<Right> {
        if teams.is_empty() {
            return Ok(Right::None);
        }
        let mut values = vec![Value::Integer(namespace.get())];
        let placeholders = bind_ids(&mut values, teams.iter().map(|t| t.get()));
        let sql = format!(
            "SELECT MAX(level) FROM team_namespaces WHERE namespace_id = ?1 AND team_id IN ({placeholders})"
        );
        self.max_right(&sql, values).await
    }

    async fn list_grant(&self, list: ListId, user: UserId, teams: &[TeamId]) -> Result<Right> {
        let mut values = vec![Value::Integer(list.get()), Value::Integer(user.get())];
        let sql = if teams.is_empty() {
            "SELECT MAX(level) FROM users_lists WHERE list_id = ?1 AND user_id = ?2".to_string()
        } else {
            let placeholders = bind_ids(&mut values, teams.iter().map(|t| t.get()));
            format!(
                "SELECT MAX(level) FROM ( \
                     SELECT level FROM users_lists WHERE list_id = ?1 AND user_id = ?2 \
                     UNION ALL \
                     SELECT level FROM team_lists WHERE list_id = ?1 AND team_id IN ({placeholders}) \
                 )"
            )
        };
        self.max_right(&sql, values).await
    }

    async fn get_namespace(&self, id: NamespaceId) -> Result<Option<Namespace>> {
        self.fetch_one(
            "SELECT id, title, owner_id, is_archived FROM namespaces WHERE id = ?1",
            params![id.get()],
            |row| {
                Ok(Namespace {
                    id: NamespaceId(row.get::<i64>(0)?),
                    title: row.get::<String>(1)?,
                    owner_id: UserId(row.get::<i64>(2)?),
                    archived: row.get::<i64>(3)? != 0,
                })
            },
        )
        .await
    }

    async fn get_list(&self, id: ListId) -> Result<Option<List>> {
        if id.get() < 1 {
            return Ok(None);
        }
        self.fetch_one(
            "SELECT id, title, namespace_id, owner_id, is_archived FROM lists WHERE id = ?1",
            params![id.get()],
            list_from_row,
        )
        .await
    }

    async fn archive_state(&self, list: ListId) -> Result<Option<ArchiveState>> {
        self.fetch_one(
            "SELECT l.is_archived, l.namespace_id, n.is_archived \
             FROM lists l LEFT JOIN namespaces n ON n.id = l.namespace_id \
             WHERE l.id = ?1",
            params![list.get()],
            |row| {
                Ok(ArchiveState {
                    list_archived: row.get::<i64>(0)? != 0,
                    namespace_id: NamespaceId(row.get::<i64>(1)?),
                    namespace_archived: row.get::<Option<i64>>(2)?.unwrap_or(0) != 0,
                })
            },
        )
        .await
    }

    async fn link_share_by_token(&self, token: &str) -> Result<Option<LinkShare>> {
        let share = self
            .fetch_one(
                "SELECT id, list_id, level, shared_by FROM link_shares WHERE token = ?1",
                params![token],
                |row| {
                    Ok(LinkShare {
                        id: LinkShareId(row.get::<i64>(0)?),
                        list_id: ListId(row.get::<i64>(1)?),
                        right: Right::from_stored(row.get::<i64>(2)?)?,
                        shared_by: UserId(row.get::<i64>(3)?),
                    })
                },
            )
            .await?;
        Ok(share)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        self.fetch_one(
            "SELECT id, list_id, title, description, done, priority, due_date, created_by \
             FROM tasks WHERE id = ?1",
            params![id.get()],
            |row| {
                Ok(Task {
                    id: TaskId(row.get::<i64>(0)?),
                    list_id: ListId(row.get::<i64>(1)?),
                    title: row.get::<String>(2)?,
                    description: row.get::<Option<String>>(3)?,
                    done: row.get::<i64>(4)? != 0,
                    priority: row.get::<i64>(5)?,
                    due_date: row.get::<Option<i64>>(6)?,
                    created_by: UserId(row.get::<i64>(7)?),
                })
            },
        )
        .await
    }

    async fn lists_for_user(&self, user: UserId, query: &ListQuery) -> Result<Vec<List>> {
        let (filter, mut values) = list_filter(user, query);
        values.push(Value::Integer(i64::from(query.limit)));
        let limit = values.len();
        values.push(Value::Integer(i64::from(query.offset)));
        let offset = values.len();
        let sql = format!(
            "SELECT l.id, l.title, l.namespace_id, l.owner_id, l.is_archived \
             FROM lists l JOIN namespaces n ON n.id = l.namespace_id \
             WHERE {filter} ORDER BY l.id LIMIT ?{limit} OFFSET ?{offset}"
        );
        self.fetch_all(&sql, values, list_from_row).await
    }

    async fn count_lists_for_user(&self, user: UserId, query: &ListQuery) -> Result<u64> {
        let (filter, values) = list_filter(user, query);
        let sql = format!(
            "SELECT COUNT(*) FROM lists l JOIN namespaces n ON n.id = l.namespace_id WHERE {filter}"
        );
        let count = self
            .fetch_one(&sql, values, |row| Ok(row.get::<i64>(0)?))
            .await?
            .unwrap_or(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn has_favorites(&self, user: UserId) -> Result<bool> {
        let sql = format!(
            "SELECT 1 FROM favorites f \
             JOIN tasks t ON t.id = f.task_id \
             JOIN lists l ON l.id = t.list_id \
             JOIN namespaces n ON n.id = l.namespace_id \
             WHERE f.user_id = ?1 AND {REACHABLE} LIMIT 1"
        );
        let found = self
            .fetch_one(&sql, params![user.get()], |_| Ok(()))
            .await?;
        Ok(found.is_some())
    }
}

/// Lists the user bound to `?1` reaches through any grant path. Expects the
/// list aliased `l` and its namespace aliased `n`.
const REACHABLE: &str = "( \
    l.owner_id = ?1 \
    OR n.owner_id = ?1 \
    OR EXISTS (SELECT 1 FROM users_lists ul WHERE ul.list_id = l.id AND ul.user_id = ?1) \
    OR EXISTS (SELECT 1 FROM team_lists tl JOIN team_members tm ON tm.team_id = tl.team_id \
               WHERE tl.list_id = l.id AND tm.user_id = ?1) \
    OR EXISTS (SELECT 1 FROM team_namespaces tn JOIN team_members tm ON tm.team_id = tn.team_id \
               WHERE tn.namespace_id = l.namespace_id AND tm.user_id = ?1) \
)";

/// WHERE clause and its parameters for a user's list query, without paging.
fn list_filter(user: UserId, query: &ListQuery) -> (String, Vec<Value>) {
    let mut values = vec![
        Value::Integer(user.get()),
        Value::Integer(query.include_archived as i64),
    ];
    let search = match &query.search {
        Search::Any => String::new(),
        Search::Ids(ids) if ids.is_empty() => String::new(),
        Search::Ids(ids) => {
            let placeholders = bind_ids(&mut values, ids.iter().map(|id| id.get()));
            format!("AND l.id IN ({placeholders})")
        }
        Search::Title(title) => {
            values.push(Value::Text(format!("%{title}%")));
            format!("AND l.title LIKE ?{}", values.len())
        }
    };
    let filter = format!(
        "{REACHABLE} AND (?2 = 1 OR (l.is_archived = 0 AND n.is_archived = 0)) {search}"
    );
    (filter, values)
}

fn list_from_row(row: &Row) -> Result<List> {
    Ok(List {
        id: ListId(row.get::<i64>(0)?),
        title: row.get::<String>(1)?,
        namespace_id: NamespaceId(row.get::<i64>(2)?),
        owner_id: UserId(row.get::<i64>(3)?),
        archived: row.get::<i64>(4)? != 0,
    })
}

/// Append `ids` as positional parameters and return their placeholder list.
fn bind_ids(values: &mut Vec<Value>, ids: impl Iterator<Item = i64>) -> String {
    let mut placeholders = Vec::new();
    for id in ids {
        values.push(Value::Integer(id));
        placeholders.push(format!("?{}", values.len()));
    }
    placeholders.join(", ")
}

fn opt_text(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::Text)
}

fn opt_integer(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}
