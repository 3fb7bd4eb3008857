//! SQLite storage implementation.
//!
//! This module provides the content store backend using SQLite.
//! It follows the MutationContext pattern for transaction discipline and audit logging.

use crate::error::{Error, Result};
use crate::model::{NewPost, Post, PostType, PostUpdate};
use crate::storage::ContentStore;
use crate::storage::events::{Event, EventType, get_events, insert_event};
use crate::storage::schema::apply_schema;
use crate::validate::sanitize_title;
use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const POST_COLUMNS: &str =
    "id, post_type, post_name, title, content, status, sync_status, theme, created_at, updated_at";

/// Actor recorded on audit events when none is configured.
pub const DEFAULT_ACTOR: &str = "cbt";

/// SQLite-based content store.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
    actor: String,
}

/// Context for a mutation operation, tracking side effects.
///
/// This struct is passed to mutation closures to record audit events
/// that are written in the same transaction.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Actor performing the operation.
    pub actor: String,
    /// Events to write at the end of the transaction.
    pub events: Vec<Event>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            events: Vec::new(),
        }
    }

    /// Record an event for this operation.
    pub fn record_event(&mut self, entity_type: &str, entity_id: &str, event_type: EventType) {
        self.events.push(
            Event::new(entity_type, entity_id, event_type, &self.actor).with_comment(&self.op_name),
        );
    }

    /// Record an event with old/new values for field tracking.
    pub fn record_change(
        &mut self,
        entity_type: &str,
        entity_id: &str,
        event_type: EventType,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        self.events.push(
            Event::new(entity_type, entity_id, event_type, &self.actor)
                .with_values(old_value, new_value)
                .with_comment(&self.op_name),
        );
    }
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self {
            conn,
            actor: DEFAULT_ACTOR.to_string(),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            actor: DEFAULT_ACTOR.to_string(),
        })
    }

    /// Set the actor recorded on audit events.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Begins an IMMEDIATE transaction (for write locking)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Commits (or rolls back on error)
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, &self.actor);

        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;
        debug!(op, events = ctx.events.len(), "mutation committed");

        Ok(result)
    }

    /// Count posts of a type.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_posts(&self, post_type: PostType) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE post_type = ?1",
            [post_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Audit events recorded for a post, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn post_history(&self, id: i64, limit: Option<u32>) -> Result<Vec<Event>> {
        Ok(get_events(&self.conn, "post", &id.to_string(), limit)?)
    }
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let post_type: String = row.get(1)?;
    let post_type = PostType::parse(&post_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::other(format!("unknown post type: {post_type}"))),
        )
    })?;

    Ok(Post {
        id: row.get(0)?,
        post_type,
        name: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        status: row.get(5)?,
        sync_status: row.get(6)?,
        theme: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl ContentStore for SqliteStorage {
    fn list_posts(&self, post_type: PostType) -> Result<Vec<Post>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE post_type = ?1 ORDER BY id ASC"
        ))?;
        let posts = stmt
            .query_map([post_type.as_str()], map_post)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(posts)
    }

    fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let post = self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                [id],
                map_post,
            )
            .optional()?;
        Ok(post)
    }

    fn find_post_by_slug(&self, post_type: PostType, name: &str) -> Result<Option<Post>> {
        let post = self
            .conn
            .query_row(
                &format!(
                    "SELECT {POST_COLUMNS} FROM posts
                     WHERE post_type = ?1 AND post_name = ?2
                     ORDER BY id ASC LIMIT 1"
                ),
                rusqlite::params![post_type.as_str(), name],
                map_post,
            )
            .optional()?;
        Ok(post)
    }

    fn create_post(&mut self, post: &NewPost) -> Result<i64> {
        let now = chrono::Utc::now().timestamp_millis();

        self.mutate("create_post", |tx, ctx| {
            tx.execute(
                "INSERT INTO posts (post_type, post_name, title, content, status, sync_status, theme, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 'publish', ?5, ?6, ?7, ?7)",
                rusqlite::params![
                    post.post_type.as_str(),
                    post.name,
                    post.title,
                    post.content,
                    post.sync_status,
                    post.theme,
                    now
                ],
            )?;
            let id = tx.last_insert_rowid();

            ctx.record_change(
                "post",
                &id.to_string(),
                EventType::PostCreated,
                None,
                Some(post.name.clone()),
            );
            Ok(id)
        })
    }

    fn update_post(&mut self, id: i64, update: &PostUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let now = chrono::Utc::now().timestamp_millis();

        self.mutate("update_post", |tx, ctx| {
            let old_name: Option<String> = tx
                .query_row("SELECT post_name FROM posts WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            let Some(old_name) = old_name else {
                return Err(Error::PostNotFound { id });
            };

            tx.execute(
                "UPDATE posts SET
                    post_name = COALESCE(?2, post_name),
                    title = COALESCE(?3, title),
                    content = COALESCE(?4, content),
                    updated_at = ?5
                 WHERE id = ?1",
                rusqlite::params![id, update.name, update.title, update.content, now],
            )?;

            ctx.record_change(
                "post",
                &id.to_string(),
                EventType::PostUpdated,
                Some(old_name),
                update.name.clone(),
            );
            Ok(())
        })
    }

    fn delete_post(&mut self, id: i64) -> Result<bool> {
        self.mutate("delete_post", |tx, ctx| {
            let deleted = tx.execute("DELETE FROM posts WHERE id = ?1", [id])? > 0;
            if deleted {
                ctx.record_event("post", &id.to_string(), EventType::PostDeleted);
            }
            Ok(deleted)
        })
    }

    fn post_terms(&self, post_id: i64, taxonomy: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.slug FROM terms t
             JOIN term_relationships tr ON tr.term_id = t.id
             WHERE tr.post_id = ?1 AND t.taxonomy = ?2
             ORDER BY tr.term_order ASC, t.slug ASC",
        )?;
        let terms = stmt
            .query_map(rusqlite::params![post_id, taxonomy], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(terms)
    }

    fn set_post_terms(&mut self, post_id: i64, taxonomy: &str, terms: &[String]) -> Result<()> {
        self.mutate("set_post_terms", |tx, ctx| {
            tx.execute(
                "DELETE FROM term_relationships
                 WHERE post_id = ?1
                   AND term_id IN (SELECT id FROM terms WHERE taxonomy = ?2)",
                rusqlite::params![post_id, taxonomy],
            )?;

            for (order, name) in terms.iter().enumerate() {
                let slug = sanitize_title(name);
                if slug.is_empty() {
                    continue;
                }
                tx.execute(
                    "INSERT OR IGNORE INTO terms (taxonomy, slug, name) VALUES (?1, ?2, ?3)",
                    rusqlite::params![taxonomy, slug, name],
                )?;
                let term_id: i64 = tx.query_row(
                    "SELECT id FROM terms WHERE taxonomy = ?1 AND slug = ?2",
                    rusqlite::params![taxonomy, slug],
                    |row| row.get(0),
                )?;
                tx.execute(
                    "INSERT OR IGNORE INTO term_relationships (post_id, term_id, term_order)
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![post_id, term_id, i64::try_from(order).unwrap_or(i64::MAX)],
                )?;
            }

            ctx.record_change(
                "post",
                &post_id.to_string(),
                EventType::TermsAssigned,
                None,
                Some(terms.join(", ")),
            );
            Ok(())
        })
    }

    fn clear_template_customizations(&mut self, theme: &str, keep: &[i64]) -> Result<usize> {
        self.mutate("clear_template_customizations", |tx, ctx| {
            let ids: Vec<i64> = {
                let mut stmt = tx.prepare(
                    "SELECT id FROM posts
                     WHERE post_type IN ('wp_template', 'wp_template_part')
                       AND (theme = ?1 OR theme IS NULL)",
                )?;
                stmt.query_map([theme], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<i64>>>()?
            };

            let mut cleared = 0;
            for id in ids.into_iter().filter(|id| !keep.contains(id)) {
                cleared += tx.execute("DELETE FROM posts WHERE id = ?1", [id])?;
                ctx.record_event("post", &id.to_string(), EventType::CustomizationsCleared);
            }
            Ok(cleared)
        })
    }
}
