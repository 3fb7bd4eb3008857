//! Content store for cbt.
//!
//! The sync engine talks to the database side through [`ContentStore`].
//! [`SqliteStorage`] implements it with:
//! - WAL mode for concurrent reads
//! - Transaction discipline for atomic writes
//! - Audit events for history
//!
//! # Submodules
//!
//! - [`events`] - Audit event storage
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - SQLite storage implementation

pub mod events;
pub mod schema;
pub mod sqlite;

pub use sqlite::{MutationContext, SqliteStorage};

use crate::error::Result;
use crate::model::{NewPost, Post, PostType, PostUpdate};

/// Numbered posts holding block markup, plus their taxonomy terms.
pub trait ContentStore {
    /// All posts of a type, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_posts(&self, post_type: PostType) -> Result<Vec<Post>>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_post(&self, id: i64) -> Result<Option<Post>>;

    /// First post of `post_type` whose `post_name` equals `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn find_post_by_slug(&self, post_type: PostType, name: &str) -> Result<Option<Post>>;

    /// Insert a post and return its new id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn create_post(&mut self, post: &NewPost) -> Result<i64>;

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::PostNotFound`] if the row is absent.
    fn update_post(&mut self, id: i64, update: &PostUpdate) -> Result<()>;

    /// Delete a post and its term relationships. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete_post(&mut self, id: i64) -> Result<bool>;

    /// Term slugs of a post in a taxonomy, in assignment order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn post_terms(&self, post_id: i64, taxonomy: &str) -> Result<Vec<String>>;

    /// Replace a post's terms in a taxonomy, creating missing terms.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails.
    fn set_post_terms(&mut self, post_id: i64, taxonomy: &str, terms: &[String]) -> Result<()>;

    /// Delete the template and template-part customizations of `theme`
    /// (and rows with no theme), except the ids in `keep`. Returns how many
    /// rows were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn clear_template_customizations(&mut self, theme: &str, keep: &[i64]) -> Result<usize>;
}
