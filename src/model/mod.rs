//! Data models for cbt.
//!
//! - Block markup tree ([`Document`], [`Block`], [`Node`])
//! - Pattern items (the theme-file side)
//! - Posts (the content-store side)

pub mod block;
pub mod pattern;
pub mod post;

pub use block::{Attributes, Block, Document, Node};
pub use pattern::{PatternItem, SyncStatus};
pub use post::{NewPost, Post, PostType, PostUpdate};
