//! Content-store post command implementations.

use crate::cli::commands::{open_storage, theme_dir};
use crate::cli::{PostCommands, PostKind};
use crate::config::resolve_theme;
use crate::error::{Error, Result};
use crate::model::post::PATTERN_CATEGORY_TAXONOMY;
use crate::model::{NewPost, Post, PostType};
use crate::storage::ContentStore;
use crate::validate::sanitize_title;
use serde::Serialize;
use std::path::PathBuf;

impl From<PostKind> for PostType {
    fn from(kind: PostKind) -> Self {
        match kind {
            PostKind::Pattern => Self::Block,
            PostKind::Template => Self::Template,
            PostKind::TemplatePart => Self::TemplatePart,
        }
    }
}

/// Output for post create.
#[derive(Serialize)]
struct PostCreateOutput {
    id: i64,
    name: String,
    post_type: PostType,
}

/// Output for post list.
#[derive(Serialize)]
struct PostListOutput {
    posts: Vec<Post>,
    count: usize,
}

/// Output for post history.
#[derive(Serialize)]
struct HistoryOutput {
    id: i64,
    events: Vec<HistoryEvent>,
}

#[derive(Serialize)]
struct HistoryEvent {
    event_type: &'static str,
    actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_value: Option<String>,
    created_at: i64,
}

/// Execute post commands.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the command fails.
pub fn execute(
    command: &PostCommands,
    db_path: Option<&PathBuf>,
    theme: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        PostCommands::Create {
            title,
            content,
            file,
            kind,
            name,
            unsynced,
            categories,
            for_theme,
        } => {
            let body = match (content, file) {
                (Some(content), _) => content.clone(),
                (None, Some(path)) => std::fs::read_to_string(path)?,
                (None, None) => String::new(),
            };
            let post_type = PostType::from(*kind);
            let new_post = build_post(
                post_type,
                title,
                body,
                name.as_deref(),
                *unsynced,
                for_theme.clone(),
                theme,
            )?;
            create(&new_post, categories, db_path, actor, json)
        }
        PostCommands::List { kind } => list(PostType::from(*kind), db_path, json),
        PostCommands::History { id, limit } => history(*id, *limit, db_path, json),
    }
}

fn build_post(
    post_type: PostType,
    title: &str,
    content: String,
    name: Option<&str>,
    unsynced: bool,
    for_theme: Option<String>,
    theme: Option<&PathBuf>,
) -> Result<NewPost> {
    let name = name.map_or_else(|| sanitize_title(title), ToString::to_string);
    if name.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "cannot derive a slug from title '{title}'; pass --name"
        )));
    }

    let mut post = NewPost {
        post_type,
        ..NewPost::pattern(name, title, content)
    };
    match post_type {
        PostType::Block => {
            if unsynced {
                post = post.unsynced();
            }
        }
        PostType::Template | PostType::TemplatePart => {
            if unsynced {
                return Err(Error::InvalidArgument(
                    "--unsynced only applies to patterns".to_string(),
                ));
            }
            post.theme = match for_theme {
                Some(slug) => Some(slug),
                None => Some(resolve_theme(theme_dir(theme))?.slug()),
            };
        }
    }
    Ok(post)
}

fn create(
    post: &NewPost,
    categories: &[String],
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut storage = open_storage(db_path, actor)?;
    let id = storage.create_post(post)?;
    if !categories.is_empty() && post.post_type == PostType::Block {
        storage.set_post_terms(id, PATTERN_CATEGORY_TAXONOMY, categories)?;
    }

    if json {
        let output = PostCreateOutput {
            id,
            name: post.name.clone(),
            post_type: post.post_type,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Created {} {id}: {}", post.post_type.as_str(), post.name);
    }

    Ok(())
}

fn list(post_type: PostType, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path, None)?;
    let posts = storage.list_posts(post_type)?;

    if json {
        let output = PostListOutput {
            count: posts.len(),
            posts,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if posts.is_empty() {
        println!("No {} rows.", post_type.as_str());
        return Ok(());
    }

    for post in &posts {
        let mut flags = Vec::new();
        if post.is_unsynced() {
            flags.push("unsynced".to_string());
        }
        if let Some(theme) = &post.theme {
            flags.push(format!("theme: {theme}"));
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        println!("  {:<6} {:<32} {}{flags}", post.id, post.name, post.title);
    }

    Ok(())
}

fn history(id: i64, limit: u32, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path, None)?;
    let events = storage.post_history(id, Some(limit))?;
    if events.is_empty() && storage.get_post(id)?.is_none() {
        return Err(Error::PostNotFound { id });
    }

    if json {
        let output = HistoryOutput {
            id,
            events: events
                .into_iter()
                .map(|e| HistoryEvent {
                    event_type: e.event_type.as_str(),
                    actor: e.actor,
                    operation: e.comment,
                    old_value: e.old_value,
                    new_value: e.new_value,
                    created_at: e.created_at,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("History of post {id}:");
    for event in &events {
        let when = chrono::DateTime::from_timestamp_millis(event.created_at)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!("  {when}  {:<24} {}", event.event_type.as_str(), event.actor);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_pattern_defaults_name_to_title() {
        let post = build_post(PostType::Block, "My Hero", String::new(), None, true, None, None).unwrap();
        assert_eq!(post.name, "my-hero");
        assert!(post.sync_status.is_some());
        assert!(post.theme.is_none());
    }

    #[test]
    fn test_build_template_with_explicit_theme() {
        let post = build_post(
            PostType::Template,
            "Index",
            "<p>x</p>".to_string(),
            Some("index"),
            false,
            Some("my-theme".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(post.post_type, PostType::Template);
        assert_eq!(post.theme.as_deref(), Some("my-theme"));
    }

    #[test]
    fn test_build_rejects_unsynced_template() {
        let result = build_post(
            PostType::TemplatePart,
            "Header",
            String::new(),
            None,
            true,
            Some("t".to_string()),
            None,
        );
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_build_rejects_empty_slug() {
        let result = build_post(PostType::Block, "!!!", String::new(), None, false, None, None);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
