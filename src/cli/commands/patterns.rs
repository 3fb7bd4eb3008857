//! Theme pattern command implementations.
//!
//! Both commands go through [`PatternInterceptor`], the same path the
//! editor's pattern requests take, so the CLI sees file-only patterns under
//! their synthetic `CBT_<slug>` ids.

use crate::cli::PatternCommands;
use crate::cli::commands::{open_storage, theme_dir};
use crate::config::resolve_theme;
use crate::error::{Error, Result};
use crate::interceptor::{
    BLOCKS_ROUTE, Dispatch, Method, PatternId, PatternInterceptor, PatternResponse,
    ResourceRequest,
};
use crate::model::pattern::slug_from_synthetic_id;
use crate::storage::ContentStore;
use crate::validate::find_similar_slugs;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// Output for patterns list.
#[derive(Serialize)]
struct PatternListOutput {
    patterns: Vec<PatternResponse>,
    count: usize,
}

/// Execute pattern commands.
///
/// # Errors
///
/// Returns an error if the theme or database cannot be opened, or the
/// pattern to delete does not exist.
pub fn execute(
    command: &PatternCommands,
    db_path: Option<&PathBuf>,
    theme: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        PatternCommands::List { synced, unsynced } => {
            list(*synced, *unsynced, db_path, theme, json)
        }
        PatternCommands::Delete { id } => delete(id, db_path, theme, actor, json),
    }
}

fn list(
    synced_only: bool,
    unsynced_only: bool,
    db_path: Option<&PathBuf>,
    theme: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let config = resolve_theme(theme_dir(theme))?;
    let storage = open_storage(db_path, None)?;
    let interceptor = PatternInterceptor::load(&storage, &config.file_store())?;

    let patterns: Vec<PatternResponse> = interceptor
        .patterns()
        .iter()
        .filter(|p| !synced_only || p.is_synced())
        .filter(|p| !unsynced_only || !p.is_synced())
        .map(PatternResponse::from_item)
        .collect();

    if json {
        let output = PatternListOutput {
            count: patterns.len(),
            patterns,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if patterns.is_empty() {
        println!("No patterns found in {}.", config.root.display());
        return Ok(());
    }

    println!("{} pattern(s):", patterns.len());
    for pattern in &patterns {
        let kind = if pattern.wp_pattern_sync_status.is_empty() {
            "synced".green()
        } else {
            "unsynced".normal()
        };
        println!(
            "  {:<12} {:<40} [{kind}] {}",
            display_id(&pattern.id),
            pattern.slug,
            pattern.title.raw.as_deref().unwrap_or("").dimmed()
        );
    }

    Ok(())
}

fn delete(
    id: &str,
    db_path: Option<&PathBuf>,
    theme: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = resolve_theme(theme_dir(theme))?;
    let files = config.file_store();
    let mut storage = open_storage(db_path, actor)?;
    let mut interceptor = PatternInterceptor::load(&storage, &files)?;

    let request = ResourceRequest::new(Method::Delete, format!("{BLOCKS_ROUTE}/{id}"));
    let deleted = match interceptor.pre_dispatch(&request, &mut storage, &files)? {
        Dispatch::Respond(pattern) => pattern,
        Dispatch::Continue => return Err(not_found(id, &interceptor, &storage)?),
    };

    if json {
        println!("{}", serde_json::to_string(&deleted)?);
    } else {
        println!("Deleted pattern: {}", deleted.slug);
        if let Some(path) = &deleted.file_path {
            println!("  File: {}", path.display());
        }
        if let PatternId::Post(row) = deleted.id {
            println!("  Row:  {row}");
        }
    }

    Ok(())
}

/// Build the error for an id the interceptor did not recognise.
fn not_found(id: &str, interceptor: &PatternInterceptor, store: &dyn ContentStore) -> Result<Error> {
    if let Ok(row) = id.parse::<i64>() {
        return Ok(match store.get_post(row)? {
            Some(post) => Error::PatternNotFound { slug: post.name },
            None => Error::PostNotFound { id: row },
        });
    }

    let Some(slug) = slug_from_synthetic_id(id) else {
        return Ok(Error::InvalidArgument(format!(
            "expected a row id or CBT_<slug>, got '{id}'"
        )));
    };

    let known: Vec<String> = interceptor.patterns().iter().map(|p| p.slug.clone()).collect();
    let similar = find_similar_slugs(slug, &known, 3);
    Ok(if similar.is_empty() {
        Error::PatternNotFound {
            slug: slug.to_string(),
        }
    } else {
        Error::PatternNotFoundSimilar {
            slug: slug.to_string(),
            similar,
        }
    })
}

fn display_id(id: &PatternId) -> String {
    match id {
        PatternId::Post(row) => row.to_string(),
        PatternId::Synthetic(synthetic) => synthetic.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewPost;
    use crate::model::PatternItem;
    use crate::storage::SqliteStorage;

    #[test]
    fn test_not_found_suggests_similar_slugs() {
        let store = SqliteStorage::open_memory().unwrap();
        let interceptor = PatternInterceptor::new(vec![PatternItem::new("t/hero", "")]);

        let err = not_found("CBT_t/heros", &interceptor, &store).unwrap();
        assert!(
            matches!(err, Error::PatternNotFoundSimilar { ref similar, .. } if similar == &["t/hero".to_string()])
        );
    }

    #[test]
    fn test_not_found_numeric_ids() {
        let mut store = SqliteStorage::open_memory().unwrap();
        let id = store.create_post(&NewPost::pattern("card", "Card", "")).unwrap();
        let interceptor = PatternInterceptor::default();

        assert!(matches!(
            not_found(&id.to_string(), &interceptor, &store).unwrap(),
            Error::PatternNotFound { ref slug } if slug == "card"
        ));
        assert!(matches!(
            not_found("999", &interceptor, &store).unwrap(),
            Error::PostNotFound { id: 999 }
        ));
    }

    #[test]
    fn test_not_found_rejects_garbage_id() {
        let store = SqliteStorage::open_memory().unwrap();
        let err = not_found("hero", &PatternInterceptor::default(), &store).unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
