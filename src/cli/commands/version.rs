//! Version command implementation.
//!
//! Besides the binary version, reports the content-store schema and the
//! pattern header fields this build reads and writes.

use crate::error::Result;
use crate::storage::schema::CURRENT_SCHEMA_VERSION;
use crate::sync::codec::PATTERN_FIELDS;
use serde::Serialize;

#[derive(Serialize, Debug, PartialEq, Eq)]
struct VersionOutput {
    name: &'static str,
    version: &'static str,
    profile: &'static str,
    schema_version: i32,
    pattern_fields: &'static [&'static str],
}

impl VersionOutput {
    fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            profile: if cfg!(debug_assertions) { "dev" } else { "release" },
            schema_version: CURRENT_SCHEMA_VERSION,
            pattern_fields: PATTERN_FIELDS,
        }
    }
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let info = VersionOutput::current();

    if json {
        println!("{}", serde_json::to_string(&info)?);
        return Ok(());
    }

    println!("cbt {} ({})", info.version, info.profile);
    println!("  content store schema: v{}", info.schema_version);
    println!("  pattern header fields: {}", info.pattern_fields.join(", "));
    Ok(())
}
