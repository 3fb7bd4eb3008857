//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// cbt - move block patterns and templates between a site and its theme
#[derive(Parser, Debug)]
#[command(name = "cbt", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.cbt/data/content.db)
    #[arg(long, global = true, env = "CBT_DB")]
    pub db: Option<PathBuf>,

    /// Theme directory (default: walk up from the current directory to style.css)
    #[arg(long, global = true, env = "CBT_THEME")]
    pub theme: Option<PathBuf>,

    /// Actor name for audit trail
    #[arg(long, global = true, env = "CBT_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the content database
    Init {
        /// Overwrite existing database
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Show what is pending between the theme and the content store
    Status,

    /// Import theme pattern files into the content store and registry
    Import(ImportArgs),

    /// Export stored patterns (and optionally templates) into the theme
    Export(ExportArgs),

    /// Run export transforms over a markup file and print the result
    Transform(TransformArgs),

    /// Turn direct references to a pattern into slug references across the theme
    RewriteRefs {
        /// Row id referenced as `{"ref":<id>}`
        #[arg(long)]
        id: i64,

        /// Slug to reference instead
        #[arg(long)]
        slug: String,
    },

    /// Theme pattern files
    Patterns {
        #[command(subcommand)]
        command: PatternCommands,
    },

    /// Content-store rows
    Post {
        #[command(subcommand)]
        command: PostCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Sync Commands
// ============================================================================

#[derive(Args, Debug, Default)]
pub struct ImportArgs {
    /// Re-register patterns that are already registered
    #[arg(long)]
    pub force_register: bool,

    /// Overwrite stored synced patterns with the file body
    #[arg(long)]
    pub prefer_file: bool,

    /// Show non-synced patterns in the inserter
    #[arg(long)]
    pub show_unsynced: bool,
}

#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Wrap visible text in translation calls
    #[arg(long)]
    pub localize_text: bool,

    /// Keep navigation menu references
    #[arg(long)]
    pub keep_nav_refs: bool,

    /// Leave media URLs pointing at the site
    #[arg(long)]
    pub no_localize_images: bool,

    /// Also export template and template-part customizations
    #[arg(long)]
    pub templates: bool,

    /// Report what would be written without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Copy media from this uploads directory instead of downloading it
    #[arg(long, requires = "site_url")]
    pub uploads_dir: Option<PathBuf>,

    /// Site URL the uploads directory is served under
    #[arg(long, requires = "uploads_dir")]
    pub site_url: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct TransformArgs {
    /// Markup file to transform (`-` for stdin)
    pub file: PathBuf,

    /// Strip per-install fields
    #[arg(long)]
    pub normalize: bool,

    /// Wrap visible text in translation calls
    #[arg(long)]
    pub localize_text: bool,

    /// Rewrite media URLs to theme asset paths
    #[arg(long)]
    pub localize_images: bool,

    /// Keep navigation menu references when normalizing
    #[arg(long)]
    pub keep_nav_refs: bool,

    /// Text domain (default: the active theme's)
    #[arg(long)]
    pub text_domain: Option<String>,
}

// ============================================================================
// Pattern Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum PatternCommands {
    /// List theme patterns (active theme first, then parent)
    List {
        /// Only synced patterns
        #[arg(long, conflicts_with = "unsynced")]
        synced: bool,

        /// Only non-synced patterns
        #[arg(long)]
        unsynced: bool,
    },

    /// Delete a pattern file (and its row, for a numeric id)
    Delete {
        /// Row id or synthetic id (`CBT_<slug>`)
        id: String,
    },
}

// ============================================================================
// Post Commands
// ============================================================================

/// Post type names accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PostKind {
    #[default]
    Pattern,
    Template,
    TemplatePart,
}

#[derive(Subcommand, Debug)]
pub enum PostCommands {
    /// Create a row
    Create {
        /// Title
        title: String,

        /// Block markup
        #[arg(short, long, conflicts_with = "file")]
        content: Option<String>,

        /// Read block markup from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Post type
        #[arg(short = 't', long = "type", value_enum, default_value_t)]
        kind: PostKind,

        /// Slug (`post_name`; default: sanitized title)
        #[arg(long)]
        name: Option<String>,

        /// Create a non-synced pattern
        #[arg(long)]
        unsynced: bool,

        /// Comma-separated category slugs
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,

        /// Theme a template customization belongs to (default: the active theme)
        #[arg(long = "for-theme")]
        for_theme: Option<String>,
    },

    /// List rows
    List {
        /// Post type
        #[arg(short = 't', long = "type", value_enum, default_value_t)]
        kind: PostKind,
    },

    /// Show the audit trail of a row
    History {
        /// Row id
        id: i64,

        /// Maximum events to return
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
}
