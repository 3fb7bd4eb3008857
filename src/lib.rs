//! cbt - Create Block Theme sync and transformation core
//!
//! This crate moves block patterns and templates between a site's content
//! store and a block theme on disk, and provides the `cbt` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (block tree, pattern items, posts)
//! - [`storage`] - Content store trait and SQLite implementation
//! - [`sync`] - Import/export engine and markup transforms
//! - [`registry`] - Pattern registry the importer feeds
//! - [`interceptor`] - Pattern resource request interception
//! - [`config`] - Theme and database resolution
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod model;
pub mod registry;
pub mod storage;
pub mod sync;
pub mod validate;

pub use error::{Error, Result};
