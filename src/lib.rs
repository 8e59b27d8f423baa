//! Packs the text files of a repository folder into a single output file.
//!
//! The walk prunes ignored directory names, skips ignored file-name suffixes,
//! and writes one `--- FILE: <relative/path> ---` record per readable file.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infra;

pub use crate::core::packer::{pack_repository, pack_repository_with};
pub use crate::domain::error::PackError;
pub use crate::domain::models::{IgnoreRules, PackConfig, PackReport};
