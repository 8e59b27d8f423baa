use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_FILE: &str = "packed_repo.txt";
pub const DEFAULT_IGNORED_EXTENSIONS: &str = ".exe, .png, .jpg, .pdf, .zip, .tar";
pub const DEFAULT_IGNORED_DIRECTORIES: &str = ".git, node_modules, __pycache__";

/// Extension-suffix and directory-name exclusions applied during a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    pub extensions: Vec<String>,
    pub directories: Vec<String>,
}

impl IgnoreRules {
    pub fn new(extensions: Vec<String>, directories: Vec<String>) -> Self {
        Self {
            extensions: extensions.into_iter().filter(|e| !e.is_empty()).collect(),
            directories: directories.into_iter().filter(|d| !d.is_empty()).collect(),
        }
    }

    /// Builds rules from two comma-separated lists, as typed on the command line.
    pub fn from_lists(extensions: &str, directories: &str) -> Self {
        Self::new(parse_list(extensions), parse_list(directories))
    }

    pub fn ignores_file(&self, file_name: &str) -> bool {
        self.extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
    }

    pub fn ignores_dir(&self, dir_name: &str) -> bool {
        self.directories.iter().any(|dir| dir == dir_name)
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct PackConfig {
    pub root_path: PathBuf,
    pub output_path: PathBuf,
    pub rules: IgnoreRules,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct PackReport {
    pub output_path: PathBuf,
    /// Paths relative to the root, in the order they were written.
    pub packed: Vec<PathBuf>,
    pub ignored_count: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Emitted once per file the packer visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackEvent<'a> {
    Packed(&'a Path),
    Ignored(&'a Path),
    Unreadable(&'a Path),
}
