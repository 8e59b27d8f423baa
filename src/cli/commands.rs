#[cfg(feature = "folder-picker")]
use crate::core::folder_picker::select_folder;
use crate::core::packer::pack_repository_with;
use crate::domain::models::{
    DEFAULT_IGNORED_DIRECTORIES, DEFAULT_IGNORED_EXTENSIONS, DEFAULT_OUTPUT_FILE, IgnoreRules,
    PackConfig,
};
use crate::infra::file_system::PackProgress;
use crate::infra::logger::setup_logger;
use crate::infra::output::{write_notice, write_summary};
use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repo-packer")]
#[command(about = "Pack a repository folder into a single AI-friendly text file", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Concatenate every text file under a folder into one output file
    Pack {
        /// Repository folder; opens the folder picker when omitted
        #[arg(long)]
        path: Option<String>,

        #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
        output: String,

        /// Comma-separated file name suffixes to skip
        #[arg(long = "ignore-ext", default_value = DEFAULT_IGNORED_EXTENSIONS)]
        ignore_ext: String,

        /// Comma-separated directory names to prune
        #[arg(long = "ignore-dirs", default_value = DEFAULT_IGNORED_DIRECTORIES)]
        ignore_dirs: String,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logger(cli.verbose)?;

    match cli.command {
        Commands::Pack {
            path,
            output,
            ignore_ext,
            ignore_dirs,
        } => {
            info!("Starting pack command");
            debug!(
                "Command parameters: path={:?}, output={}, ignore_ext={}, ignore_dirs={}",
                path, output, ignore_ext, ignore_dirs
            );

            let Some(root) = resolve_root(path)? else {
                write_notice(&mut io::stdout(), "No folder selected.")?;
                return Ok(());
            };

            let config = build_config(root, output, &ignore_ext, &ignore_dirs);
            pack(&config)?;
        }
    }
    Ok(())
}

fn build_config(root: PathBuf, output: String, ignore_ext: &str, ignore_dirs: &str) -> PackConfig {
    PackConfig {
        root_path: root,
        output_path: PathBuf::from(output),
        rules: IgnoreRules::from_lists(ignore_ext, ignore_dirs),
    }
}

fn resolve_root(path: Option<String>) -> anyhow::Result<Option<PathBuf>> {
    match path {
        Some(path) => Ok(Some(PathBuf::from(path))),
        None => pick_folder(),
    }
}

#[cfg(feature = "folder-picker")]
fn pick_folder() -> anyhow::Result<Option<PathBuf>> {
    let start = std::env::current_dir().context("Cannot determine the current directory")?;
    select_folder(&start)
}

#[cfg(not(feature = "folder-picker"))]
fn pick_folder() -> anyhow::Result<Option<PathBuf>> {
    anyhow::bail!("--path is required when built without the folder-picker feature")
}

fn pack(config: &PackConfig) -> anyhow::Result<()> {
    if !config.root_path.is_dir() {
        anyhow::bail!(
            "Please select a valid repository folder or enter a valid path: {}",
            config.root_path.display()
        );
    }

    let mut progress = PackProgress::new();
    let report = pack_repository_with(config, |event| {
        if let Err(e) = progress.update(event) {
            debug!("Progress display failed: {}", e);
        }
    })
    .with_context(|| format!("Failed to pack {}", config.root_path.display()))?;

    let mut stdout = io::stdout();
    progress.finish(&report)?;
    write_summary(&mut stdout, &report)?;
    Ok(())
}
