use std::path::PathBuf;

use clap::{Parser, Subcommand};
use newsdesk::catalog::ContentKind;

/// Developer CLI for checking content documents and previewing pages
#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Preview, list and validate the site's content collections", long_about = None)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Site root the endpoints resolve against
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Read `data/<kind>.json` from this directory instead of over HTTP
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the content kinds and their endpoints
    Kinds,
    /// Render a public page region and print its markup
    Render {
        kind: ContentKind,
        /// Only records flagged as featured
        #[arg(long)]
        featured: bool,
    },
    /// Load a collection into the editor and print its rows
    List {
        kind: ContentKind,
    },
    /// Report records that would be dropped by validation on save
    Check {
        kind: ContentKind,
    },
}
