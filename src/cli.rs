use clap::{Args, Parser, Subcommand};
use doc_splitter::Language;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "doc-split")]
#[command(about = "Split language-conditional documentation into per-language pages")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Build configuration file (JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the whole documentation tree
    Build(BuildArgs),

    /// Split individual files into one file per language
    Split(SplitArgs),

    /// Validate conditional blocks without writing output
    Check(CheckArgs),

    /// Show the lowercase-redirect decision for request paths
    Normalize(NormalizeArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Source directory (overrides config)
    #[arg(long, value_name = "DIR")]
    pub src: Option<PathBuf>,

    /// Build output directory (overrides config)
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Write build-manifest.json into the build directory
    #[arg(long)]
    pub manifest: bool,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Markdown/MDX files to split
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Output directory; each language gets its own subdirectory
    #[arg(short, long, default_value = "./output")]
    pub out: PathBuf,

    /// Target languages (defaults to the configured languages)
    #[arg(short, long = "language", value_name = "LANG")]
    pub languages: Vec<Language>,

    /// Force overwrite existing output files
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Files or directories to validate (defaults to the configured source directory)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct NormalizeArgs {
    /// Request paths, optionally with a query string
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<String>,

    /// Print decisions as JSON
    #[arg(long)]
    pub json: bool,
}
