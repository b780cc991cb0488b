//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use dsfetch::DEFAULT_MAX_RETRIES;
use dsfetch::manifest::DEFAULT_IMAGE_BASE_URL;
use dsfetch::mirror::DEFAULT_MIRROR_BASE_URL;

/// Batch downloader for public imaging and geospatial datasets.
///
/// Fetches medical-image series referenced by TCIA `.tcia` manifest files,
/// and mirrors static file trees published behind HTML directory listings.
#[derive(Parser, Debug)]
#[command(name = "dsfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands: the two dataset-retrieval front ends.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download every series listed in the .tcia manifests under a dataset root
    Manifest {
        /// Dataset root scanned recursively for .tcia manifest files
        root: PathBuf,

        /// Base URL of the imaging archive API
        #[arg(long, default_value = DEFAULT_IMAGE_BASE_URL)]
        base_url: String,

        /// Maximum attempts per series, including the first (1-10)
        #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
        max_retries: u8,
    },

    /// Mirror a static file tree exposed via directory-listing index pages
    Mirror {
        /// Seed paths relative to the base URL (index pages and/or files);
        /// defaults to the Massachusetts roads dataset
        paths: Vec<String>,

        /// Base URL the seed paths are relative to
        #[arg(long, default_value = DEFAULT_MIRROR_BASE_URL)]
        base_url: String,

        /// Local directory the remote hierarchy is mirrored under
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}
