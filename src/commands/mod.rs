//! Command drivers behind the CLI subcommands.

mod manifest;
mod mirror;

pub use manifest::{ManifestSettings, run_manifest_command};
pub use mirror::{MirrorSettings, run_mirror_command};
