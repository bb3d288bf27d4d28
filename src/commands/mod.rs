//! # CLI Command Implementations
//!
//! Each subcommand of `lds-metadata-updater` lives in its own file with:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the global
//!   `--color` value, calls into the `lds_metadata_updater` library and
//!   returns the process exit code.

pub mod run;
pub mod validate;
