//! setup-swift installer library.
//!
//! This crate resolves a Swift version specifier to a downloadable toolchain
//! build and installs it on a CI runner: cached in the tool cache, added to
//! PATH, and selected where the platform needs it. It is used by the
//! `setup-swift` binary and can be driven programmatically with stub
//! services for testing.
//!
//! # Modules
//!
//! - [`artefact`] - Downloading, unpacking, and signature verification
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - External command execution
//! - [`config`] - Settings resolved from arguments and environment
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Semantic error types
//! - [`install`] - Per-platform install strategies and the install driver
//! - [`output`] - User-facing messages
//! - [`package`] - Download coordinates for toolchain builds
//! - [`resolution`] - Stable-then-snapshot version resolution
//! - [`setup`] - End-to-end orchestration
//! - [`snapshot`] - Snapshot specifier parsing and tag lookup
//! - [`tool_cache`] - Durable toolchain cache
//! - [`toolchain`] - Installed toolchain probing

pub mod artefact;
pub mod cli;
pub mod command;
pub mod config;
pub mod dirs;
pub mod error;
pub mod install;
pub mod output;
pub mod package;
pub mod resolution;
pub mod setup;
pub mod snapshot;
pub mod tool_cache;
pub mod toolchain;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
