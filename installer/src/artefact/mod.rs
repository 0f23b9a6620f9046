//! Fetching and unpacking toolchain artefacts.
//!
//! - [`download`]: HTTP transfers for archives, signatures, and API pages.
//! - [`extraction`]: tarball and installer-package unpacking.
//! - [`signature`]: GPG key setup and detached-signature verification.

pub mod download;
pub mod extraction;
pub mod signature;
