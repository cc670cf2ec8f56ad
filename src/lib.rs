//! Version Stamp - build date/time metadata for filesystem images
//!
//! This library captures the build time once and writes it as a small
//! `version.json` record that a packaging step bundles into the device image.

pub mod clock;
pub mod config;
pub mod inspect;
pub mod stamp;
pub mod types;
