//! Tickdev Common Library
//!
//! This crate provides shared constants, configuration loading utilities
//! and the character-device contract for all tickdev workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - System-wide capacities and default timings
//! - [`config`] - Configuration loading traits and types
//! - [`device`] - The `CharDevice` trait and error taxonomy
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use tickdev_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod device;
pub mod prelude;
