//! locsync keeps nested JSON locale files in sync with a source language.
//!
//! Only leaves whose source text changed since the last run (or that were
//! forced) are sent to a translation provider. The source is translated into
//! a pivot language first, and the pivot into every other target.

pub mod cli;
pub mod config;
pub mod core;
pub mod issues;
pub mod provider;
pub mod utils;
