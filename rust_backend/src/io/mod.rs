//! High-level data loading utilities.
//!
//! This module provides loaders that combine the parsers with format checks
//! and error context, plus a JSON writer for reconciled records and awarded
//! site rows.
//!
//! # Example
//!
//! ```no_run
//! use resq_rust::io::loaders::SiteRowLoader;
//! use std::path::Path;
//!
//! let rows = SiteRowLoader::load_from_file(Path::new("sites.json"))
//!     .expect("Failed to load");
//! println!("Loaded {} site rows", rows.len());
//! ```

pub mod loaders;


pub use loaders::{write_json, EncounterLoader, SiteRowLoader};
