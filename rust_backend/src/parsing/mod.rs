//! Parsers for registry export formats.
//!
//! # Parsers
//!
//! - [`records`]: encounter records (one JSON object per patient encounter)
//! - [`site_rows`]: aggregated per-site statistics rows
//!
//! Raw rows keep every cell as loosely typed as the export delivers it; the
//! `TryFrom` conversions into domain types are where data-quality errors are
//! raised.
//!
//! # Example
//!
//! ```no_run
//! use resq_rust::parsing::records::parse_encounters_json;
//! use std::path::Path;
//!
//! let raw = parse_encounters_json(Path::new("encounters.json"))
//!     .expect("Failed to parse encounters");
//! ```

pub mod records;
pub mod site_rows;

pub use records::{parse_date, RawEncounter};
pub use site_rows::{lenient_number, RawSiteRow};
