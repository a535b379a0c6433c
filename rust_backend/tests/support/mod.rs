//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::Write;
use tempfile::{Builder, NamedTempFile};

/// Write `content` to a temp file ending in `suffix`.
pub fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// Config pinned to a fixed reference year so results do not depend on the clock.
pub const PINNED_CONFIG: &str = r#"
[reconciler]
reference_year = 2024

[award]
min_total_patients = 30
policy = "standard"
"#;
