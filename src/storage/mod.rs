//! Append-only JSONL journal of runs and price signals

pub mod runs;
pub mod signals;

pub use runs::*;
pub use signals::*;

use anyhow::Result;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Appends `record` as one JSON line, creating the file and its directory.
pub fn append_jsonl<T: Serialize>(path: impl AsRef<Path>, record: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    writeln!(file, "{}", serde_json::to_string(record)?)?;
    Ok(())
}
