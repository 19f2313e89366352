use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Reads identifiers one per line, in file order. Surrounding whitespace is
/// trimmed and blank lines are skipped.
pub async fn read_id_list(path: &Path) -> Result<Vec<String>> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open id list {}", path.display()))?;

    let mut ids = Vec::new();
    let mut lines = BufReader::new(file).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("failed to read id list {}", path.display()))?
    {
        let id = line.trim();
        if !id.is_empty() {
            ids.push(id.to_string());
        }
    }

    Ok(ids)
}
