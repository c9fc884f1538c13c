pub mod scorecard;
pub mod table;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::models::MatchSummary;

/// Paths written by `export_summary`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub document: PathBuf,
    pub table: PathBuf,
}

/// `<team1>_vs_<team2>_Match_Summary`, path separators replaced
pub fn file_stem(summary: &MatchSummary) -> String {
    format!("{}_vs_{}_Match_Summary", summary.team1, summary.team2)
        .replace(['/', '\\'], "_")
}

/// Write the scorecard document and the CSV table into `dir`
pub fn export_summary(summary: &MatchSummary, dir: &Path) -> Result<ExportedFiles> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let stem = file_stem(summary);
    let document = dir.join(format!("{}.txt", stem));
    let table = dir.join(format!("{}.csv", stem));

    std::fs::write(&document, scorecard::render(summary))
        .with_context(|| format!("Failed to write {}", document.display()))?;

    let file = File::create(&table)
        .with_context(|| format!("Failed to create {}", table.display()))?;
    table::write_csv(summary, BufWriter::new(file))?;

    info!(
        "Exported {} and {}",
        document.display(),
        table.display()
    );
    Ok(ExportedFiles { document, table })
}
