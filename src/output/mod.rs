// mod.rs - Output writers module

use crate::data::SpartDocument;
use crate::error::{ConcordanceError, Result};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Score table layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreFormat {
    #[default]
    Tsv,
    Csv,
}

impl FromStr for ScoreFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsv" => Ok(ScoreFormat::Tsv),
            "csv" => Ok(ScoreFormat::Csv),
            _ => Err(format!("Unsupported format: {}. Use: tsv, csv", s)),
        }
    }
}

impl ScoreFormat {
    pub fn delimiter(&self) -> char {
        match self {
            ScoreFormat::Tsv => '\t',
            ScoreFormat::Csv => ',',
        }
    }
}

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(|e| ConcordanceError::io(parent, e))?;
        }
    }
    Ok(())
}

/// `<dir>/<stem><suffix>.json` next to the input document
pub fn derived_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "spart".to_string());
    input.with_file_name(format!("{}{}.json", stem, suffix))
}

/// Write the whole document as pretty-printed JSON
pub fn write_document(path: &Path, document: &SpartDocument) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = document.to_json_pretty()?;
    std::fs::write(path, json).map_err(|e| ConcordanceError::io(path, e))?;
    log::info!("Document written to {}", path.display());
    Ok(())
}

/// Score table with provenance header lines, one row per scored spartition
pub fn write_score_table<W: Write>(
    writer: &mut W,
    document: &SpartDocument,
    format: ScoreFormat,
    command_line: &str,
) -> std::io::Result<usize> {
    let sep = format.delimiter();
    writeln!(writer, "# Command: {}", command_line)?;
    writeln!(
        writer,
        "# Generated: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(writer, "# concordist v{}", env!("CARGO_PKG_VERSION"))?;

    let header = ["spartition", "subsets", "CSU", "CSW", "CSWC", "CC", "HC"];
    writeln!(writer, "{}", header.join(sep.to_string().as_str()))?;

    let mut rows = 0;
    for spartition in &document.spartitions {
        let Some(score) = spartition.score else {
            continue;
        };
        writeln!(
            writer,
            "{label}{sep}{subsets}{sep}{csu:.6}{sep}{csw:.6}{sep}{cswc:.6}{sep}{cc}{sep}{hc}",
            label = spartition.label,
            subsets = spartition.subsets.len(),
            csu = score.csu,
            csw = score.csw,
            cswc = score.cswc,
            cc = score.cc,
            hc = score.hc,
            sep = sep,
        )?;
        rows += 1;
    }
    Ok(rows)
}

/// Write the score table to a file
pub fn write_scores(
    path: &Path,
    document: &SpartDocument,
    format: ScoreFormat,
    command_line: &str,
) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| ConcordanceError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let rows = write_score_table(&mut writer, document, format, command_line)
        .map_err(|e| ConcordanceError::io(path, e))?;
    writer.flush().map_err(|e| ConcordanceError::io(path, e))?;
    log::info!("Score table written to {} ({} rows)", path.display(), rows);
    Ok(())
}
