// validation.rs - Input validation utilities

use crate::cli::args::Args;
use crate::core::{DistanceMethod, SpartitionFilter};
use crate::output::ScoreFormat;
use regex::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

pub struct ValidationResult {
    pub distance_method: DistanceMethod,
    pub format: ScoreFormat,
    pub filter: SpartitionFilter,
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    let spart = args.spart.as_ref().ok_or("--spart is required")?;

    // Something to do
    let has_evidence = args.coordinates.is_some()
        || args.document_coordinates
        || args.morphometrics.is_some()
        || !args.sequences.is_empty();
    if !has_evidence && !args.score {
        return Err(
            "Nothing to do: give --coordinates, --document-coordinates, --morphometrics or --sequences to profile, or --score"
                .to_string(),
        );
    }
    if args.coordinates.is_some() && args.document_coordinates {
        return Err("--coordinates and --document-coordinates are mutually exclusive".to_string());
    }
    if args.constraints.is_some() && !args.score {
        return Err("--constraints is only used together with --score".to_string());
    }

    // Input files must exist
    let inputs = std::iter::once(spart)
        .chain(args.coordinates.iter())
        .chain(args.morphometrics.iter())
        .chain(args.sequences.iter())
        .chain(args.constraints.iter());
    for path in inputs {
        if !Path::new(path).is_file() {
            return Err(format!("Input file not found: {}", path));
        }
    }

    // Validate thresholds
    if !args.cooccurrence_threshold.is_finite() || args.cooccurrence_threshold < 0.0 {
        return Err("Co-occurrence threshold must be a non-negative number of km".to_string());
    }
    if !(args.significance_threshold > 0.0 && args.significance_threshold <= 1.0) {
        return Err("Significance threshold must be in (0.0, 1.0]".to_string());
    }
    if args.threads == Some(0) {
        return Err("--threads must be at least 1".to_string());
    }

    let distance_method = DistanceMethod::from_str(&args.distance_method)?;
    let format = ScoreFormat::from_str(&args.format)?;

    // Compile regex patterns
    let include = if let Some(pattern) = &args.include_spartitions {
        Some(Regex::new(pattern).map_err(|e| format!("Invalid include_spartitions regex: {}", e))?)
    } else {
        None
    };

    let exclude = if let Some(pattern) = &args.exclude_spartitions {
        Some(Regex::new(pattern).map_err(|e| format!("Invalid exclude_spartitions regex: {}", e))?)
    } else {
        None
    };

    // Load filter sets from files
    let include_labels = if let Some(file_path) = &args.include_spartitions_list {
        Some(load_set_from_file(file_path)?)
    } else {
        None
    };

    let exclude_labels = if let Some(file_path) = &args.exclude_spartitions_list {
        Some(load_set_from_file(file_path)?)
    } else {
        None
    };

    Ok(ValidationResult {
        distance_method,
        format,
        filter: SpartitionFilter {
            include,
            exclude,
            include_labels,
            exclude_labels,
        },
    })
}

/// Load a set of strings from a file (one per line)
fn load_set_from_file(file_path: &str) -> Result<HashSet<String>, String> {
    let file = File::open(file_path)
        .map_err(|e| format!("Failed to open filter file '{}': {}", file_path, e))?;

    let reader = BufReader::new(file);
    let mut set = HashSet::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            format!("Failed to read line {} from '{}': {}", line_num + 1, file_path, e)
        })?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            set.insert(trimmed.to_string());
        }
    }

    println!("📋 Loaded {} items from filter file '{}'", set.len(), file_path);
    Ok(set)
}
