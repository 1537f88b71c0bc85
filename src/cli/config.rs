// config.rs - Configuration file support

use crate::core::scoring::ScoringWeights;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub spart: Option<String>,
    pub coordinates: Option<String>,
    pub document_coordinates: Option<bool>,
    pub morphometrics: Option<String>,
    pub sequences: Option<Vec<String>>,
    pub constraints: Option<String>,
    pub output: Option<String>,
    pub scores_output: Option<String>,
    pub format: Option<String>,

    // Concordance settings
    pub cooccurrence_threshold: Option<f64>,
    pub significance_threshold: Option<f64>,
    pub distance_method: Option<String>,

    // Performance
    pub threads: Option<usize>,

    // Spartition filtering
    pub include_spartitions: Option<String>,
    pub exclude_spartitions: Option<String>,
    pub include_spartitions_list: Option<String>,
    pub exclude_spartitions_list: Option<String>,

    // Flags
    pub score: Option<bool>,
    pub dry_run: Option<bool>,
    pub quiet: Option<bool>,

    // Scoring weights
    pub weights: Option<ScoringWeights>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights.clone().unwrap_or_default()
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# concordist.toml - Configuration file for concordist
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Partition document (.json)
spart = "/path/to/partitions.json"

# Coordinate table: id, latitude, longitude (.tsv or .csv)
coordinates = "/path/to/coordinates.tsv"

# Or use the coordinates stored in the partition document
# document_coordinates = true

# Morphometric table: id followed by one column per trait
# morphometrics = "/path/to/morphometrics.tsv"

# FASTA files with allele sequences, one source per file
sequences = ["/path/to/cytb.fasta"]

# Conspecific/heterospecific constraint groups (.json or .toml)
# constraints = "/path/to/constraints.toml"

# Output document
output = "partitions_concordances.json"

# Score table and its format: tsv, csv
# scores_output = "scores.tsv"
format = "tsv"

# =============================================================================
# CONCORDANCE SETTINGS
# =============================================================================

# Co-occurrence distance threshold (km)
cooccurrence_threshold = 5.0

# Significance threshold recorded with morphometric p-values
significance_threshold = 0.05

# Distance method for co-occurrence: geodesic, great-circle
distance_method = "geodesic"

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of threads (omit for auto-detection)
# threads = 8

# =============================================================================
# SPARTITION FILTERING
# =============================================================================

# Process only spartitions matching regex pattern
# include_spartitions = "^asap.*"

# Skip spartitions matching regex pattern
# exclude_spartitions = "draft.*"

# Spartition labels listed in a file (one label per line)
# include_spartitions_list = "selected.txt"
# exclude_spartitions_list = "rejected.txt"

# =============================================================================
# FLAGS
# =============================================================================

# Score the document after profiling
score = true

# Validate inputs without computation (dry run)
dry_run = false

# Hide progress bars
quiet = false

# =============================================================================
# SCORING WEIGHTS
# =============================================================================

# Weight per concordance label (0 disables it, unlisted labels weigh 1.0)
# Every label listed here must exist in the scored document
[weights.concordances]
# "polygon overlap area" = 0.0
# "co-occurrence gap" = 0.0

# Weight per evidence type: Geography, Molecular, Morphology (default 1.0)
[weights.evidence_types]
Geography = 1.0
Molecular = 2.0

# Divide each weight by the total enabled weight of its evidence type
[weights.normalize]
Morphology = true
"#
        .to_string()
    }
}
