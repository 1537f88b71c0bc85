// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: &Config) -> Self {
        // Input/Output
        if self.spart.is_none() {
            self.spart = config.spart.clone();
        }
        if self.coordinates.is_none() {
            self.coordinates = config.coordinates.clone();
        }
        if !self.document_coordinates && config.document_coordinates.unwrap_or(false) {
            self.document_coordinates = true;
        }
        if self.morphometrics.is_none() {
            self.morphometrics = config.morphometrics.clone();
        }
        if self.sequences.is_empty() {
            if let Some(sequences) = &config.sequences {
                self.sequences = sequences.clone();
            }
        }
        if self.constraints.is_none() {
            self.constraints = config.constraints.clone();
        }
        if self.output.is_none() {
            self.output = config.output.clone();
        }
        if self.scores_output.is_none() {
            self.scores_output = config.scores_output.clone();
        }

        // Settings (only override defaults, not explicit CLI values)
        if let (true, Some(format)) = (self.format == "tsv", &config.format) {
            self.format = format.clone();
        }
        if let (true, Some(threshold)) = (self.cooccurrence_threshold == 5.0, config.cooccurrence_threshold) {
            self.cooccurrence_threshold = threshold;
        }
        if let (true, Some(threshold)) = (self.significance_threshold == 0.05, config.significance_threshold) {
            self.significance_threshold = threshold;
        }
        if let (true, Some(method)) = (self.distance_method == "geodesic", &config.distance_method) {
            self.distance_method = method.clone();
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }

        // Spartition filtering
        if self.include_spartitions.is_none() {
            self.include_spartitions = config.include_spartitions.clone();
        }
        if self.exclude_spartitions.is_none() {
            self.exclude_spartitions = config.exclude_spartitions.clone();
        }
        if self.include_spartitions_list.is_none() {
            self.include_spartitions_list = config.include_spartitions_list.clone();
        }
        if self.exclude_spartitions_list.is_none() {
            self.exclude_spartitions_list = config.exclude_spartitions_list.clone();
        }

        // Flags (config only sets what the command line left off)
        if !self.score && config.score.unwrap_or(false) {
            self.score = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }
        if !self.quiet && config.quiet.unwrap_or(false) {
            self.quiet = true;
        }

        self
    }

    /// Load configuration and merge with CLI args; the configuration is
    /// returned as well for the settings that have no CLI counterpart
    pub fn with_config_file(self, config_path: &str) -> Result<(Self, Config), String> {
        let config = Config::from_file(config_path)?;
        let merged = self.merge_with_config(&config);
        Ok((merged, config))
    }
}
