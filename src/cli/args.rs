// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// concordist - Concordance profiling and scoring of species partitions
pub struct Args {
    /// path to the partition document (.json)
    #[argh(option)]
    pub spart: Option<String>,

    /// coordinate table: id, latitude, longitude (.tsv or .csv)
    #[argh(option)]
    pub coordinates: Option<String>,

    /// use the coordinates stored in the partition document
    #[argh(switch)]
    pub document_coordinates: bool,

    /// morphometric table: id followed by one column per trait (.tsv or .csv)
    #[argh(option)]
    pub morphometrics: Option<String>,

    /// FASTA file with allele sequences (repeatable, one source per file)
    #[argh(option)]
    pub sequences: Vec<String>,

    /// constraint groups (.json or .toml) used when scoring
    #[argh(option)]
    pub constraints: Option<String>,

    /// output document (default: <spart>_concordances.json, or <spart>_scored.json with --score)
    #[argh(option)]
    pub output: Option<String>,

    /// write a score table to this file
    #[argh(option)]
    pub scores_output: Option<String>,

    /// score table format: tsv, csv (default: tsv)
    #[argh(option, default = "String::from(\"tsv\")")]
    pub format: String,

    /// co-occurrence distance threshold in km (default: 5.0)
    #[argh(option, default = "5.0")]
    pub cooccurrence_threshold: f64,

    /// significance threshold recorded with the morphometric p-values (default: 0.05)
    #[argh(option, default = "0.05")]
    pub significance_threshold: f64,

    /// distance method for co-occurrence: geodesic, great-circle (default: geodesic)
    #[argh(option, default = "String::from(\"geodesic\")")]
    pub distance_method: String,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// process only spartitions whose label matches this regex
    #[argh(option)]
    pub include_spartitions: Option<String>,

    /// skip spartitions whose label matches this regex
    #[argh(option)]
    pub exclude_spartitions: Option<String>,

    /// process only spartitions listed in a file (one label per line)
    #[argh(option)]
    pub include_spartitions_list: Option<String>,

    /// skip spartitions listed in a file (one label per line)
    #[argh(option)]
    pub exclude_spartitions_list: Option<String>,

    /// score the document (after profiling, when evidence is given)
    #[argh(switch)]
    pub score: bool,

    /// print the spartitions and concordances of a document and exit
    #[argh(option)]
    pub inspect: Option<String>,

    /// validate inputs without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// hide progress bars
    #[argh(switch)]
    pub quiet: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
