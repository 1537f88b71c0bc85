// main.rs - CLI entry point

use concordist::cli::Config;
use concordist::core::{
    profile_document, score_document, CancelToken, ConcordanceCatalog, Evidence, ProfileSettings,
    SharedHaplotypeStats,
};
use concordist::data::{read_coordinates, read_fasta, read_morphometrics, ConstraintSet};
use concordist::inspector::run_inspector;
use concordist::output::{derived_output_path, write_document, write_scores};
use concordist::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn load_evidence(args: &Args) -> Result<Evidence, String> {
    let mut evidence = Evidence::default();

    if let Some(path) = &args.coordinates {
        let coordinates = read_coordinates(Path::new(path)).map_err(|e| e.to_string())?;
        println!("📍 Coordinates: {} individuals", coordinates.len());
        evidence.coordinates = Some(coordinates);
    }
    if let Some(path) = &args.morphometrics {
        let table = read_morphometrics(Path::new(path)).map_err(|e| e.to_string())?;
        println!("📏 Morphometrics: {} traits", table.traits.len());
        evidence.morphometrics = Some(table);
    }
    for path in &args.sequences {
        let source = read_fasta(Path::new(path)).map_err(|e| e.to_string())?;
        println!("🧬 Sequences '{}': {} records", source.label, source.sequences.len());
        evidence.sequences.push(source);
    }
    Ok(evidence)
}

fn run_main() -> Result<(), String> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    let mut config = Config::new();
    if let Some(config_path) = args.config.clone() {
        let (merged, loaded) = args.with_config_file(&config_path)?;
        args = merged;
        config = loaded;
    }

    // Handle inspector mode
    if let Some(path) = &args.inspect {
        return run_inspector(Path::new(path)).map_err(|e| e.to_string());
    }

    let validation = validate_args(&args)?;
    let spart_path = PathBuf::from(args.spart.as_deref().unwrap_or_default());

    println!("🚀 concordist v{}", concordist::VERSION);

    // Configure thread pool
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        println!("🧵 Threads: {}", n);
    } else {
        let num_threads = rayon::current_num_threads();
        println!("🧵 Threads: {} (auto-detected)", num_threads);
    }

    let total_start = Instant::now();

    let mut document = SpartDocument::from_file(&spart_path).map_err(|e| e.to_string())?;
    println!(
        "📄 Document: {} individuals, {} spartitions",
        document.individuals.len(),
        document.spartitions.len()
    );

    let mut evidence = load_evidence(&args)?;
    if args.document_coordinates {
        evidence = evidence
            .with_document_coordinates(&document)
            .map_err(|e| e.to_string())?;
        println!(
            "📍 Coordinates: {} individuals (from document)",
            evidence.coordinates.as_ref().map_or(0, |c| c.len())
        );
    }
    let profiling = !evidence.is_empty();

    let constraints = match &args.constraints {
        Some(path) => ConstraintSet::from_file(Path::new(path)).map_err(|e| e.to_string())?,
        None => ConstraintSet::default(),
    };
    let weights = config.weights();

    if args.dry_run {
        constraints
            .validate(&document.individual_ids())
            .map_err(|e| e.to_string())?;
        // Labels created by profiling are unknown until it runs
        if args.score && !profiling {
            let catalog = ConcordanceCatalog::from_document(&document).map_err(|e| e.to_string())?;
            weights.resolve(&catalog).map_err(|e| e.to_string())?;
        }
        let selected = document
            .spartitions
            .iter()
            .filter(|s| validation.filter.matches(&s.label))
            .count();
        println!("✅ Dry run completed successfully");
        println!(
            "📊 Selected spartitions: {} of {}",
            selected,
            document.spartitions.len()
        );
        return Ok(());
    }

    let cancel = CancelToken::new();

    if profiling {
        let settings = ProfileSettings {
            cooccurrence_threshold_km: args.cooccurrence_threshold,
            significance_threshold: args.significance_threshold,
            distance_method: validation.distance_method,
            show_progress: !args.quiet,
        };
        println!(
            "🔬 Profiling concordances (distance: {}, co-occurrence threshold: {} km)",
            settings.distance_method.description(),
            settings.cooccurrence_threshold_km
        );
        let summary = profile_document(
            &mut document,
            &evidence,
            &settings,
            &validation.filter,
            &SharedHaplotypeStats,
            &cancel,
        )
        .map_err(|e| e.to_string())?;
        println!(
            "✅ Profiled {} spartitions: {} concordances, {} limits",
            summary.spartitions, summary.definitions, summary.limits
        );
    }

    if args.score {
        println!("🎯 Scoring spartitions...");
        let summary = score_document(
            &mut document,
            &weights,
            &constraints,
            &validation.filter,
            &cancel,
        )
        .map_err(|e| e.to_string())?;
        if summary.skipped > 0 {
            println!(
                "⚠️  {} spartition(s) with fewer than two subsets were not scored",
                summary.skipped
            );
        }
        println!("✅ Scored {} spartitions", summary.scored);
    }

    let output = match &args.output {
        Some(path) => PathBuf::from(path),
        None if profiling => derived_output_path(&spart_path, "_concordances"),
        None => derived_output_path(&spart_path, "_scored"),
    };
    write_document(&output, &document).map_err(|e| e.to_string())?;
    println!("💾 Document written to: {}", output.display());

    if let Some(path) = &args.scores_output {
        write_scores(Path::new(path), &document, validation.format, &command_line)
            .map_err(|e| e.to_string())?;
        println!("📊 Score table written to: {}", path);
    }

    println!(
        "⏱️  Total time: {:.2}s",
        total_start.elapsed().as_secs_f64()
    );
    Ok(())
}
