/// Pattern Linter — checks that every pattern in a library can be generated.
///
/// Usage: pattern_linter <library.ron | dir> [--combos <n>]

use pattern_engine::core::firing::FiringPattern;
use pattern_engine::core::library::{LintIssue, PatternLibrary};
use pattern_engine::core::spawn::collect_events;
use std::path::Path;
use std::process;

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: pattern_linter <library.ron | dir> [--combos <n>]");
        process::exit(0);
    }

    let library_path = Path::new(&args[1]);
    let mut combos: u32 = 8;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--combos" && i + 1 < args.len() {
            i += 1;
            combos = args[i].parse().unwrap_or(8);
        }
        i += 1;
    }

    let mut library = PatternLibrary::default();
    let mut load_errors = 0usize;

    if library_path.is_file() {
        match PatternLibrary::load_from_ron(library_path) {
            Ok(loaded) => library.merge(loaded),
            Err(e) => {
                eprintln!("ERROR: Failed to load library: {}", e);
                process::exit(1);
            }
        }
    } else if library_path.is_dir() {
        load_errors = load_libraries_recursive(library_path, &mut library);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", library_path.display());
        process::exit(1);
    }

    println!(
        "Loaded {} trajectories, {} spawn patterns, {} firing patterns",
        library.trajectory_names().len(),
        library.spawn_pattern_names().len(),
        library.firing_pattern_names().len()
    );

    let issues = library.lint(combos);
    let warnings = collect_warnings(&library);

    println!("\n=== Pattern Lint Report ===\n");

    if issues.is_empty() && warnings.is_empty() && load_errors == 0 {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for issue in &issues {
        println!("ERROR: {}", describe(issue));
    }

    let errors = issues.len() + load_errors;
    println!("\nSummary: {} errors, {} warnings", errors, warnings.len());

    if errors == 0 {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_libraries_recursive(dir: &Path, library: &mut PatternLibrary) -> usize {
    let mut failures = 0;
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                failures += load_libraries_recursive(&path, library);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                match PatternLibrary::load_from_ron(&path) {
                    Ok(loaded) => {
                        println!("  Loaded: {}", path.display());
                        library.merge(loaded);
                    }
                    Err(e) => {
                        eprintln!("  ERROR loading {}: {}", path.display(), e);
                        failures += 1;
                    }
                }
            }
        }
    }
    failures
}

fn describe(issue: &LintIssue) -> String {
    match issue.combo {
        Some(combo) => format!("'{}' (combo {}): {}", issue.pattern, combo, issue.error),
        None => format!("'{}': {}", issue.pattern, issue.error),
    }
}

/// Valid but suspicious authoring: empty schedules and empty volleys.
fn collect_warnings(library: &PatternLibrary) -> Vec<String> {
    let mut warnings = Vec::new();

    for name in library.spawn_pattern_names() {
        if let Some(pattern) = library.spawn_pattern(name) {
            if let Ok(events) = collect_events(pattern.as_ref()) {
                if events.is_empty() {
                    warnings.push(format!("Spawn pattern '{}' spawns nothing", name));
                }
            }
        }
    }

    for name in library.firing_pattern_names() {
        if let Some(pattern) = library.firing_pattern(name) {
            if pattern.projectile_count(0) == 0 {
                warnings.push(format!("Firing pattern '{}' fires nothing at combo 0", name));
            }
        }
    }

    warnings
}
