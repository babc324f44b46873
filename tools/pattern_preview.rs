/// Preview — prints a merged spawn schedule or a projectile volley.
///
/// Usage: pattern_preview <library.ron> [--spawn <name>] [--fire <name>] [--combo <n>]
///
/// With no pattern selected, lists everything the library defines.

use pattern_engine::core::firing::FiringPattern;
use pattern_engine::core::library::PatternLibrary;
use pattern_engine::core::spawn::collect_events;
use std::path::Path;
use std::process;

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let library_path = args[1].clone();
    let mut spawn_name = None;
    let mut fire_name = None;
    let mut combo: u32 = 0;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--spawn" if i + 1 < args.len() => {
                i += 1;
                spawn_name = Some(args[i].clone());
            }
            "--fire" if i + 1 < args.len() => {
                i += 1;
                fire_name = Some(args[i].clone());
            }
            "--combo" if i + 1 < args.len() => {
                i += 1;
                combo = args[i].parse().unwrap_or(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let library = match PatternLibrary::load_from_ron(Path::new(&library_path)) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("ERROR: Failed to load library: {}", e);
            process::exit(1);
        }
    };

    if spawn_name.is_none() && fire_name.is_none() {
        list_patterns(&library);
        return;
    }

    if let Some(name) = spawn_name {
        if let Err(message) = print_schedule(&library, &name) {
            eprintln!("ERROR: {}", message);
            process::exit(1);
        }
    }

    if let Some(name) = fire_name {
        if let Err(message) = print_volley(&library, &name, combo) {
            eprintln!("ERROR: {}", message);
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Usage: pattern_preview <library.ron> [--spawn <name>] [--fire <name>] [--combo <n>]");
}

fn list_patterns(library: &PatternLibrary) {
    println!("Trajectories:");
    for name in library.trajectory_names() {
        println!("  {}", name);
    }
    println!("Spawn patterns:");
    for name in library.spawn_pattern_names() {
        println!("  {}", name);
    }
    println!("Firing patterns:");
    for name in library.firing_pattern_names() {
        println!("  {}", name);
    }
}

fn print_schedule(library: &PatternLibrary, name: &str) -> Result<(), String> {
    let pattern = library
        .spawn_pattern(name)
        .ok_or_else(|| format!("no spawn pattern named '{}'", name))?;
    let events = collect_events(pattern.as_ref()).map_err(|e| e.to_string())?;

    println!("=== {} ({} events) ===", name, events.len());
    println!(
        "{:>4}  {:>8}  {:>6}  {:>24}  {:>8}  {}",
        "#", "time", "prefab", "offset", "ends", "target"
    );
    for (index, event) in events.iter().enumerate() {
        let offset = event.trajectory_offset;
        println!(
            "{:>4}  {:>8.3}  {:>6}  {:>24}  {:>8.3}  {}",
            index,
            event.time,
            event.prefab.0,
            format!("({:.2}, {:.2}, {:.2})", offset.x, offset.y, offset.z),
            event.end_time(),
            event.target.tag()
        );
    }
    Ok(())
}

fn print_volley(library: &PatternLibrary, name: &str, combo: u32) -> Result<(), String> {
    let pattern = library
        .firing_pattern(name)
        .ok_or_else(|| format!("no firing pattern named '{}'", name))?;
    let volley = pattern.volley(combo).map_err(|e| e.to_string())?;

    println!("=== {} combo {} ({} projectiles) ===", name, combo, volley.len());
    for (index, projectile) in volley.iter().enumerate() {
        let o = projectile.origin;
        let v = projectile.velocity;
        println!(
            "{:>4}  origin ({:.2}, {:.2}, {:.2})  velocity ({:.2}, {:.2}, {:.2})  speed {:.2}",
            index,
            o.x,
            o.y,
            o.z,
            v.x,
            v.y,
            v.z,
            v.length()
        );
    }
    Ok(())
}
