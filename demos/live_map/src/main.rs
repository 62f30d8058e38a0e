//! Live Map Example
//!
//! Seeds a native_db store, attaches a console canvas and walks through a
//! short editing session: placing, pasting and filtering markers, then
//! editing and deleting a definition they reference.

mod console;

use clap::Parser;
use console::ConsoleRenderer;
use mapsync_core::{Coords, DefinitionKind, Details, MarkerDraft, MarkerId, MarkerType};
use mapsync_db::Store;
use mapsync_engine::{SyncConfig, SyncCoordinator};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "live_map", version, about = "Live marker sync against a native_db store")]
struct Args {
    /// RON seed with definitions and markers
    #[arg(long, value_name = "PATH")]
    seed: Option<PathBuf>,

    /// RON engine config
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Database file; in-memory when omitted
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Search text applied after the initial sync
    #[arg(long, default_value = "wolf")]
    query: String,

    /// trace, debug, info, warn or error
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    let store = Arc::new(match &args.db {
        Some(path) => Store::open(path)?,
        None => Store::in_memory()?,
    });
    if let Some(seed) = &args.seed {
        let report = store.seed_from_file(seed)?;
        info!(?report, "seeded store");
    }

    println!("=== Live Map ===\n");
    let mut map = SyncCoordinator::new(config, ConsoleRenderer::default());
    map.start(store.clone())?;
    map.pump();
    println!("\nAfter initial sync: {} markers", map.registry().len());
    map.renderer().print_visible();

    // Place a teleport, then paste a copy of it next door
    let mut details = Details::named("Harbor Gate");
    details.description = "Leads to the harbor".into();
    let spot = Coords::new(10.0, 20.0);
    let gate = map.place_marker(MarkerDraft::new(MarkerType::Teleport, spot).with_details(details))?;
    println!("\nPlaced {gate}; canvas unchanged until the snapshot arrives: {} markers", map.registry().len());
    map.pump();
    let copy = map.paste_marker(&gate, Coords::new(10.5, 20.5))?;
    map.pump();
    println!("Pasted {gate} to {copy}: {} markers", map.registry().len());

    // Filters
    println!("\nSearch {:?}:", args.query);
    let report = map.set_query(args.query.as_str());
    println!("  shown {} hidden {}", report.shown, report.hidden);
    println!("  suggestions: {:?}", map.suggestions(&args.query, 5));
    map.set_query("");
    let report = map.set_category_toggle(false);
    println!("Friendly NPCs hidden: shown {} hidden {}", report.shown, report.hidden);
    map.reset_filters();

    for kind in DefinitionKind::ALL {
        for row in map.definition_rows(kind) {
            println!("  [{}] {} {} ({} placed)", if row.enabled { "x" } else { " " }, kind, row.name, row.markers);
        }
    }

    // Edit the first item definition and watch referencing markers follow
    let first_item = map.cache().all(DefinitionKind::Item).next().cloned();
    if let Some(mut def) = first_item {
        def.details.name = format!("{} (renamed)", def.details.name);
        map.update_definition(&def)?;
        map.pump();
        println!("\nRenamed definition {}:", def.id);
        map.renderer().print_visible();

        map.delete_definition(DefinitionKind::Item, &def.id)?;
        map.pump();
        println!("\nDeleted definition {}; its markers fall back to inline fields:", def.id);
        map.renderer().print_visible();
    }

    if let Err(err) = map.delete_marker(&MarkerId::new("no-such-marker")) {
        println!("\nDelete rejected: {err}");
    }

    map.stop()?;
    println!("\nStopped; store subscribers left: {}", store.subscriber_count());
    Ok(())
}
