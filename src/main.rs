//! Check a saved placement against a catalog card.
//!
//! Usage:
//!   geozoo-engine --card giraffe --snapshot board.json
//!   GEOZOO_CATALOG=patterns.toml geozoo-engine --image card_owl --snapshot board.json

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use geozoo_engine::catalog::loader::{load_catalog, load_default_catalog};
use geozoo_engine::catalog::CardRef;
use geozoo_engine::engine::models::PlacementSnapshot;
use geozoo_engine::engine::session::{ValidationSession, ValidationState};

#[derive(Parser)]
#[command(name = "geozoo-engine", about = "Validate a tile placement against a GeoZoo pattern card")]
struct Cli {
    /// Path to patterns.toml (default: auto-discover)
    #[arg(long, env = "GEOZOO_CATALOG")]
    catalog: Option<PathBuf>,

    /// Card id, matched case-insensitively against template ids and images
    #[arg(long, default_value = "")]
    card: String,

    /// Card reference image, matched exactly
    #[arg(long)]
    image: Option<String>,

    /// JSON snapshot: {"tiles":[{"x":0,"y":0,"rotation":90,"face":"none"}]}
    #[arg(long)]
    snapshot: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let registry = match cli.catalog {
        Some(ref path) => load_catalog(path)?,
        None => load_default_catalog(),
    };

    let card = CardRef {
        reference_image: cli.image.clone(),
        id: cli.card.clone(),
    };
    let template = registry
        .resolve_card(&card)
        .ok_or_else(|| format!("No template for card id='{}' image={:?}", card.id, card.reference_image))?;
    tracing::info!(template = %template.id, "resolved card");

    let content = std::fs::read_to_string(&cli.snapshot)
        .map_err(|e| format!("Failed to read {}: {}", cli.snapshot.display(), e))?;
    let snapshot: PlacementSnapshot = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {}", cli.snapshot.display(), e))?;

    let mut session = ValidationSession::new();
    session.activate(Some(Arc::clone(&template)));
    let state = session.submit(snapshot);

    let output = serde_json::json!({
        "template": template.id,
        "state": state,
        "valid": state.is_valid(),
        "complete": state.is_complete(),
        "report": session.last_report(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if state != ValidationState::Valid {
        std::process::exit(1);
    }
    Ok(())
}
