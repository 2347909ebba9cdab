//! Audit a pattern catalog for authoring mistakes.
//!
//! Usage:
//!   cargo run --release --bin audit_catalog -- --catalog patterns.toml
//!   cargo run --release --bin audit_catalog -- --json

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use geozoo_engine::catalog::audit::audit_registry;
use geozoo_engine::catalog::loader::{load_catalog, load_default_catalog};

#[derive(Parser)]
#[command(name = "audit_catalog", about = "Check every template in a GeoZoo pattern catalog")]
struct Cli {
    /// Path to patterns.toml (default: auto-discover)
    #[arg(long, env = "GEOZOO_CATALOG")]
    catalog: Option<PathBuf>,

    /// Print the full audit as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Treat self-symmetric templates as failures
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let registry = match cli.catalog {
        Some(ref path) => load_catalog(path)?,
        None => load_default_catalog(),
    };
    if registry.is_empty() {
        return Err("catalog is empty".into());
    }

    let audits = audit_registry(&registry);
    let failing = audits
        .iter()
        .filter(|a| !a.is_clean() || (cli.strict && a.is_self_symmetric()))
        .count();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&audits)?);
    } else {
        for audit in &audits {
            let status = if audit.is_clean() { "ok" } else { "FAIL" };
            let symmetry = if audit.is_self_symmetric() { " (self-symmetric)" } else { "" };
            println!(
                "{:<6} {:<24} {} explaining transforms{}",
                status, audit.template_id, audit.self_matches, symmetry
            );
            for issue in &audit.issues {
                println!("         - {issue}");
            }
        }
        println!("\n{} templates, {} failing", audits.len(), failing);
    }

    if failing > 0 {
        std::process::exit(1);
    }
    Ok(())
}
