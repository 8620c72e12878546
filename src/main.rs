//! ragcheck CLI entry point

use clap::Parser;
use ragcheck::{
    config::Config,
    error::Result,
    progress::LogWriterFactory,
    report::Report,
    verify::{DefaultComponents, Verifier, VerifyOptions},
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ragcheck")]
#[command(version, about = "Verify a local RAG demo environment", long_about = None)]
struct Cli {
    /// Skip local model checks (for remote inference)
    #[arg(long)]
    no_local: bool,

    /// Path to config file
    #[arg(short, long, env = "RAGCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,

    /// Exit with status 2 when any check fails
    #[arg(long)]
    strict: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ragcheck=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    match run(&cli).await {
        Ok(report) => {
            if cli.strict && report.has_failures() {
                debug!("{} check(s) failed in strict mode", report.failure_count());
                std::process::exit(2);
            }
        }
        Err(e) => {
            debug!("Fatal error: {:?}", e);
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "status": "error", "error": e.to_string() })
                );
            } else {
                println!("❌ Setup verification failed: {}", e);
            }
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<Report> {
    let echo = !cli.json;

    if echo {
        println!("🔧 Initializing configuration...");
        if cli.no_local {
            println!("🔧 Running in --no-local mode (skipping local model checks)");
        }
    }

    let config = Config::load(cli.config.as_deref())?;

    let mut report = Report::new(cli.no_local, echo);
    let options = VerifyOptions {
        no_local: cli.no_local,
    };
    Verifier::new(&config, options, &DefaultComponents)
        .run(&mut report)
        .await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(report)
}
