use clap::Parser;
use issue_sync::utils::{logger, validation::Validate};
use issue_sync::{
    CliConfig, HttpSourceClient, JsonFileStore, LogMetricsSink, OrchestratorConfig, SyncConfig,
    SyncOrchestrator, SyncOutcome,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting issue-sync");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {e}");
        std::process::exit(1);
    }

    // The optional TOML file provides tuning; CLI flags win for the rest.
    let orchestrator_config = match &cli.config {
        Some(path) => {
            let file = SyncConfig::from_file(path)?;
            file.validate_config()?;
            file.orchestrator_config()
        }
        None => OrchestratorConfig::default(),
    };

    let source = HttpSourceClient::new(&cli.api_base_url);
    let store = JsonFileStore::new(&cli.output_path, &cli.collection);
    let orchestrator =
        SyncOrchestrator::with_config(source, store, LogMetricsSink, orchestrator_config);

    let outcome = orchestrator.sync(&cli.owner, &cli.repo, cli.limit).await?;

    match &outcome {
        SyncOutcome::Success {
            processed,
            duration,
        } => {
            println!("✅ Synced {processed} issues in {duration:?}");
        }
        SyncOutcome::PartialFailure {
            processed,
            failed,
            errors,
            duration,
        } => {
            println!(
                "⚠️ Synced {processed} issues, {failed} failed in {duration:?} ({:.0}% ok)",
                outcome.success_rate() * 100.0
            );
            for error in errors {
                eprintln!("  - {error}");
            }
            std::process::exit(2);
        }
        SyncOutcome::Failure { error, duration } => {
            eprintln!("❌ Sync failed after {duration:?}: {error}");
            std::process::exit(1);
        }
    }

    Ok(())
}
