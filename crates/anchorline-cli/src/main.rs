use anchorline_cli::cli::{Cli, Commands};
use anchorline_cli::{config, run_chat, run_turn, EchoModel};
use anchorline_session::Orchestrator;
use clap::Parser;
use serde_json::json;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let args = cli.command.config_args();

    init_logging(args.verbose);
    let config = config::load(args)?;

    match cli.command {
        Commands::Chat { stats, .. } => {
            let mut orch = Orchestrator::new(config)?;
            let mut events = orch.subscribe();

            // Escalations are surfaced out of band, as a frontend would
            tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    if let anchorline_session::AnchorEvent::Escalation { level, sentiment, .. } = event {
                        info!(%level, sentiment, "Escalation event received");
                    }
                }
            });

            info!(session_id = %orch.session().id, "Chat session started");
            run_chat(&mut orch, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

            if stats {
                let snapshot = orch.metrics();
                println!("{}", serde_json::to_string_pretty(&json!({
                    "session_id": orch.session().id,
                    "prompts": orch.session().prompt_count,
                    "intervention_density": orch.session().intervention_density(),
                    "trust_delta": orch.trust_delta(),
                    "telemetry": {
                        "prompts": snapshot.prompts,
                        "interventions": snapshot.interventions(),
                        "escalations": snapshot.escalations,
                        "audit_events": orch.telemetry().trail().len(),
                    },
                }))?);
            }
        }

        Commands::Analyze { message, .. } => {
            let mut orch = Orchestrator::new(config)?;
            let report = run_turn(&mut orch, &EchoModel, &message).await;

            println!("{}", serde_json::to_string_pretty(&json!({
                "policy": report.policy,
                "emotion": orch.session().latest_emotion,
                "stance": orch.stance_analyzer().history().latest(),
                "output": report.output,
                "human_options": report.human_options,
            }))?);
        }

        Commands::ShowConfig { .. } => {
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("anchorline=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("anchorline=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
