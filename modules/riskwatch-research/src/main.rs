use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ai_client::Gemini;
use riskwatch_common::Config;
use riskwatch_research::{inputs, PromptTemplate, ResearchClient, WeeklyJob};

/// Weekly company risk research: one rotating batch per run.
#[derive(Parser, Debug)]
#[command(name = "riskwatch", version)]
struct Cli {
    /// Master entity list, one company per line.
    #[arg(long, default_value = "companies.txt")]
    companies: PathBuf,

    /// Role and objective block sent with every request.
    #[arg(long, default_value = "prompt_updated.txt")]
    prompt: PathBuf,

    /// Situation definitions and scoring rubric.
    #[arg(long, default_value = "definitions.txt")]
    definitions: PathBuf,

    /// Batch index override. 0 derives the batch from the current week.
    #[arg(long)]
    week: Option<usize>,

    /// Output root for raw text, reports and run logs.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("riskwatch=info".parse()?)
                .add_directive("ai_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    info!("Riskwatch weekly run starting...");

    let mut config = Config::from_env()?;
    if let Some(week) = cli.week {
        config.week = (week > 0).then_some(week);
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    config.log_redacted();

    // Fail fast on missing inputs, before any remote call.
    let entities = inputs::load_entities(&cli.companies)?;
    let prompt = PromptTemplate::new(inputs::load_text(&cli.prompt)?, inputs::load_text(&cli.definitions)?);

    let model = Arc::new(Gemini::new(&config.gemini_api_key, &config.gemini_model));
    let researcher = ResearchClient::new(model, prompt, config.rotation.remote_timeout);

    let job = WeeklyJob::new(&researcher, &config.rotation, config.data_dir.clone());
    match job.run(&entities, config.week, Utc::now()).await {
        Ok(run) => {
            info!(run_id = run.run_id.as_str(), log = %run.run_log.display(), "Run finished");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Run aborted");
            Err(e.into())
        }
    }
}
