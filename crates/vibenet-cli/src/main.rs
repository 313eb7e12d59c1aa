mod pipeline;
mod report;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "vibenet")]
#[command(about = "Topic sentiment pipeline over a year of Reddit posts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect, classify and aggregate in one go
    Run(TopicArgs),
    /// Collect posts for a topic and year into posts.csv
    Collect(TopicArgs),
    /// Score the collected posts in place
    Classify,
    /// Build monthly.csv and yearly.csv from the scored posts
    Aggregate,
    /// Print the dashboard summary for the last completed run
    Report,
}

#[derive(Debug, Args)]
struct TopicArgs {
    /// Search query, e.g. "bitcoin"
    topic: String,

    /// Calendar year to collect (UTC)
    year: i32,

    /// Per-month search limit; defaults to `VIBENET_POSTS_PER_MONTH`
    #[arg(long)]
    posts_per_month: Option<usize>,

    /// Cap on total posts kept; defaults to `VIBENET_FINAL_LIMIT`
    #[arg(long)]
    final_limit: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("vibenet: pass a subcommand, see --help");
        return Ok(());
    };

    dotenvy::dotenv().ok();
    let config = vibenet_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Run(args) => pipeline::run_full(&config, &args).await?,
        Commands::Collect(args) => pipeline::run_collect(&config, &args).await?,
        Commands::Classify => pipeline::run_classify(&config).await?,
        Commands::Aggregate => pipeline::run_aggregate(&config)?,
        Commands::Report => report::run_report(&config)?,
    }

    Ok(())
}
