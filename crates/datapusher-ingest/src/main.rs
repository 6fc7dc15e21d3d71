//! Datapusher - push catalog resources into the CKAN datastore

use anyhow::Result;
use clap::{Parser, Subcommand};
use datapusher_common::logging::{init_logging, LogConfig, LogLevel};
use datapusher_ingest::{DataPusher, PushConfig, PushJob, PushOutcome, TaskInput, TracingTaskLog};
use serde_json::json;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "datapusher")]
#[command(author, version, about = "Push tabular resources into the CKAN datastore")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push one resource
    Push {
        /// Resource id in the catalog
        #[arg(long)]
        resource_id: String,

        /// Catalog base URL
        #[arg(long)]
        ckan_url: String,

        /// CKAN API key
        #[arg(long, env = "CKAN_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Task id used to tag log lines (random when omitted)
        #[arg(long)]
        task_id: Option<String>,

        /// Detect the schema and stop before writing records
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("datapusher")
        .build()
        .merge_env()?;

    init_logging(&log_config)?;

    match cli.command {
        Command::Push {
            resource_id,
            ckan_url,
            api_key,
            task_id,
            dry_run,
        } => {
            let input = TaskInput::new(resource_id, ckan_url, api_key).to_value();
            let job = match task_id {
                Some(id) => PushJob::with_task_id(id, input),
                None => PushJob::new(input),
            }
            .dry_run(dry_run);

            let pusher = DataPusher::new(PushConfig::from_env()?)?;
            let log = TracingTaskLog::new(job.task_id.clone());

            match job.run(&pusher, &log).await? {
                PushOutcome::Pushed(stats) => {
                    info!(
                        task_id = %job.task_id,
                        records = stats.records_pushed,
                        chunks = stats.chunks_sent,
                        bytes = stats.bytes_downloaded,
                        records_per_second = format!("{:.1}", stats.records_per_second()),
                        "Push complete"
                    );
                },
                PushOutcome::DryRun { fields, records } => {
                    let summary = json!({
                        "fields": fields,
                        "records": records.len(),
                    });
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                },
            }
        },
    }

    Ok(())
}
