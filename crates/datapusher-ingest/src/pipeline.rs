//! Push pipeline orchestration
//!
//! One run moves through `Validating → Fetching → Parsing → Syncing →
//! Finalizing` and ends in `Done` or `Failed`. Each network call is awaited
//! before the next one is issued; nothing is rolled back on failure.

use datapusher_common::{Field, LogLevel};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::chunk::chunky;
use crate::ckan::CkanClient;
use crate::config::PushConfig;
use crate::error::{JobError, Result};
use crate::fetch::{download_client, fetch_resource};
use crate::format::{get_parser, ParseOptions};
use crate::jobs::PushStats;
use crate::record::Record;
use crate::schema::datastore_fields;
use crate::task::{TaskInput, TaskLog};

/// Stage of a push run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Validating,
    Fetching,
    Parsing,
    Syncing,
    Finalizing,
    Done,
    Failed(String),
}

impl PipelineState {
    fn rank(&self) -> u8 {
        match self {
            PipelineState::Validating => 0,
            PipelineState::Fetching => 1,
            PipelineState::Parsing => 2,
            PipelineState::Syncing => 3,
            PipelineState::Finalizing => 4,
            PipelineState::Done | PipelineState::Failed(_) => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Validating => "validating",
            PipelineState::Fetching => "fetching",
            PipelineState::Parsing => "parsing",
            PipelineState::Syncing => "syncing",
            PipelineState::Finalizing => "finalizing",
            PipelineState::Done => "done",
            PipelineState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

/// Progress of a single run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    task_id: String,
    history: Vec<PipelineState>,
}

impl PipelineRun {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            history: vec![PipelineState::Validating],
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn state(&self) -> &PipelineState {
        self.history.last().unwrap_or(&PipelineState::Validating)
    }

    /// Every state visited, in order
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Move to `next`; backward moves and moves out of a terminal state are
    /// ignored
    pub fn advance(&mut self, next: PipelineState) -> bool {
        let current = self.state();
        if current.is_terminal() || next.rank() <= current.rank() {
            warn!(
                task_id = %self.task_id,
                from = current.name(),
                to = next.name(),
                "Ignoring backward state transition"
            );
            return false;
        }

        debug!(task_id = %self.task_id, from = current.name(), to = next.name(), "State transition");
        self.history.push(next);
        true
    }

    fn fail(&mut self, err: &JobError) {
        self.advance(PipelineState::Failed(err.message()));
    }
}

/// Result of a successful push
#[derive(Debug, Clone)]
pub enum PushOutcome {
    /// Records were written and the resource was marked active
    Pushed(PushStats),
    /// Dry run: the detected schema and every parsed row
    DryRun { fields: Vec<Field>, records: Vec<Record> },
}

/// Pushes catalog resources into the datastore
///
/// Holds only configuration and HTTP clients, so one instance can serve many
/// concurrent runs.
#[derive(Debug, Clone)]
pub struct DataPusher {
    config: PushConfig,
    catalog_http: Client,
    download_http: Client,
}

impl DataPusher {
    pub fn new(config: PushConfig) -> Result<Self> {
        config.validate()?;

        let catalog_http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| JobError::config(format!("could not build catalog client: {}", e)))?;
        let download_http = download_client(&config)?;

        Ok(Self {
            config,
            catalog_http,
            download_http,
        })
    }

    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    /// Push one resource into the datastore
    ///
    /// Failures are written to `log` at error level before being returned.
    pub async fn push_to_datastore(
        &self,
        task_id: &str,
        input: &Value,
        dry_run: bool,
        log: &dyn TaskLog,
    ) -> Result<PushOutcome> {
        let mut run = PipelineRun::new(task_id);
        self.execute(&mut run, input, dry_run, log).await
    }

    /// Like [`DataPusher::push_to_datastore`], recording state transitions on
    /// `run`
    #[instrument(skip(self, run, input, log), fields(task_id = %run.task_id()))]
    pub async fn execute(
        &self,
        run: &mut PipelineRun,
        input: &Value,
        dry_run: bool,
        log: &dyn TaskLog,
    ) -> Result<PushOutcome> {
        match self.stages(run, input, dry_run, log).await {
            Ok(outcome) => {
                run.advance(PipelineState::Done);
                Ok(outcome)
            },
            Err(e) => {
                log.log(LogLevel::Error, &e.message());
                run.fail(&e);
                Err(e)
            },
        }
    }

    async fn stages(
        &self,
        run: &mut PipelineRun,
        input: &Value,
        dry_run: bool,
        log: &dyn TaskLog,
    ) -> Result<PushOutcome> {
        let input = TaskInput::from_value(input)?;
        let chunk_size = self.config.chunk_size()?;
        let ckan = CkanClient::new(self.catalog_http.clone(), &input.ckan_url, &input.api_key);
        let mut stats = PushStats::new();

        run.advance(PipelineState::Fetching);
        let mut resource = ckan.resource_show(&input.resource_id).await?;

        log.info(&format!("Fetching from: {}", resource.url));
        let fetched = fetch_resource(&self.download_http, &resource.url, &self.config).await?;
        stats.add_bytes(fetched.data.len());

        run.advance(PipelineState::Parsing);
        let choice = get_parser(&resource.format, &fetched.content_type)?;
        let options = ParseOptions {
            strict_type_guess: true,
            ..choice.options
        };
        let table = choice.kind.parser().parse(&fetched.data, &options)?;
        debug!(
            parser = choice.kind.parser().name(),
            columns = table.fields.len(),
            rows = table.records.len(),
            "Parsed resource"
        );

        run.advance(PipelineState::Syncing);
        log.info(&format!("Deleting \"{}\" from datastore.", input.resource_id));
        ckan.datastore_delete(&input.resource_id).await?;

        let fields = datastore_fields(&table.fields);
        log.info(&format!("Determined headers and types: {}", render_fields(&fields)));

        if dry_run {
            return Ok(PushOutcome::DryRun {
                fields,
                records: table.records,
            });
        }

        for (i, chunk) in chunky(table.records, chunk_size).enumerate() {
            log.info(&format!("Saving chunk {}", i));
            ckan.datastore_create(&resource, &fields, &chunk).await?;
            stats.add_chunk(chunk.len());
        }

        log.info(&format!(
            "Successfully pushed {} entries to \"{}\".",
            stats.records_pushed, resource.id
        ));

        run.advance(PipelineState::Finalizing);
        ckan.resource_update(&mut resource).await?;

        stats.complete();
        info!(
            resource_id = %resource.id,
            records = stats.records_pushed,
            chunks = stats.chunks_sent,
            duration_secs = stats.duration_secs,
            records_per_second = stats.records_per_second(),
            "Push completed"
        );

        Ok(PushOutcome::Pushed(stats))
    }
}

fn render_fields(fields: &[Field]) -> String {
    serde_json::to_string(fields).unwrap_or_else(|_| {
        fields
            .iter()
            .map(Field::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })
}
