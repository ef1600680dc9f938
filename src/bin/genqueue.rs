//! Command-line entry point for the generation task queue.
//!
//! Usage:
//!
//! ```text
//! genqueue [--config <path>] <command>
//! ```
//!
//! Commands:
//!
//! - `process [--depth N]`: run one invocation and follow its continuations
//!   in-process until the chain stops. Prints one JSON report per line.
//! - `drain`: process tasks back to back until none is eligible or Ctrl-C.
//! - `serve`: expose `POST /process`; continuations re-invoke the endpoint.
//! - `enqueue --name <name> [--category <c>] [--attr key=value]...`: insert a
//!   pending task.
//! - `reclaim --older-than-secs N`: return tasks stuck in `processing` to the
//!   retry path.
//!
//! Settings come from the optional TOML file and `GENQUEUE__*` environment
//! variables; see [`genqueue::config::Settings`].

use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use eyre::WrapErr;
use genqueue::{
    artifact::{
        adapters::{
            http::{HttpArtifactSource, HttpBucketConfig, HttpBucketStorage},
            local::LocalArtifactStorage,
        },
        ports::{ArtifactSource, ArtifactStorage},
        services::ResultMaterializer,
    },
    config::{ConfigError, Settings, StorageBackend},
    generation::{
        adapters::{NanobananaApi, NanobananaConfig},
        ports::GenerationApi,
        services::GenerationClient,
    },
    logging,
    prompt::{
        adapters::{ChatPromptComposer, ChatRefinementConfig, TemplatePromptComposer},
        ports::PromptComposer,
    },
    queue::{
        adapters::{
            http::HttpSelfInvocation,
            memory::ChannelContinuation,
            postgres::{PostgresTaskStore, QueuePgPool},
        },
        domain::{QueueDepth, TaskPayload},
        ports::{ContinuationScheduler, TaskStore},
        services::{
            ContinuationTrigger, DrainLoop, ProcessInvocation, ProcessingPipeline,
            QueueEntryPoint, StalledTaskRecovery, TaskProcessor, drive_chain,
        },
    },
    server,
};
use mockable::DefaultClock;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};

type Store = PostgresTaskStore<DefaultClock>;
type Processor = TaskProcessor<Store, DefaultClock>;

#[derive(Debug, Parser)]
#[command(name = "genqueue", version, about = "Drains a backlog of generation tasks")]
struct Cli {
    /// TOML settings file.
    #[arg(long, short, global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one invocation and its in-process continuations.
    Process {
        /// Depth of the first invocation.
        #[arg(long, default_value_t = 0)]
        depth: u32,
    },
    /// Process tasks until none is eligible.
    Drain,
    /// Serve the HTTP entry point.
    Serve,
    /// Insert a pending task.
    Enqueue {
        /// Human-readable task name.
        #[arg(long)]
        name: String,
        /// Task category.
        #[arg(long)]
        category: Option<String>,
        /// Contextual attribute as `key=value`; repeatable.
        #[arg(long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
    },
    /// Return tasks stuck in `processing` to the retry path.
    Reclaim {
        /// Minimum age of the claim, in seconds.
        #[arg(long)]
        older_than_secs: u64,
    },
}

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    let (raw_key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = raw_key.trim();
    if key.is_empty() {
        return Err(format!("attribute key is empty in '{raw}'"));
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).wrap_err("load settings")?;
    logging::init(&settings.logging).wrap_err("initialise logging")?;

    let clock = Arc::new(DefaultClock);
    let store = Arc::new(PostgresTaskStore::new(
        connect(&settings)?,
        Arc::clone(&clock),
    ));

    match cli.command {
        Command::Process { depth } => run_process(&settings, store, QueueDepth::new(depth)).await,
        Command::Drain => run_drain(&settings, store).await,
        Command::Serve => run_serve(&settings, store).await,
        Command::Enqueue {
            name,
            category,
            attributes,
        } => run_enqueue(&store, name, category, attributes).await,
        Command::Reclaim { older_than_secs } => {
            run_reclaim(&settings, store, Duration::from_secs(older_than_secs)).await
        }
    }
}

fn connect(settings: &Settings) -> eyre::Result<QueuePgPool> {
    let url = settings.database.require_url()?;
    Pool::builder()
        .max_size(settings.database.pool_size)
        .build(ConnectionManager::<PgConnection>::new(url))
        .wrap_err("open database pool")
}

#[expect(clippy::print_stdout, reason = "command output is written to stdout")]
async fn run_process(
    settings: &Settings,
    store: Arc<Store>,
    depth: QueueDepth,
) -> eyre::Result<()> {
    let (scheduler, mut receiver) = ChannelContinuation::channel();
    let entry = entry_point(settings, store, Arc::new(scheduler))?;
    let reports = drive_chain(&entry, &mut receiver, depth).await;
    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
    }
    info!(invocations = reports.len(), "chain finished");
    Ok(())
}

#[expect(clippy::print_stdout, reason = "command output is written to stdout")]
async fn run_drain(settings: &Settings, store: Arc<Store>) -> eyre::Result<()> {
    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("shutdown requested, finishing the current task");
            if stop.send(true).is_err() {
                info!("drain already finished");
            }
        }
    });

    let drain = DrainLoop::new(processor(settings, store)?, shutdown);
    let summary = drain.run().await?;
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

async fn run_serve(settings: &Settings, store: Arc<Store>) -> eyre::Result<()> {
    let scheduler = HttpSelfInvocation::new(
        settings.server.continuation_url(),
        settings.server.bearer_token.clone(),
        settings.server.continuation_timeout(),
    )?;
    let entry: Arc<dyn ProcessInvocation> =
        Arc::new(entry_point(settings, store, Arc::new(scheduler))?);
    let listener = tokio::net::TcpListener::bind(&settings.server.bind)
        .await
        .wrap_err_with(|| format!("bind {}", settings.server.bind))?;

    server::serve(listener, entry, async {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("ctrl-c handler unavailable, serving until killed");
            std::future::pending::<()>().await;
        }
    })
    .await
    .wrap_err("serve entry point")
}

#[expect(clippy::print_stdout, reason = "command output is written to stdout")]
async fn run_enqueue(
    store: &Store,
    name: String,
    category: Option<String>,
    attributes: Vec<(String, String)>,
) -> eyre::Result<()> {
    let mut payload = TaskPayload::new().with_name(name);
    if let Some(label) = category {
        payload = payload.with_category(label);
    }
    for (key, value) in attributes {
        payload = payload.with_attribute(key, Value::String(value));
    }

    let id = store.enqueue(&payload).await?;
    println!("{id}");
    Ok(())
}

#[expect(clippy::print_stdout, reason = "command output is written to stdout")]
async fn run_reclaim(settings: &Settings, store: Arc<Store>, age: Duration) -> eyre::Result<()> {
    let recovery =
        StalledTaskRecovery::new(store, Arc::new(DefaultClock), settings.queue.retry_policy()?);
    for id in recovery.reclaim_older_than(age).await? {
        println!("{id}");
    }
    Ok(())
}

fn entry_point<S>(
    settings: &Settings,
    store: Arc<Store>,
    scheduler: Arc<S>,
) -> eyre::Result<QueueEntryPoint<Store, DefaultClock, S>>
where
    S: ContinuationScheduler + 'static,
{
    let trigger = ContinuationTrigger::new(
        Arc::clone(&store),
        scheduler,
        settings.queue.max_depth(),
    );
    Ok(QueueEntryPoint::new(processor(settings, store)?, trigger))
}

fn processor(settings: &Settings, store: Arc<Store>) -> eyre::Result<Processor> {
    Ok(TaskProcessor::new(
        store,
        Arc::new(DefaultClock),
        settings.queue.retry_policy()?,
        pipeline(settings)?,
    ))
}

fn pipeline(settings: &Settings) -> eyre::Result<ProcessingPipeline<DefaultClock>> {
    let generation = &settings.generation;
    let api_key = generation
        .api_key
        .clone()
        .ok_or(ConfigError::Missing("generation.api_key"))?;
    let api: Arc<dyn GenerationApi> = Arc::new(NanobananaApi::new(NanobananaConfig {
        submit_url: generation.submit_url.clone(),
        status_url: generation.status_url.clone(),
        api_key,
        generation_type: generation.generation_type.clone(),
        timeout: generation.request_timeout(),
    })?);

    let storage = &settings.storage;
    let source: Arc<dyn ArtifactSource> =
        Arc::new(HttpArtifactSource::new(storage.request_timeout())?);

    Ok(ProcessingPipeline {
        composer: composer(settings)?,
        generation: GenerationClient::new(
            api,
            generation.poll_policy()?,
            generation.output_count,
        ),
        materializer: ResultMaterializer::new(
            source,
            artifact_storage(settings)?,
            Arc::new(DefaultClock),
            storage.materializer(),
        ),
    })
}

fn composer(settings: &Settings) -> eyre::Result<Arc<dyn PromptComposer>> {
    let prompt = &settings.prompt;
    let template = match &prompt.template_path {
        Some(path) => TemplatePromptComposer::new(read_template(path)?),
        None => TemplatePromptComposer::default(),
    }
    .with_archetypes(prompt.archetypes.clone());

    let Some(refinement) = &prompt.refinement else {
        return Ok(Arc::new(template));
    };
    let chat = ChatPromptComposer::new(
        ChatRefinementConfig {
            endpoint: refinement.endpoint.clone(),
            api_key: refinement.api_key.clone(),
            model: refinement.model.clone(),
            temperature: refinement.temperature,
            timeout: settings.generation.request_timeout(),
        },
        template,
    )?;
    Ok(Arc::new(chat))
}

fn read_template(path: &Utf8Path) -> eyre::Result<String> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("read prompt template {path}"))
}

fn artifact_storage(settings: &Settings) -> eyre::Result<Arc<dyn ArtifactStorage>> {
    let storage = &settings.storage;
    match storage.backend {
        StorageBackend::Local => Ok(Arc::new(LocalArtifactStorage::open(
            &storage.local_root,
            storage.public_base_url.clone(),
        )?)),
        StorageBackend::Bucket => {
            let base_url = storage
                .bucket_url
                .clone()
                .ok_or(ConfigError::Missing("storage.bucket_url"))?;
            let service_key = storage
                .service_key
                .clone()
                .ok_or(ConfigError::Missing("storage.service_key"))?;
            Ok(Arc::new(HttpBucketStorage::new(HttpBucketConfig {
                base_url,
                bucket: storage.bucket.clone(),
                service_key,
                timeout: storage.request_timeout(),
            })?))
        }
    }
}
