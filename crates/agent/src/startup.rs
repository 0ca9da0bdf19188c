use std::path::Path;
use std::sync::Arc;

use adapters::queue::http_queue::HttpTaskQueue;
use adapters::queue::log_queue::LogTaskQueue;
use adapters::storage::redb_record_store::RedbRecordStore;
use application::dispatch::TaskDispatcher;
use application::inspector_runtime::DispatchSettings;
use application::repository_service::RepositoryService;
use infrastructure::config::{AgentConfig, QueueBackend};
use infrastructure::logging::init_logging;
use infrastructure::metrics::AgentMetrics;
use ports::secondary::metrics_port::MetricsPort;
use ports::secondary::record_store::RecordStore;
use ports::secondary::task_queue::TaskQueue;
use tracing::info;

use crate::cli::Cli;

/// Everything a command needs, built once from the config.
pub struct Services {
    pub config: AgentConfig,
    pub store: Arc<RedbRecordStore>,
    pub queue: Arc<dyn TaskQueue>,
    pub metrics: Arc<AgentMetrics>,
    pub dispatcher: Arc<TaskDispatcher>,
}

impl Services {
    pub fn repository(&self) -> &RepositoryService {
        self.dispatcher.repository()
    }

    pub fn metrics_port(&self) -> Arc<dyn MetricsPort> {
        Arc::clone(&self.metrics) as Arc<dyn MetricsPort>
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            author: self.config.inspector.author.clone(),
            content_queue: self.config.inspector.content_queue.clone(),
            attribute_queue: self.config.inspector.attribute_queue.clone(),
        }
    }
}

/// Load config, initialise logging, and wire the services.
pub fn bootstrap(cli: &Cli) -> anyhow::Result<Services> {
    // ── 1. Load config ──────────────────────────────────────────────
    let config = AgentConfig::load(Path::new(&cli.config))?;

    // ── 2. Initialize logging ───────────────────────────────────────
    // CLI flags take precedence over config file
    let log_level = cli.log_level.unwrap_or(config.agent.log_level);
    let log_format = cli.log_format.unwrap_or(config.agent.log_format);
    init_logging(log_level, log_format)?;

    info!(
        config_path = %cli.config,
        log_level = log_level.as_str(),
        log_format = log_format.as_str(),
        config = ?config.sanitized(),
        "deepinspect agent starting"
    );

    build_services(config)
}

/// Open the store, pick the queue backend, and wire the services.
pub fn build_services(config: AgentConfig) -> anyhow::Result<Services> {
    // ── 3. Open the record store ────────────────────────────────────
    let storage_path = Path::new(&config.storage.path);
    if let Some(parent) = storage_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(RedbRecordStore::open(storage_path)?);
    info!(
        path = %config.storage.path,
        record_ttl_secs = config.storage.record_ttl_secs,
        "record store opened"
    );

    // ── 4. Queue backend ────────────────────────────────────────────
    let queue: Arc<dyn TaskQueue> = match config.queue.backend {
        QueueBackend::Log => Arc::new(LogTaskQueue),
        QueueBackend::Http => Arc::new(HttpTaskQueue::new(config.queue_timeout())?),
    };
    info!(backend = %config.queue.backend, "task queue ready");

    // ── 5. Services ─────────────────────────────────────────────────
    let metrics = Arc::new(AgentMetrics::new());
    let metrics_port = Arc::clone(&metrics) as Arc<dyn MetricsPort>;
    let repository = Arc::new(RepositoryService::new(
        Arc::clone(&store) as Arc<dyn RecordStore>,
        config.record_ttl(),
        Arc::clone(&metrics_port),
    ));
    let dispatcher = Arc::new(TaskDispatcher::new(
        repository,
        Arc::clone(&queue),
        config.intake.task_queue.clone(),
        metrics_port,
    ));

    Ok(Services {
        config,
        store,
        queue,
        metrics,
        dispatcher,
    })
}
