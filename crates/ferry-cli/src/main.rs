use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use ferry_core::impls::{ChaosProcessor, InMemoryQueueStore, PatternProcessor};
use ferry_core::observability::init_tracing;
use ferry_core::{
    MessageProcessor, Producer, QueueKeys, QueueStore, RetryPolicy, WorkerConfig, WorkerGroup,
};
use ferry_redis::RedisQueueStore;
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "ferry", about = "At-least-once queue delivery with retry and poison routing")]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "FERRY_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct StoreArgs {
    #[arg(long, global = true, value_enum, default_value_t = StoreKind::Redis, env = "FERRY_STORE")]
    store: StoreKind,

    #[arg(
        long,
        global = true,
        env = "FERRY_REDIS_URL",
        default_value = "redis://127.0.0.1:6379"
    )]
    redis_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    Memory,
    Redis,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// HTTP producer only.
    Producer(ServeArgs),
    /// Delivery workers only.
    Worker(WorkerArgs),
    /// Producer and workers in one process.
    Standalone {
        #[command(flatten)]
        serve: ServeArgs,
        #[command(flatten)]
        worker: WorkerArgs,
    },
}

#[derive(Debug, Clone, Args)]
struct ServeArgs {
    #[arg(long, env = "FERRY_BIND", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,
}

#[derive(Debug, Clone, Args)]
struct WorkerArgs {
    #[arg(long, env = "FERRY_WORKERS", default_value_t = 1)]
    workers: usize,

    #[arg(long, env = "FERRY_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    #[arg(long, env = "FERRY_MAX_RETRIES", default_value_t = RetryPolicy::DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Payloads containing this text fail processing.
    #[arg(long, env = "FERRY_FAIL_MARKER", default_value = PatternProcessor::DEFAULT_MARKER)]
    fail_marker: String,

    /// Extra random failure probability in [0, 1].
    #[arg(long, env = "FERRY_FAILURE_RATE", default_value_t = 0.0)]
    failure_rate: f64,

    #[arg(long, env = "FERRY_CHAOS_SEED")]
    chaos_seed: Option<u64>,
}

impl WorkerArgs {
    fn config(&self) -> WorkerConfig {
        WorkerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            retry: RetryPolicy::new(self.max_retries),
        }
    }

    fn processor(&self) -> anyhow::Result<Arc<dyn MessageProcessor>> {
        let pattern = PatternProcessor::new(self.fail_marker.clone());
        if self.failure_rate <= 0.0 {
            return Ok(Arc::new(pattern));
        }
        let seed = self.chaos_seed.unwrap_or_else(seed_from_clock);
        let chaos = ChaosProcessor::new(pattern, self.failure_rate, seed)?;
        tracing::info!(failure_rate = chaos.failure_rate(), seed, "chaos failures enabled");
        Ok(Arc::new(chaos))
    }
}

fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

async fn open_store(args: &StoreArgs) -> anyhow::Result<Arc<dyn QueueStore>> {
    match args.store {
        StoreKind::Memory => Ok(Arc::new(InMemoryQueueStore::new())),
        StoreKind::Redis => {
            let store = RedisQueueStore::connect(&args.redis_url)
                .await
                .with_context(|| format!("connect to {}", args.redis_url))?;
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
    tracing::info!("shutdown requested");
}

async fn serve(store: Arc<dyn QueueStore>, args: &ServeArgs) -> anyhow::Result<()> {
    let producer = Producer::new(store, QueueKeys::default());
    let app = ferry_api::build_router(producer);

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("bind {}", args.bind))?;
    tracing::info!(addr = %args.bind, "producer listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;
    Ok(())
}

fn spawn_workers(store: Arc<dyn QueueStore>, args: &WorkerArgs) -> anyhow::Result<WorkerGroup> {
    let group = WorkerGroup::spawn(
        args.workers,
        store,
        args.processor()?,
        QueueKeys::default(),
        args.config(),
    );
    tracing::info!(workers = group.len(), "delivery workers started");
    Ok(group)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if cli.store.store == StoreKind::Memory && !matches!(cli.command, Command::Standalone { .. }) {
        // memory store は同一プロセス内でしか共有できない
        tracing::warn!("memory store is not shared across processes; use standalone");
    }

    let store = open_store(&cli.store).await?;

    match cli.command {
        Command::Producer(serve_args) => serve(store, &serve_args).await,
        Command::Worker(worker_args) => {
            let group = spawn_workers(store, &worker_args)?;
            group
                .run_until(shutdown_signal())
                .await
                .context("delivery workers")?;
            Ok(())
        }
        Command::Standalone { serve: serve_args, worker } => {
            let mut group = spawn_workers(Arc::clone(&store), &worker)?;
            // a dead worker takes the http side down with it
            let served = tokio::select! {
                served = serve(store, &serve_args) => served,
                err = group.wait_any() => {
                    Err(anyhow::Error::new(err).context("delivery worker stopped"))
                }
            };
            let joined = group.shutdown_and_join().await;
            served?;
            joined.context("delivery workers")?;
            Ok(())
        }
    }
}
