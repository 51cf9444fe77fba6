//! hostpulse - host metrics collector and snapshot server.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use hostpulse::{
    metrics::{builder::SnapshotBuilder, CounterSource},
    shutdown_signal, start_web_server, ChannelGuard, Collector, CollectorConfig, FileChannel,
    HostSampler, MemoryChannel, Snapshot, WebConfig, DEFAULT_BACKOFF_MS, DEFAULT_CHANNEL_PATH,
    DEFAULT_CPU_WINDOW_MS, DEFAULT_MAX_BACKOFF_MS, DEFAULT_WEB_HOST, DEFAULT_WEB_PORT,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "hostpulse")]
#[command(about = "Host metrics collector with a latest-snapshot HTTP endpoint")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Samples CPU, memory, disk and network I/O, and load average, and serves the newest sample at GET /metrics"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Channel file shared by `collect` and `serve`
    #[arg(long, env = "HOSTPULSE_CHANNEL", default_value = DEFAULT_CHANNEL_PATH, global = true)]
    channel: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample the host and publish snapshots to the channel file
    Collect(CollectArgs),

    /// Serve the latest snapshot from the channel file
    Serve(ServeArgs),

    /// Collect and serve in one process without a channel file (default)
    Run(RunArgs),

    /// Take a single snapshot and exit
    Snapshot(SnapshotArgs),
}

#[derive(Args, Clone)]
struct CollectArgs {
    /// CPU observation window in milliseconds
    #[arg(long, default_value_t = DEFAULT_CPU_WINDOW_MS)]
    cpu_window_ms: u64,

    /// Delay after the first failed pass in milliseconds
    #[arg(long, default_value_t = DEFAULT_BACKOFF_MS)]
    backoff_ms: u64,

    /// Upper bound for the retry delay in milliseconds
    #[arg(long, default_value_t = DEFAULT_MAX_BACKOFF_MS)]
    max_backoff_ms: u64,
}

#[derive(Args, Clone)]
struct ServeArgs {
    /// Web server bind address
    #[arg(long, env = "HOSTPULSE_HOST", default_value = DEFAULT_WEB_HOST)]
    host: String,

    /// Web server port
    #[arg(short, long, env = "HOSTPULSE_PORT", default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,
}

#[derive(Args, Clone)]
struct RunArgs {
    #[command(flatten)]
    collect: CollectArgs,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,

    /// CPU observation window in milliseconds
    #[arg(long, default_value_t = DEFAULT_CPU_WINDOW_MS)]
    cpu_window_ms: u64,
}

impl CollectArgs {
    fn config(&self) -> CollectorConfig {
        CollectorConfig::default()
            .with_cpu_window(Duration::from_millis(self.cpu_window_ms))
            .with_backoff(
                Duration::from_millis(self.backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            )
    }
}

impl ServeArgs {
    fn config(&self) -> WebConfig {
        WebConfig::new(&self.host, self.port).with_cors(!self.no_cors)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Collect(args)) => collect_command(&cli, args).await,
        Some(Commands::Serve(args)) => serve_command(&cli, args).await,
        Some(Commands::Run(args)) => run_command(args).await,
        Some(Commands::Snapshot(args)) => snapshot_command(args).await,
        None => {
            let args = RunArgs::default();
            run_command(&args).await
        }
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // RUST_LOG wins over the command-line level when set
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    Ok(())
}

async fn collect_command(cli: &Cli, args: &CollectArgs) -> anyhow::Result<()> {
    let config = args.config();
    let guard: ChannelGuard = FileChannel::acquire(&cli.channel)
        .with_context(|| format!("failed to create channel at {}", cli.channel.display()))?;

    let collector = Collector::new(
        HostSampler::new(config.cpu_window),
        guard.channel(),
        config.build_backoff(),
    );

    tokio::select! {
        _ = collector.run() => {}
        _ = shutdown_signal() => {}
    }

    info!("Collector shutting down, removing {}", guard.path().display());
    drop(guard);
    Ok(())
}

async fn serve_command(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    let channel = Arc::new(FileChannel::open(&cli.channel));
    start_web_server(args.config(), channel, shutdown_signal()).await?;
    Ok(())
}

async fn run_command(args: &RunArgs) -> anyhow::Result<()> {
    let config = args.collect.config();
    let channel = Arc::new(MemoryChannel::new());

    let collector = Collector::new(
        HostSampler::new(config.cpu_window),
        channel.clone(),
        config.build_backoff(),
    );
    let collector_task = tokio::spawn(collector.run());

    let served = start_web_server(args.serve.config(), channel, shutdown_signal()).await;
    collector_task.abort();
    served?;
    Ok(())
}

async fn snapshot_command(args: &SnapshotArgs) -> anyhow::Result<()> {
    let mut sampler = HostSampler::new(Duration::from_millis(args.cpu_window_ms));
    let baseline = sampler.read().await?;
    let mut builder = SnapshotBuilder::new(&baseline);
    let snapshot = builder.build(&sampler.read().await?);

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        "pretty" => print_pretty_snapshot(&snapshot),
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

fn print_pretty_snapshot(snapshot: &Snapshot) {
    println!(
        "Host Snapshot ({})",
        chrono::DateTime::from_timestamp_millis((snapshot.timestamp * 1000.0) as i64)
            .unwrap_or_default()
            .format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");
    println!("  CPU:      {:.1}%", snapshot.cpu_percent);
    println!("  Memory:   {:.1}%", snapshot.memory_percent);
    println!(
        "  Disk I/O: {:.1} KB",
        snapshot.disk_io_bytes as f64 / 1024.0
    );
    println!("  Net I/O:  {:.1} KB", snapshot.net_io_bytes as f64 / 1024.0);
    println!("  Load:     {:.2}", snapshot.load_avg);
}

impl Default for CollectArgs {
    fn default() -> Self {
        Self {
            cpu_window_ms: DEFAULT_CPU_WINDOW_MS,
            backoff_ms: DEFAULT_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            collect: CollectArgs::default(),
            serve: ServeArgs {
                host: DEFAULT_WEB_HOST.to_string(),
                port: DEFAULT_WEB_PORT,
                no_cors: false,
            },
        }
    }
}
