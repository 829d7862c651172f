//! switchbot-metrics binary.
//!
//! Serves SwitchBot sensor readings over HTTP, or pushes them to InfluxDB on a schedule.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use switchbot_metrics::{
    devices::switchbot::DEFAULT_API_URL, lifecycle::shutdown_signal, store::DEFAULT_MEASUREMENT,
    DeviceClient, FailurePolicy, InfluxConfig, InfluxWriter, Lifecycle, Metrics, Poller,
    PushConfig, Scheduler, SwitchBotClient, WebConfig, WebServer, DEFAULT_BIND_IP,
    DEFAULT_PUSH_INTERVAL_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS, DEFAULT_WEB_PORT,
};
use tracing::{error, info, Level};
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "switchbot_metrics")]
#[command(about = "Expose SwitchBot sensor readings as metrics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Polls SwitchBot devices and serves their readings over HTTP or pushes them to InfluxDB")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// App ip to listen to
    #[arg(long, env = "BIND_IP", default_value = DEFAULT_BIND_IP)]
    bind_ip: String,

    /// App port to listen to
    #[arg(long, env = "BIND_PORT", default_value_t = DEFAULT_WEB_PORT)]
    bind_port: u16,

    /// SwitchBot Open API token
    #[arg(long, env = "SWITCHBOT_OPENAPI_TOKEN", hide_env_values = true)]
    switchbot_openapi_token: Option<String>,

    /// SwitchBot API secret key
    #[arg(long, env = "SWITCHBOT_SECRET_KEY", hide_env_values = true)]
    switchbot_secret_key: Option<String>,

    /// SwitchBot API base URL
    #[arg(long, env = "SWITCHBOT_API_URL", default_value = DEFAULT_API_URL)]
    switchbot_api_url: String,

    /// What a cycle does when one device fails: fail-fast or fail-soft
    #[arg(long, env = "FAILURE_POLICY", default_value_t = FailurePolicy::FailFast)]
    failure_policy: FailurePolicy,

    /// Seconds in-flight work may take to finish after a shutdown signal
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    shutdown_timeout: u64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve readings over HTTP (default)
    Serve,

    /// Push readings to InfluxDB on a fixed interval
    Push(PushArgs),

    /// Run a single polling cycle and print it
    Snapshot(SnapshotArgs),

    /// List the devices known to the account
    Devices,
}

#[derive(Args)]
struct PushArgs {
    /// InfluxDB base URL
    #[arg(long, env = "INFLUX_URL")]
    influx_url: String,

    /// InfluxDB API token
    #[arg(long, env = "INFLUX_TOKEN", hide_env_values = true)]
    influx_token: String,

    /// InfluxDB organization
    #[arg(long, env = "INFLUX_ORG")]
    influx_org: String,

    /// InfluxDB bucket
    #[arg(long, env = "INFLUX_BUCKET")]
    influx_bucket: String,

    /// Seconds between two pushes
    #[arg(
        short,
        long,
        env = "PUSH_INTERVAL",
        default_value_t = DEFAULT_PUSH_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,

    /// Measurement name
    #[arg(long, default_value = DEFAULT_MEASUREMENT)]
    measurement: String,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let result = match &cli.command {
        Some(Commands::Serve) | None => serve_command(&cli).await,
        Some(Commands::Push(args)) => push_command(&cli, args).await,
        Some(Commands::Snapshot(args)) => snapshot_command(&cli, args).await,
        Some(Commands::Devices) => devices_command(&cli).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::TRACE
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn build_client(cli: &Cli) -> anyhow::Result<SwitchBotClient> {
    let token = cli
        .switchbot_openapi_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .context("missing SwitchBot token (--switchbot-openapi-token or SWITCHBOT_OPENAPI_TOKEN)")?;
    let secret = cli
        .switchbot_secret_key
        .as_deref()
        .filter(|s| !s.is_empty())
        .context("missing SwitchBot secret (--switchbot-secret-key or SWITCHBOT_SECRET_KEY)")?;

    SwitchBotClient::with_base_url(&cli.switchbot_api_url, token, secret)
        .context("failed to build SwitchBot client")
}

fn build_poller(cli: &Cli) -> anyhow::Result<Poller> {
    let client = build_client(cli)?;
    info!("Failure policy: {}", cli.failure_policy);
    Ok(Poller::new(Arc::new(client)).with_policy(cli.failure_policy))
}

async fn serve_command(cli: &Cli) -> anyhow::Result<()> {
    info!("Starting switchbot-metrics serve...");

    let poller = build_poller(cli)?;
    let lifecycle = Lifecycle::new(Duration::from_secs(cli.shutdown_timeout));

    let web_config = WebConfig::new(&cli.bind_ip, cli.bind_port);
    let server = WebServer::bind(web_config, poller, &lifecycle)
        .await
        .context("switchbot-metrics serve unable to start")?;

    lifecycle.run(server.serve(), shutdown_signal()).await?;

    info!("switchbot-metrics serve stopped.");
    Ok(())
}

async fn push_command(cli: &Cli, args: &PushArgs) -> anyhow::Result<()> {
    info!("Starting switchbot-metrics push...");

    let poller = build_poller(cli)?;
    let store = InfluxWriter::new(InfluxConfig::new(
        &args.influx_url,
        &args.influx_token,
        &args.influx_org,
        &args.influx_bucket,
    ))
    .context("switchbot-metrics push unable to start")?;

    info!("Push configuration:");
    info!("  - InfluxDB: {}", args.influx_url);
    info!("  - Organization: {}", args.influx_org);
    info!("  - Bucket: {}", args.influx_bucket);
    info!("  - Interval: {}s", args.interval);

    let push_config = PushConfig::default()
        .with_interval(Duration::from_secs(args.interval))
        .with_measurement(&args.measurement);
    let scheduler = Scheduler::new(poller, Arc::new(store), push_config)
        .context("switchbot-metrics push unable to start")?;

    let lifecycle = Lifecycle::new(Duration::from_secs(cli.shutdown_timeout));
    let token = lifecycle.token();
    lifecycle.run(scheduler.run(token), shutdown_signal()).await?;

    info!("switchbot-metrics push stopped.");
    Ok(())
}

async fn snapshot_command(cli: &Cli, args: &SnapshotArgs) -> anyhow::Result<()> {
    let poller = build_poller(cli)?;
    let metrics = poller.run_cycle().await?;

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&metrics)?;
            println!("{}", json);
        }
        "pretty" => {
            print_pretty_metrics(&metrics);
        }
        other => {
            anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other);
        }
    }

    Ok(())
}

async fn devices_command(cli: &Cli) -> anyhow::Result<()> {
    let client = build_client(cli)?;
    let devices = client.list_devices().await?;

    println!("{:<16} {:<24} {:<14} {:<16} Polled", "ID", "Name", "Type", "Hub");
    for device in &devices {
        println!(
            "{:<16} {:<24} {:<14} {:<16} {}",
            device.id,
            device.name,
            device.device_type,
            device.hub_id,
            if device.is_hub_only() { "no" } else { "yes" }
        );
    }
    Ok(())
}

fn print_pretty_metrics(metrics: &Metrics) {
    println!(
        "Device Readings ({})",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");

    for reading in &metrics.devices_value {
        println!();
        println!("{} ({})", reading.device_name, reading.device_type);
        println!("  Temperature: {:.1}°C", reading.temperature);
        println!("  Humidity: {}%", reading.humidity);
        println!("  Battery: {}%", reading.battery);
    }

    if !metrics.failures.is_empty() {
        println!();
        println!("Failed devices:");
        for failure in &metrics.failures {
            println!(
                "  {} ({}): {}",
                failure.device_name, failure.device_type, failure.error
            );
        }
    }
}
