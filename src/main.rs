//! Gazecast - Eye and Face Tracking OSC Forwarder
//!
//! Main entry point for the CLI application.

use clap::{error::ErrorKind, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gazecast::{
    config::{Config, DeviceKind, TrackingMode},
    mapping::{describe_taxonomy, ChannelMapping},
    output::{packet::PacketBuilder, transport::UdpTransport},
    pipeline::Pipeline,
    scheduler::TickScheduler,
    tracking::{
        acquirer::SampleAcquirer, bridge::BridgeDevice, device::TrackingDevice,
        simulated::SimulatedDevice,
    },
};

/// Exit status for any startup failure (-1 as a process status)
const STARTUP_FAILURE: u8 = 255;

/// Gazecast - forward eye and face tracking as OSC over UDP
#[derive(Parser, Debug)]
#[command(name = "gazecast", version, about, long_about = None)]
struct Args {
    /// Destination host (overrides config)
    host: Option<String>,

    /// Destination UDP port (overrides config)
    port: Option<u16>,

    /// Tick period in milliseconds (overrides config)
    period_ms: Option<u64>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Signal families to forward: eye, face or full (overrides config)
    #[arg(short, long)]
    mode: Option<TrackingMode>,

    /// Expression scale factor file (overrides config)
    #[arg(long)]
    rate_file: Option<PathBuf>,

    /// Expression OSC address file (overrides config)
    #[arg(long)]
    address_file: Option<PathBuf>,

    /// Use synthetic tracking data instead of the device bridge
    #[arg(long)]
    simulate: bool,

    /// Print the expression taxonomy and exit
    #[arg(long)]
    list_expressions: bool,

    /// Write template rate/address files into DIR and exit
    #[arg(long, value_name = "DIR")]
    write_mapping: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                return ExitCode::from(STARTUP_FAILURE);
            }
        },
    };

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(STARTUP_FAILURE)
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if args.list_expressions {
        print!("{}", describe_taxonomy());
        return Ok(());
    }

    if let Some(ref dir) = args.write_mapping {
        let (rate_path, address_path) = ChannelMapping::write_templates(dir)?;
        println!("{}", rate_path.display());
        println!("{}", address_path.display());
        return Ok(());
    }

    info!("Starting {} v{}", gazecast::NAME, gazecast::VERSION);

    let config = load_config(&args)?;

    info!("Mode: {:?}", config.mode);
    info!(
        "Destination: {}:{} every {} ms",
        config.output.host, config.output.port, config.output.tick_ms
    );
    info!("Device: {:?}", config.device.kind);

    let pipeline = Pipeline::from_config(&config)?;
    let builder = PacketBuilder::new(config.output.max_packet_size);
    let period = Duration::from_millis(config.output.tick_ms);

    // Single-threaded: every tick runs start to finish on this thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    // The helper subprocess must be spawned inside the runtime
    let device = {
        let _guard = runtime.enter();
        open_device(&config, period)?
    };

    let transport = UdpTransport::open(&config.output.host, config.output.port)?;
    let mut scheduler = TickScheduler::new(
        SampleAcquirer::new(device),
        pipeline,
        builder,
        transport,
        period,
    )?;

    runtime.block_on(async {
        scheduler
            .run(async {
                shutdown_signal().await;
                info!("Shutdown signal received");
            })
            .await
    });

    // Drop the device (and any helper process) while the runtime is alive
    drop(scheduler);

    info!("Gazecast stopped");
    Ok(())
}

/// Defaults, then the config file, then command-line overrides
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    if let Some(ref host) = args.host {
        config.output.host = host.clone();
    }
    if let Some(port) = args.port {
        config.output.port = port;
    }
    if let Some(period_ms) = args.period_ms {
        config.output.tick_ms = period_ms;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(ref path) = args.rate_file {
        config.face.rate_file = path.clone();
    }
    if let Some(ref path) = args.address_file {
        config.face.address_file = path.clone();
    }
    if args.simulate {
        config.device.kind = DeviceKind::Simulated;
    }

    config.validate()?;
    Ok(config)
}

fn open_device(config: &Config, period: Duration) -> anyhow::Result<Box<dyn TrackingDevice>> {
    let device: Box<dyn TrackingDevice> = match config.device.kind {
        DeviceKind::Bridge => Box::new(BridgeDevice::open(&config.device)?),
        DeviceKind::Simulated => {
            warn!("Using simulated tracking data");
            Box::new(SimulatedDevice::new(period))
        }
    };
    Ok(device)
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazecast::error::{GazecastError, MappingError};

    fn config_file(dir: &tempfile::TempDir, contents: &str) -> String {
        let path = dir.path().join("gazecast.toml");
        std::fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_positional_order() {
        let args = Args::try_parse_from(["gazecast", "10.0.0.5", "9001", "16"]).unwrap();
        assert_eq!(args.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(args.port, Some(9001));
        assert_eq!(args.period_ms, Some(16));
    }

    #[test]
    fn test_positionals_are_optional() {
        let args = Args::try_parse_from(["gazecast", "192.168.1.2"]).unwrap();
        assert_eq!(args.host.as_deref(), Some("192.168.1.2"));
        assert_eq!(args.port, None);
        assert_eq!(args.period_ms, None);
    }

    #[test]
    fn test_malformed_positionals_are_rejected() {
        let err = Args::try_parse_from(["gazecast", "127.0.0.1", "notaport"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        let err = Args::try_parse_from(["gazecast", "127.0.0.1", "9000", "33ms"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        assert!(Args::try_parse_from(["gazecast", "--mode", "mouth"]).is_err());
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = Args::try_parse_from(["gazecast", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_arguments_override_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = config_file(
            &dir,
            "mode = \"eye\"\n[output]\nhost = \"10.1.1.1\"\nport = 7000\ntick_ms = 50\n",
        );

        let args = Args::try_parse_from([
            "gazecast", "127.0.0.1", "9002", "20", "--config", &path, "--mode", "full",
            "--simulate",
        ])
        .unwrap();
        let config = load_config(&args).unwrap();

        assert_eq!(config.output.host, "127.0.0.1");
        assert_eq!(config.output.port, 9002);
        assert_eq!(config.output.tick_ms, 20);
        assert_eq!(config.mode, TrackingMode::Full);
        assert_eq!(config.device.kind, DeviceKind::Simulated);
    }

    #[test]
    fn test_config_file_values_survive_without_overrides() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = config_file(&dir, "[output]\nhost = \"10.1.1.1\"\nport = 7000\n");

        let args = Args::try_parse_from(["gazecast", "--config", &path]).unwrap();
        let config = load_config(&args).unwrap();

        assert_eq!(config.output.host, "10.1.1.1");
        assert_eq!(config.output.port, 7000);
        assert_eq!(config.output.tick_ms, 33);
    }

    #[test]
    fn test_zero_port_fails_validation() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = config_file(&dir, "");

        let args = Args::try_parse_from(["gazecast", "127.0.0.1", "0", "--config", &path]).unwrap();
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_startup_diagnostic_is_not_repeated() {
        let e = anyhow::Error::from(GazecastError::from(MappingError::Truncated {
            path: PathBuf::from("rate.txt"),
            expected: 63,
            found: 1,
        }));

        let message = format!("{}", e);
        assert_eq!(message.matches("expected at least 63").count(), 1);
    }
}
