//! Padcast - broadcast a local gamepad to remote receivers
//!
//! Wires the pieces together: configuration, one transport per channel, the
//! channel registry, the routing loops (hotkeys, slider, push-buttons), the
//! indicator reflector, and the broadcast loop itself.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use padcast::broadcast::Broadcaster;
use padcast::config::Config;
use padcast::hardware::{BridgeDriver, PeripheralDriver};
use padcast::input::gamepad::GamepadSource;
use padcast::registry::{ChannelDescriptor, ChannelRegistry, IndicatorBinding};
use padcast::report::XInputReportBuilder;
use padcast::router::{refresh_channel, Router};
use padcast::transport::{ChannelTransport, Credentials, TcpTransport};

/// Padcast - broadcast a local gamepad to remote receivers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("Starting Padcast...");
    info!("Configuration file: {}", args.config);

    let config = Config::load(&args.config).await?;
    config.validate()?;
    info!("Configuration loaded: {} channel(s)", config.channels.len());

    run_app(config).await?;

    info!("Padcast shutdown complete");
    Ok(())
}

async fn run_app(config: Config) -> Result<()> {
    // Connect every channel transport up front. A channel that cannot be
    // reached at startup is a configuration problem, not a runtime hiccup.
    let mut channels = Vec::with_capacity(config.channels.len());
    for (index, channel) in config.channels.iter().enumerate() {
        let transport: Arc<dyn ChannelTransport> = Arc::new(TcpTransport::new(
            &channel.host,
            channel.port,
            Credentials {
                key: channel.encryption_key.clone(),
                mode: channel.encryption_mode.clone(),
            },
        ));
        transport
            .connect()
            .await
            .with_context(|| format!("Failed to connect channel {} ({})", index, transport.describe()))?;
        info!("Channel {} connected: {}", index, transport.describe());

        channels.push(ChannelDescriptor {
            transport,
            remote_index: channel.remote_index,
            indicator: channel.indicator.as_ref().map(|ind| IndicatorBinding {
                uid: ind.uid.clone(),
                color_on: ind.color_on,
                color_off: ind.color_off,
            }),
        });
    }

    let registry = Arc::new(ChannelRegistry::new(channels));
    let (refresh, refresh_rx) = refresh_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let router = Router::new(registry.clone(), refresh.clone(), shutdown_rx.clone());

    // The slider/push-button bridge is optional equipment: hotkeys still
    // route channels when it is absent or unreachable.
    let mut driver: Option<Arc<dyn PeripheralDriver>> = None;
    let mut hardware_handle = None;
    if let Some(hw) = &config.hardware {
        let indicator_uids: Vec<String> = registry
            .channels()
            .iter()
            .filter_map(|c| c.indicator.as_ref().map(|ind| ind.uid.clone()))
            .collect();

        match BridgeDriver::connect(&hw.host, hw.port, indicator_uids).await {
            Ok((bridge, events)) => {
                info!("Hardware bridge connected: {}:{}", hw.host, hw.port);
                driver = Some(Arc::new(bridge));
                hardware_handle = Some(router.spawn_hardware(
                    events,
                    hw.slider.lower_threshold,
                    hw.slider.upper_threshold,
                ));
            }
            Err(e) => {
                error!("Hardware bridge unavailable, continuing without it: {}", e);
            }
        }
    }

    let reflector_handle = router.spawn_reflector(driver.clone(), refresh_rx);

    let bindings = Router::hotkey_bindings(&config)?;
    let hotkey_handle = if bindings.is_empty() {
        info!("No hotkeys configured");
        None
    } else {
        info!("Polling {} hotkey binding(s)", bindings.len());
        Some(router.spawn_hotkeys(bindings, Duration::from_millis(config.hotkey_poll_ms)))
    };

    let (gamepad, input_events) = GamepadSource::start(config.local_gamepad_index);
    let broadcaster = Broadcaster::new(
        registry.clone(),
        Box::new(XInputReportBuilder),
        Duration::from_millis(config.send_timeout_ms),
    );
    let broadcast_handle = tokio::spawn(broadcaster.run(input_events, shutdown_rx));

    // Paint the initial all-inactive status line.
    refresh.request();
    info!("Ready: all channels inactive");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to install CTRL+C signal handler")?;
    info!("Shutdown signal received, stopping...");

    let _ = shutdown_tx.send(true);
    drop(gamepad);

    broadcast_handle.await.ok();
    reflector_handle.await.ok();
    if let Some(handle) = hardware_handle {
        handle.await.ok();
    }
    if let Some(handle) = hotkey_handle {
        handle.await.ok();
    }

    for (index, channel) in registry.channels().iter().enumerate() {
        if let Err(e) = channel.transport.close().await {
            warn!("Failed to close channel {}: {}", index, e);
        }
    }
    if let Some(driver) = driver {
        // Blanks every known indicator before disconnecting.
        if let Err(e) = driver.close().await {
            warn!("Failed to close hardware bridge: {}", e);
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
