//! Modbus to UDP bridge.
//!
//! Polls Modbus registers and forwards each cycle as a UDP text line.

use anyhow::{Context, Result};
use regbridge_modbus::config::ModbusBridgeConfig;
use regbridge_modbus::reader::ModbusReader;
use regbridge_modbus::sender::UdpSender;
use regbridge_pipeline::{BridgeArgs, BridgeConfig, Pipeline, wait_for_shutdown_signal};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = BridgeArgs::parse_with_default("regbridge.json5");

    // Load configuration
    let config = ModbusBridgeConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    // Initialize logging
    let log_config = match &args.log_level {
        Some(level) => config.logging.with_level(level.clone()),
        None => config.logging.clone(),
    };
    regbridge_common::init_tracing(&log_config).context("Failed to init tracing")?;

    let udp_target = format!("{}:{}", config.udp.host, config.udp.port);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting regbridge-modbus");
    info!(
        config = ?args.config,
        connection = %config.modbus.connection,
        unit_id = config.modbus.unit_id,
        udp = %udp_target,
        poll_interval_ms = config.pipeline.poll_interval_ms,
        registers = config.modbus.registers.len(),
        "Loaded configuration"
    );
    for name in config.modbus.duplicate_register_names() {
        warn!(register = name, "Duplicate register name, later reads overwrite earlier ones");
    }

    let reader = ModbusReader::connect(&config.modbus)
        .await
        .context("Failed to connect to Modbus device")?;

    let sender = UdpSender::bind(&config.udp.host, config.udp.port)
        .await
        .context("Failed to initialize UDP sender")?;

    let pipeline = Pipeline::start(
        config.modbus.registers.clone(),
        &config.pipeline,
        reader,
        sender,
    );
    info!("Bridge running. Press Ctrl+C to stop.");

    wait_for_shutdown_signal()
        .await
        .context("Failed to listen for shutdown signal")?;

    let snapshot = pipeline.shutdown().await?;
    info!(
        queue_size = snapshot.queued,
        dropped_batches = snapshot.dropped,
        "Modbus bridge stopped"
    );

    Ok(())
}
