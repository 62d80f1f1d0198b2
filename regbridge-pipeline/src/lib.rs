//! regbridge Pipeline
//!
//! The concurrent core of a register-polling bridge: a poll producer and a
//! send consumer connected by a bounded, drop-oldest queue.
//!
//! # Overview
//!
//! This crate provides:
//! - [`DropOldestQueue`] the shared buffer and its overflow policy
//! - [`RegisterReader`] / [`DatagramSender`] seams for the device and network transports
//! - [`PollProducer`] reading every register once per cycle
//! - [`SendConsumer`] forwarding the oldest batch per iteration
//! - [`Pipeline`] for starting both tasks and stopping them in order
//! - [`BridgeConfig`] and [`BridgeArgs`] for configuration loading and the CLI
//!
//! # Example
//!
//! ```ignore
//! use regbridge_pipeline::{BridgeArgs, BridgeConfig, Pipeline, wait_for_shutdown_signal};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = BridgeArgs::parse_with_default("mybridge.json5");
//!     let config = MyBridgeConfig::load(&args.config)?;
//!
//!     let pipeline = Pipeline::start(config.registers(), config.pipeline(), reader, sender);
//!     wait_for_shutdown_signal().await?;
//!     pipeline.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod args;
mod config;
mod consumer;
mod error;
mod pipeline;
mod producer;
mod queue;
mod stats;
mod transport;

pub use args::BridgeArgs;
pub use config::BridgeConfig;
pub use consumer::{DEFAULT_IDLE_WAIT, SendConsumer};
pub use error::{BridgeError, Result, TransportError};
pub use pipeline::{Pipeline, PipelineSettings, wait_for_shutdown_signal};
pub use producer::{CycleOutcome, DEFAULT_POLL_INTERVAL, DEFAULT_REGISTER_DELAY, PollProducer};
pub use queue::{DEFAULT_CAPACITY, DropOldestQueue};
pub use stats::{PipelineStats, StatsSnapshot};
pub use transport::{DatagramSender, RegisterReader};

// Re-export commonly used types from regbridge-common
pub use regbridge_common::{LoggingConfig, MeasurementBatch, RegisterDescriptor};
