//! Configuration for the Modbus bridge.

use std::collections::HashSet;
use std::fmt;

use regbridge_common::{LoggingConfig, RegisterDescriptor};
use regbridge_pipeline::{BridgeConfig, BridgeError, PipelineSettings, Result};
use serde::{Deserialize, Serialize};

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModbusBridgeConfig {
    /// Device side: connection and registers to poll
    pub modbus: ModbusConfig,

    /// Network side: where batches are sent
    #[serde(default)]
    pub udp: UdpConfig,

    /// Poll cadence and queue sizing
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Modbus protocol configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModbusConfig {
    /// Connection type and address
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Modbus unit/slave ID (1-247)
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,

    /// Per-read timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Registers to poll, in read order
    pub registers: Vec<RegisterDescriptor>,
}

fn default_unit_id() -> u8 {
    4
}

fn default_timeout_ms() -> u64 {
    1000
}

/// Connection configuration (TCP or RTU).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionConfig {
    /// Modbus TCP connection
    Tcp {
        /// Host address (IP or hostname)
        host: String,
        /// TCP port (default: 502)
        #[serde(default = "default_modbus_port")]
        port: u16,
    },
    /// Modbus RTU (serial) connection
    Rtu {
        /// Serial device path (e.g., "/dev/ttyUSB0" or "COM1")
        #[serde(default = "default_serial_device")]
        device: String,
        /// Baud rate (default: 19200)
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
        /// Data bits (default: 8)
        #[serde(default = "default_data_bits")]
        data_bits: u8,
        /// Parity: "none", "even", or "odd" (default: "none")
        #[serde(default = "default_parity")]
        parity: String,
        /// Stop bits: 1 or 2 (default: 1)
        #[serde(default = "default_stop_bits")]
        stop_bits: u8,
    },
}

fn default_modbus_port() -> u16 {
    502
}

fn default_serial_device() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    19200
}

fn default_data_bits() -> u8 {
    8
}

fn default_parity() -> String {
    "none".to_string()
}

fn default_stop_bits() -> u8 {
    1
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig::Rtu {
            device: default_serial_device(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            parity: default_parity(),
            stop_bits: default_stop_bits(),
        }
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionConfig::Tcp { host, port } => write!(f, "tcp://{}:{}", host, port),
            ConnectionConfig::Rtu {
                device,
                baud_rate,
                data_bits,
                parity,
                stop_bits,
            } => {
                let parity = parity.chars().next().unwrap_or('n').to_ascii_uppercase();
                write!(
                    f,
                    "rtu://{} {}/{}{}{}",
                    device, baud_rate, data_bits, parity, stop_bits
                )
            }
        }
    }
}

/// Destination of the outbound datagrams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdpConfig {
    /// Destination host (IP or hostname)
    #[serde(default = "default_udp_host")]
    pub host: String,

    /// Destination UDP port
    #[serde(default = "default_udp_port")]
    pub port: u16,
}

fn default_udp_host() -> String {
    "127.0.0.1".to_string()
}

fn default_udp_port() -> u16 {
    9999
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            host: default_udp_host(),
            port: default_udp_port(),
        }
    }
}

impl ModbusConfig {
    /// Register names that appear more than once.
    ///
    /// Duplicates are allowed; within a batch the later read wins.
    pub fn duplicate_register_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for register in &self.registers {
            let name = register.name.as_str();
            if !seen.insert(name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }
}

impl BridgeConfig for ModbusBridgeConfig {
    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn pipeline(&self) -> &PipelineSettings {
        &self.pipeline
    }

    fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;

        if self.modbus.registers.is_empty() {
            return Err(BridgeError::validation(
                "At least one register must be configured",
            ));
        }

        for register in &self.modbus.registers {
            if register.name.is_empty() {
                return Err(BridgeError::validation(format!(
                    "Register at address {}: name cannot be empty",
                    register.address
                )));
            }
        }

        if !(1..=247).contains(&self.modbus.unit_id) {
            return Err(BridgeError::validation(format!(
                "unit_id must be 1-247, got {}",
                self.modbus.unit_id
            )));
        }

        if self.modbus.timeout_ms == 0 {
            return Err(BridgeError::validation("timeout_ms must be greater than 0"));
        }

        match &self.modbus.connection {
            ConnectionConfig::Tcp { host, .. } => {
                if host.is_empty() {
                    return Err(BridgeError::validation("TCP host cannot be empty"));
                }
            }
            ConnectionConfig::Rtu {
                device,
                parity,
                data_bits,
                stop_bits,
                ..
            } => {
                if device.is_empty() {
                    return Err(BridgeError::validation("Serial device cannot be empty"));
                }
                match parity.to_lowercase().as_str() {
                    "none" | "even" | "odd" => {}
                    _ => {
                        return Err(BridgeError::validation(format!(
                            "invalid parity '{}' (use none, even, or odd)",
                            parity
                        )));
                    }
                }
                if !(5..=8).contains(data_bits) {
                    return Err(BridgeError::validation(format!(
                        "data_bits must be 5-8, got {}",
                        data_bits
                    )));
                }
                if !(1..=2).contains(stop_bits) {
                    return Err(BridgeError::validation(format!(
                        "stop_bits must be 1 or 2, got {}",
                        stop_bits
                    )));
                }
            }
        }

        if self.udp.host.is_empty() {
            return Err(BridgeError::validation("UDP host cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rtu_config() {
        let json = r#"{
            modbus: {
                connection: {
                    type: "rtu",
                    device: "/dev/ttyUSB1",
                    baud_rate: 9600,
                    parity: "even"
                },
                unit_id: 5,
                registers: [
                    { address: 25207, name: "Vac", scale: 0.1 }
                ]
            },
            udp: { host: "10.0.0.2", port: 5005 }
        }"#;

        let config = ModbusBridgeConfig::parse(json).unwrap();
        assert_eq!(config.modbus.unit_id, 5);
        assert_eq!(config.udp.host, "10.0.0.2");
        assert_eq!(config.udp.port, 5005);

        if let ConnectionConfig::Rtu {
            device,
            baud_rate,
            parity,
            data_bits,
            stop_bits,
        } = &config.modbus.connection
        {
            assert_eq!(device, "/dev/ttyUSB1");
            assert_eq!(*baud_rate, 9600);
            assert_eq!(parity, "even");
            assert_eq!(*data_bits, 8);
            assert_eq!(*stop_bits, 1);
        } else {
            panic!("Expected RTU connection");
        }
    }

    #[test]
    fn test_defaults() {
        let json = r#"{
            modbus: {
                registers: [ { address: 1, name: "x" } ]
            }
        }"#;

        let config = ModbusBridgeConfig::parse(json).unwrap();
        assert_eq!(config.modbus.connection, ConnectionConfig::default());
        assert_eq!(config.modbus.unit_id, 4);
        assert_eq!(config.modbus.timeout_ms, 1000);
        assert_eq!(config.udp, UdpConfig::default());
        assert_eq!(config.udp.port, 9999);
        assert_eq!(config.pipeline, PipelineSettings::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_serial_device_and_udp_port_are_independent() {
        let json = r#"{
            modbus: {
                connection: { type: "rtu", device: "/dev/ttyS3" },
                registers: [ { address: 1, name: "x" } ]
            },
            udp: { port: 7000 }
        }"#;

        let config = ModbusBridgeConfig::parse(json).unwrap();
        assert_eq!(config.udp.port, 7000);
        assert!(matches!(
            &config.modbus.connection,
            ConnectionConfig::Rtu { device, .. } if device == "/dev/ttyS3"
        ));
    }

    #[test]
    fn test_parse_tcp_config() {
        let json = r#"{
            modbus: {
                connection: { type: "tcp", host: "192.168.1.10" },
                registers: [ { address: 0, name: "Pac" } ]
            }
        }"#;

        let config = ModbusBridgeConfig::parse(json).unwrap();
        assert_eq!(
            config.modbus.connection,
            ConnectionConfig::Tcp {
                host: "192.168.1.10".to_string(),
                port: 502
            }
        );
    }

    #[test]
    fn test_parse_pipeline_settings() {
        let json = r#"{
            modbus: { registers: [ { address: 1, name: "x" } ] },
            pipeline: { poll_interval_ms: 250, register_delay_ms: 0, queue_capacity: 10 }
        }"#;

        let config = ModbusBridgeConfig::parse(json).unwrap();
        assert_eq!(config.pipeline.poll_interval_ms, 250);
        assert_eq!(config.pipeline.register_delay_ms, 0);
        assert_eq!(config.pipeline.idle_wait_ms, 100);
        assert_eq!(config.pipeline.queue_capacity, 10);
    }

    #[test]
    fn test_validate_missing_registers() {
        let json = r#"{ modbus: { registers: [] } }"#;

        let config: ModbusBridgeConfig = json5::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_register_name() {
        let json = r#"{ modbus: { registers: [ { address: 1, name: "" } ] } }"#;

        let config: ModbusBridgeConfig = json5::from_str(json).unwrap();
        assert!(matches!(
            config.validate(),
            Err(BridgeError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_validate_duplicate_names_allowed() {
        let json = r#"{
            modbus: { registers: [ { address: 1, name: "x" }, { address: 2, name: "x" } ] }
        }"#;

        let config: ModbusBridgeConfig = json5::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.modbus.duplicate_register_names(), vec!["x"]);
    }

    #[test]
    fn test_validate_unit_id() {
        let json = r#"{ modbus: { unit_id: 0, registers: [ { address: 1, name: "x" } ] } }"#;

        let config: ModbusBridgeConfig = json5::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_parity() {
        let json = r#"{
            modbus: {
                connection: { type: "rtu", parity: "mark" },
                registers: [ { address: 1, name: "x" } ]
            }
        }"#;

        let config: ModbusBridgeConfig = json5::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_queue_capacity() {
        let json = r#"{
            modbus: { registers: [ { address: 1, name: "x" } ] },
            pipeline: { queue_capacity: 0 }
        }"#;

        let config: ModbusBridgeConfig = json5::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_display() {
        assert_eq!(
            ConnectionConfig::default().to_string(),
            "rtu:///dev/ttyUSB0 19200/8N1"
        );
        let tcp = ConnectionConfig::Tcp {
            host: "plc".to_string(),
            port: 502,
        };
        assert_eq!(tcp.to_string(), "tcp://plc:502");
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config = ModbusBridgeConfig::parse(include_str!("../../regbridge.json5")).unwrap();
        assert_eq!(config.modbus.registers.len(), 4);
        assert_eq!(config.modbus.registers[0].name, "Vac");
        assert!(config.modbus.registers[3].is_signed());
        assert!(config.modbus.duplicate_register_names().is_empty());
    }
}
