//! Modbus register reader.

use std::time::Duration;

use regbridge_pipeline::{RegisterReader, TransportError};
use tokio_modbus::client::{Context, Reader};
use tokio_modbus::prelude::*;
use tracing::info;

use crate::config::{ConnectionConfig, ModbusConfig};

/// Reads holding registers from one Modbus unit, one register per request.
pub struct ModbusReader {
    ctx: Context,
    timeout: Duration,
}

impl ModbusReader {
    /// Connect to the Modbus device.
    pub async fn connect(config: &ModbusConfig) -> Result<Self, TransportError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let slave = Slave(config.unit_id);

        let ctx = match &config.connection {
            ConnectionConfig::Tcp { host, port } => {
                let addr = tokio::net::lookup_host((host.as_str(), *port))
                    .await?
                    .next()
                    .ok_or_else(|| {
                        TransportError::Protocol(format!("No address found for {}", host))
                    })?;

                tokio::time::timeout(timeout, tcp::connect_slave(addr, slave))
                    .await
                    .map_err(|_| TransportError::Timeout(timeout))??
            }
            ConnectionConfig::Rtu {
                device,
                baud_rate,
                data_bits,
                parity,
                stop_bits,
            } => {
                let builder = tokio_serial::new(device, *baud_rate)
                    .parity(serial_parity(parity))
                    .stop_bits(serial_stop_bits(*stop_bits))
                    .data_bits(serial_data_bits(*data_bits));

                let serial = tokio_serial::SerialStream::open(&builder).map_err(|e| {
                    TransportError::Protocol(format!("Serial open failed: {}", e))
                })?;

                rtu::attach_slave(serial, slave)
            }
        };

        info!(
            connection = %config.connection,
            unit_id = config.unit_id,
            "Connected to Modbus device"
        );

        Ok(Self { ctx, timeout })
    }
}

impl RegisterReader for ModbusReader {
    async fn read_register(&mut self, address: u16) -> Result<u16, TransportError> {
        let words = tokio::time::timeout(self.timeout, self.ctx.read_holding_registers(address, 1))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
            .map_err(|e| TransportError::Protocol(e.to_string()))?
            .map_err(|e| TransportError::Exception(format!("{:?}", e)))?;

        words
            .first()
            .copied()
            .ok_or_else(|| TransportError::Protocol("Empty register response".to_string()))
    }
}

fn serial_parity(parity: &str) -> tokio_serial::Parity {
    match parity.to_lowercase().as_str() {
        "even" => tokio_serial::Parity::Even,
        "odd" => tokio_serial::Parity::Odd,
        _ => tokio_serial::Parity::None,
    }
}

fn serial_stop_bits(stop_bits: u8) -> tokio_serial::StopBits {
    match stop_bits {
        2 => tokio_serial::StopBits::Two,
        _ => tokio_serial::StopBits::One,
    }
}

fn serial_data_bits(data_bits: u8) -> tokio_serial::DataBits {
    match data_bits {
        5 => tokio_serial::DataBits::Five,
        6 => tokio_serial::DataBits::Six,
        7 => tokio_serial::DataBits::Seven,
        _ => tokio_serial::DataBits::Eight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_parity() {
        assert_eq!(serial_parity("none"), tokio_serial::Parity::None);
        assert_eq!(serial_parity("Even"), tokio_serial::Parity::Even);
        assert_eq!(serial_parity("odd"), tokio_serial::Parity::Odd);
    }

    #[test]
    fn test_serial_framing() {
        assert_eq!(serial_stop_bits(1), tokio_serial::StopBits::One);
        assert_eq!(serial_stop_bits(2), tokio_serial::StopBits::Two);
        assert_eq!(serial_data_bits(7), tokio_serial::DataBits::Seven);
        assert_eq!(serial_data_bits(8), tokio_serial::DataBits::Eight);
    }

    #[tokio::test]
    async fn test_connect_missing_serial_device_fails() {
        let config = ModbusConfig {
            connection: ConnectionConfig::Rtu {
                device: "/dev/regbridge-does-not-exist".to_string(),
                baud_rate: 19200,
                data_bits: 8,
                parity: "none".to_string(),
                stop_bits: 1,
            },
            unit_id: 4,
            timeout_ms: 100,
            registers: Vec::new(),
        };

        assert!(ModbusReader::connect(&config).await.is_err());
    }
}
