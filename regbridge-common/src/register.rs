//! Register descriptors and raw value decoding.

use serde::{Deserialize, Serialize};

/// Declared width/interpretation of a register.
///
/// Only single 16-bit registers are read; `i16` is shorthand for an unsigned
/// read reinterpreted as two's complement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Unsigned 16-bit integer (default)
    #[default]
    #[serde(alias = "UInt16", alias = "uint16")]
    U16,
    /// Signed 16-bit integer
    #[serde(alias = "Int16", alias = "int16")]
    I16,
}

/// A named, addressed register on the polled device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterDescriptor {
    /// Register address (0-based)
    pub address: u16,

    /// Name used as the key in a measurement batch
    pub name: String,

    /// Scaling factor applied after sign interpretation
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Reinterpret the raw value as two's complement
    #[serde(default, alias = "isSigned")]
    pub signed: bool,

    /// Declared data type
    #[serde(default, alias = "dataType")]
    pub data_type: DataType,
}

fn default_scale() -> f64 {
    1.0
}

impl RegisterDescriptor {
    /// Create an unsigned descriptor with a scale of 1.0.
    pub fn new(address: u16, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            scale: default_scale(),
            signed: false,
            data_type: DataType::U16,
        }
    }

    /// Set the scaling factor.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Mark the register as signed.
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Whether raw values are interpreted as two's complement.
    pub fn is_signed(&self) -> bool {
        self.signed || self.data_type == DataType::I16
    }
}

/// Decode a raw 16-bit register value into a scaled measurement.
pub fn decode(raw: u16, descriptor: &RegisterDescriptor) -> f64 {
    if descriptor.is_signed() {
        f64::from(raw as i16) * descriptor.scale
    } else {
        f64::from(raw) * descriptor.scale
    }
}
