//! Measurement batches and their line-oriented wire format.
//!
//! A batch is encoded as a single text line:
//!
//! ```text
//! <timestamp>|<name>:<value>|<name>:<value>...
//! ```
//!
//! The timestamp is seconds since the Unix epoch. Values are written in
//! general notation with six significant digits and no trailing zeros
//! (`231.1`, `0.3`, `980`, `1e+06`), the same text a C `%g` conversion
//! produces. Fields are ordered by register name so the output is
//! deterministic.

use std::collections::BTreeMap;
use std::fmt;

/// One poll cycle's decoded register values.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementBatch {
    /// Seconds since the Unix epoch, taken when the cycle started.
    pub timestamp: i64,

    /// Scaled values keyed by register name.
    pub values: BTreeMap<String, f64>,
}

impl MeasurementBatch {
    /// Start an empty batch stamped with the current time.
    pub fn new() -> Self {
        Self::at(current_timestamp_secs())
    }

    /// Start an empty batch with an explicit timestamp.
    pub fn at(timestamp: i64) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Record a value, replacing any earlier value with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(name.into(), value)
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encode this batch as a wire line.
    pub fn to_line(&self) -> String {
        self.to_string()
    }

    /// Encode this batch as datagram payload bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_line().into_bytes()
    }
}

impl Default for MeasurementBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MeasurementBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.timestamp)?;
        for (name, value) in &self.values {
            write!(f, "|{}:{}", name, format_value(*value))?;
        }
        Ok(())
    }
}

/// Significant digits kept when rendering a value.
const VALUE_PRECISION: i32 = 6;

/// Render a value in general notation: `VALUE_PRECISION` significant digits,
/// fixed form for decimal exponents in `-4..VALUE_PRECISION`, exponent form
/// (`1e+06`, `1e-05`) otherwise, trailing zeros removed.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first; the exponent after rounding
    // decides between fixed and exponent form (999999.5 -> 1e+06).
    let scientific = format!("{:.*e}", (VALUE_PRECISION - 1) as usize, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= VALUE_PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (VALUE_PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

/// Strip trailing zeros, and a then-dangling decimal point, from a fraction.
fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Get the current time in whole seconds since the Unix epoch.
pub fn current_timestamp_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
