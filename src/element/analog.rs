//! Analog sensor — a resistive divider read through the ADC
//! (photoresistor on the reference board).
//!
//! The raw count is inverted and normalised against the configured
//! full-scale value: a dark photoresistor pulls the divider to full scale
//! and reads 0 %, a bright one reads towards 100 %.
//!
//! ```text
//!   value = ((max − raw) × 100) / max      (integer percent)
//! ```

use super::markup;
use super::{Capability, Element};
use crate::app::ports::AnalogInput;
use crate::error::ElementError;

pub struct AnalogSensor<A> {
    name: String,
    gpio: i32,
    max: u16,
    input: A,
}

impl<A: AnalogInput> AnalogSensor<A> {
    /// `max` is the raw full-scale count; zero is treated as one.
    pub fn new(gpio: i32, max: u16, input: A) -> Self {
        Self {
            name: format!("photoresistor_{gpio}"),
            gpio,
            max: max.max(1),
            input,
        }
    }
}

/// Inverted percentage of `raw` against `max`, clamped to `[0, 100]`.
pub fn inverted_percent(raw: u16, max: u16) -> f32 {
    let max = u32::from(max.max(1));
    let raw = u32::from(raw).min(max);
    (((max - raw) * 100) / max) as f32
}

impl<A: AnalogInput> Element for AnalogSensor<A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::SensedOnly
    }

    fn read_value(&mut self) -> Result<f32, ElementError> {
        let raw = self.input.read_raw()?;
        Ok(inverted_percent(raw, self.max))
    }

    fn write_value(&mut self, _on: bool) -> Result<(), ElementError> {
        Err(ElementError::unsupported_write())
    }

    fn render(&self) -> String {
        let header = format!("Photoresistor on {}", self.gpio);
        markup::card(&header, "Luminance (%)", &self.name, "")
    }
}
