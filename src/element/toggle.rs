//! Toggle output — one digital output line (e.g. an indicator LED).
//!
//! Generic over any `embedded-hal` stateful output pin, so the same element
//! drives the ESP32 [`GpioOutput`](crate::adapters::hardware::GpioOutput)
//! on target and an in-memory pin in tests.  The reported value is the
//! observed output level scaled to 0 / 100.

use embedded_hal::digital::{PinState, StatefulOutputPin};

use super::markup;
use super::{Capability, Element};
use crate::error::ElementError;

pub struct ToggleOutput<P> {
    name: String,
    gpio: i32,
    pin: P,
}

impl<P: StatefulOutputPin> ToggleOutput<P> {
    pub fn new(gpio: i32, pin: P) -> Self {
        Self {
            name: format!("led_{gpio}"),
            gpio,
            pin,
        }
    }
}

impl<P: StatefulOutputPin> Element for ToggleOutput<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::SensedActuated
    }

    fn read_value(&mut self) -> Result<f32, ElementError> {
        let high = self
            .pin
            .is_set_high()
            .map_err(|_| ElementError::Hardware("output level read failed"))?;
        Ok(if high { 100.0 } else { 0.0 })
    }

    fn write_value(&mut self, on: bool) -> Result<(), ElementError> {
        self.pin
            .set_state(PinState::from(on))
            .map_err(|_| ElementError::Hardware("output level write failed"))
    }

    fn render(&self) -> String {
        let header = format!("LED on {}", self.gpio);
        let control = markup::toggle_control(&self.name, "LED");
        markup::card(&header, "Luminance (%)", &self.name, &control)
    }
}
