//! Temperature probe — one DS18B20 on the shared 1-Wire bus.
//!
//! Several probes share one [`TemperatureBus`]; each holds a reference to
//! the bus and its enumeration index.  Every read triggers a bus-wide
//! conversion and then fetches this probe's result, so the cost of a read
//! is a full bus transaction paid synchronously on the control loop.
//!
//! A failed bus transaction reports [`DISCONNECTED_C`] rather than an error
//! so the snapshot key set stays stable while a probe is unplugged.

use core::cell::RefCell;
use std::rc::Rc;

use log::warn;

use super::markup;
use super::{Capability, Element};
use crate::app::ports::TemperatureBus;
use crate::error::ElementError;

/// Sentinel reported for a probe that did not answer.
pub const DISCONNECTED_C: f32 = -127.0;

pub struct TemperatureProbe<B> {
    name: String,
    index: u8,
    bus: Rc<RefCell<B>>,
}

impl<B: TemperatureBus> TemperatureProbe<B> {
    pub fn new(bus: Rc<RefCell<B>>, index: u8) -> Self {
        Self {
            name: format!("temperature_{index}"),
            index,
            bus,
        }
    }
}

impl<B: TemperatureBus> Element for TemperatureProbe<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::SensedOnly
    }

    fn read_value(&mut self) -> Result<f32, ElementError> {
        let mut bus = self
            .bus
            .try_borrow_mut()
            .map_err(|_| ElementError::Hardware("temperature bus busy"))?;

        let result = bus
            .request_conversion()
            .and_then(|()| bus.read_celsius(self.index));

        match result {
            Ok(celsius) => Ok(celsius),
            Err(e) => {
                warn!("{}: bus read failed ({})", self.name, e);
                Ok(DISCONNECTED_C)
            }
        }
    }

    fn write_value(&mut self, _on: bool) -> Result<(), ElementError> {
        Err(ElementError::unsupported_write())
    }

    fn render(&self) -> String {
        let header = format!("DS18B20 #{}", self.index);
        markup::card(&header, "Temperature (°C)", &self.name, "")
    }
}
