//! Hardware adapter — bridges board peripherals to the element ports.
//!
//! [`GpioOutput`] implements the `embedded-hal` output-pin traits so a
//! [`ToggleOutput`](crate::element::ToggleOutput) can drive it;
//! [`AdcInput`] implements [`AnalogInput`] for an
//! [`AnalogSensor`](crate::element::AnalogSensor).  Both sit on top of the
//! raw calls in [`hw_init`](crate::drivers::hw_init).  On non-espidf
//! targets they keep their state in memory.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};

use crate::app::ports::AnalogInput;
use crate::error::ElementError;

// ── Digital output ────────────────────────────────────────────

/// One push-pull output line, configured as input/output so the driven
/// level can be read back.
pub struct GpioOutput {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    gpio: i32,
    #[cfg(not(target_os = "espidf"))]
    level: bool,
}

impl GpioOutput {
    /// Wrap an already-configured output.  The line starts low.
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            #[cfg(not(target_os = "espidf"))]
            level: false,
        }
    }
}

impl ErrorType for GpioOutput {
    type Error = Infallible;
}

#[cfg(target_os = "espidf")]
impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        crate::drivers::hw_init::gpio_write(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        crate::drivers::hw_init::gpio_write(self.gpio, true);
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl StatefulOutputPin for GpioOutput {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(crate::drivers::hw_init::gpio_read(self.gpio))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!crate::drivers::hw_init::gpio_read(self.gpio))
    }
}

#[cfg(not(target_os = "espidf"))]
impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level = true;
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl StatefulOutputPin for GpioOutput {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level)
    }
}

// ── Analog input ──────────────────────────────────────────────

/// One ADC1 oneshot channel.
pub struct AdcInput {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    channel: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_raw: std::rc::Rc<core::cell::Cell<u16>>,
}

impl AdcInput {
    pub fn new(channel: u32) -> Self {
        Self {
            channel,
            #[cfg(not(target_os = "espidf"))]
            sim_raw: std::rc::Rc::new(core::cell::Cell::new(0)),
        }
    }

    /// Handle for driving the simulated raw count from host code.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_handle(&self) -> std::rc::Rc<core::cell::Cell<u16>> {
        self.sim_raw.clone()
    }
}

impl AnalogInput for AdcInput {
    #[cfg(target_os = "espidf")]
    fn read_raw(&mut self) -> Result<u16, ElementError> {
        crate::drivers::hw_init::adc1_read(self.channel)
            .ok_or(ElementError::Hardware("ADC read failed"))
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&mut self) -> Result<u16, ElementError> {
        Ok(self.sim_raw.get())
    }
}
