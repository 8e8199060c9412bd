//! GPIO / peripheral pin assignments for the SensorNode dev board.
//!
//! Single source of truth — `main` builds the default element set from
//! these constants and element names are derived from them, so changing a
//! pin here also changes its wire-protocol key.

// ---------------------------------------------------------------------------
// Toggle outputs (indicator LEDs)
// ---------------------------------------------------------------------------

/// First indicator LED, active HIGH.
pub const LED1_GPIO: i32 = 32;
/// Second indicator LED, active HIGH.
pub const LED2_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Analog inputs (ADC1)
// ---------------------------------------------------------------------------

/// Photoresistor voltage divider.  ADC1 channel 6 on the ESP32 (GPIO 34).
pub const PHOTO_ADC_GPIO: i32 = 34;
/// ADC1 channel backing [`PHOTO_ADC_GPIO`].
pub const PHOTO_ADC_CHANNEL: u32 = 6;
/// Full-scale raw reading at 12-bit resolution.
pub const ADC_FULL_SCALE: u16 = 4095;

// ---------------------------------------------------------------------------
// 1-Wire temperature bus (DS18B20)
// ---------------------------------------------------------------------------

/// Data line of the shared 1-Wire bus, 4.7 kΩ pull-up to 3V3.
pub const ONEWIRE_GPIO: i32 = 5;
/// Index of the first probe on the bus (enumeration order).
pub const PROBE0_INDEX: u8 = 0;
