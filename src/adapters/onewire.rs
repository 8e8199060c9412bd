//! DS18B20 temperature bus on top of a byte-level 1-Wire master.
//!
//! [`Ds18b20Bus`] implements [`TemperatureBus`] for any [`OneWire`] port.
//! Devices are enumerated lazily (family code `0x28` only) and indexed in
//! search order; an empty bus is searched again on the next conversion so
//! a probe plugged in after boot is picked up.
//!
//! ```text
//!   request_conversion:  RESET · SKIP ROM (CC) · CONVERT T (44) · wait 750 ms
//!   read_celsius(i):     RESET · MATCH ROM (55) rom[i] · READ SCRATCHPAD (BE)
//!                        · 9 bytes · CRC-8 · temp = i16(b1:b0) / 16
//! ```
//!
//! On target, [`EspOneWire`] drives the bus through the RMT-based
//! `esp_idf_hal::onewire` driver.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::ports::{OneWire, TemperatureBus};
use crate::error::BusError;

pub const FAMILY_DS18B20: u8 = 0x28;

const CMD_SKIP_ROM: u8 = 0xCC;
const CMD_MATCH_ROM: u8 = 0x55;
const CMD_CONVERT_T: u8 = 0x44;
const CMD_READ_SCRATCHPAD: u8 = 0xBE;

/// Worst-case 12-bit conversion time.
pub const CONVERSION_TIME_MS: u32 = 750;

const SCRATCHPAD_LEN: usize = 9;

/// Dallas/Maxim CRC-8 (polynomial x⁸ + x⁵ + x⁴ + 1, reflected).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

/// Temperature in °C from a CRC-checked scratchpad.
pub fn decode_scratchpad(pad: &[u8; SCRATCHPAD_LEN]) -> Result<f32, BusError> {
    if crc8(&pad[..8]) != pad[8] {
        return Err(BusError::CrcMismatch);
    }
    let raw = i16::from_le_bytes([pad[0], pad[1]]);
    Ok(f32::from(raw) / 16.0)
}

pub struct Ds18b20Bus<W, D> {
    wire: W,
    delay: D,
    devices: heapless::Vec<u64, 8>,
}

impl<W: OneWire, D: DelayNs> Ds18b20Bus<W, D> {
    pub fn new(wire: W, delay: D) -> Self {
        Self {
            wire,
            delay,
            devices: heapless::Vec::new(),
        }
    }

    /// ROM codes of the enumerated probes, in index order.
    pub fn devices(&self) -> &[u64] {
        &self.devices
    }

    fn enumerate(&mut self) -> Result<(), BusError> {
        self.devices = self
            .wire
            .search()?
            .into_iter()
            .filter(|rom| (*rom & 0xFF) as u8 == FAMILY_DS18B20)
            .collect();
        info!("DS18B20: {} probe(s) on bus", self.devices.len());
        Ok(())
    }

    fn reset(&mut self) -> Result<(), BusError> {
        if self.wire.reset()? {
            Ok(())
        } else {
            Err(BusError::NoPresence)
        }
    }
}

impl<W: OneWire, D: DelayNs> TemperatureBus for Ds18b20Bus<W, D> {
    fn request_conversion(&mut self) -> Result<(), BusError> {
        if self.devices.is_empty() {
            self.enumerate()?;
        }
        self.reset()?;
        self.wire.write_bytes(&[CMD_SKIP_ROM, CMD_CONVERT_T])?;
        self.delay.delay_ms(CONVERSION_TIME_MS);
        Ok(())
    }

    fn read_celsius(&mut self, index: u8) -> Result<f32, BusError> {
        let rom = *self
            .devices
            .get(usize::from(index))
            .ok_or(BusError::NoDevice(index))?;

        self.reset()?;
        let mut cmd = [0u8; 10];
        cmd[0] = CMD_MATCH_ROM;
        cmd[1..9].copy_from_slice(&rom.to_le_bytes());
        cmd[9] = CMD_READ_SCRATCHPAD;
        self.wire.write_bytes(&cmd)?;

        let mut pad = [0u8; SCRATCHPAD_LEN];
        self.wire.read_bytes(&mut pad)?;
        decode_scratchpad(&pad).inspect_err(|e| {
            warn!("DS18B20: probe {} ({:016x}) {}", index, rom, e);
        })
    }
}

// ── ESP-IDF 1-Wire master ─────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct EspOneWire {
    driver: esp_idf_hal::onewire::OWDriver<'static>,
}

#[cfg(target_os = "espidf")]
impl EspOneWire {
    pub fn new(driver: esp_idf_hal::onewire::OWDriver<'static>) -> Self {
        Self { driver }
    }
}

#[cfg(target_os = "espidf")]
impl OneWire for EspOneWire {
    fn reset(&mut self) -> Result<bool, BusError> {
        match self.driver.reset() {
            Ok(()) => Ok(true),
            Err(e) if e.code() == esp_idf_svc::sys::ESP_ERR_NOT_FOUND as i32 => Ok(false),
            Err(_) => Err(BusError::Io),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), BusError> {
        self.driver.write(data).map_err(|_| BusError::Io)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        self.driver.read(buf).map_err(|_| BusError::Io)
    }

    fn search(&mut self) -> Result<heapless::Vec<u64, 8>, BusError> {
        let mut found = heapless::Vec::new();
        let search = self.driver.search().map_err(|_| BusError::Io)?;
        for device in search {
            let address = device.map_err(|_| BusError::Io)?.address();
            if found.push(address).is_err() {
                warn!("1-Wire: more than 8 devices, ignoring {:016x}", address);
                break;
            }
        }
        Ok(found)
    }
}
