//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements            | Connects to                  |
//! |------------|-----------------------|------------------------------|
//! | `hardware` | OutputPin, AnalogInput| ESP32 GPIO, ADC1             |
//! | `onewire`  | TemperatureBus        | DS18B20 over RMT 1-Wire      |
//! |            | OneWire               |                              |
//! | `http`     | SessionSink           | ESP-IDF httpd + WebSocket    |
//! | `log_sink` | EventSink             | Serial log output            |
//! | `nvs`      | ConfigPort            | NVS / in-memory store        |
//! |            | StoragePort           |                              |
//! | `time`     | —                     | ESP32 system timer           |
//! | `wifi`     | ConnectivityPort      | ESP-IDF WiFi STA             |

pub mod hardware;
pub mod http;
pub mod log_sink;
pub mod nvs;
pub mod onewire;
pub mod time;
pub mod wifi;
