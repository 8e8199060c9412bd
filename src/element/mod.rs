//! Element model — one sensor, actuator or page fragment exposed by the node.
//!
//! Every element implements [`Element`] and declares a fixed
//! [`Capability`].  Generic callers (the sync engine, the command
//! dispatcher) filter on the capability before invoking
//! [`Element::read_value`] / [`Element::write_value`]; an element asked to
//! do something outside its capability answers with
//! [`ElementError::Unsupported`] instead of panicking.
//!
//! ```text
//!  ┌──────────────┬────────┬──────────┬─────────────────────────────┐
//!  │ Variant      │ sensed │ actuated │ value                       │
//!  ├──────────────┼────────┼──────────┼─────────────────────────────┤
//!  │ ToggleOutput │   ✓    │    ✓     │ output level × 100          │
//!  │ AnalogSensor │   ✓    │          │ inverted raw percentage     │
//!  │ TempProbe    │   ✓    │          │ °C after a fresh conversion │
//!  │ PageScaffold │        │          │ — (markup only)             │
//!  └──────────────┴────────┴──────────┴─────────────────────────────┘
//! ```

pub mod analog;
pub mod markup;
pub mod scaffold;
pub mod temperature;
pub mod toggle;

pub use analog::AnalogSensor;
pub use scaffold::PageScaffold;
pub use temperature::TemperatureProbe;
pub use toggle::ToggleOutput;

use crate::error::ElementError;

/// The fixed set of capability combinations an element can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SensedActuated,
    SensedOnly,
    ActuatedOnly,
    PresentationOnly,
}

impl Capability {
    /// Element produces a reading.
    pub fn is_sensed(self) -> bool {
        matches!(self, Self::SensedActuated | Self::SensedOnly)
    }

    /// Element accepts an actuation intent.
    pub fn is_actuated(self) -> bool {
        matches!(self, Self::SensedActuated | Self::ActuatedOnly)
    }

    /// Element contributes to the broadcast snapshot.
    pub fn is_reportable(self) -> bool {
        self.is_sensed() && self != Self::PresentationOnly
    }
}

/// Contract shared by every element kind.
pub trait Element {
    /// Stable, non-empty key used on the wire and as the DOM binding id.
    fn name(&self) -> &str;

    /// Declared capability set.  Never changes over the element's lifetime.
    fn capability(&self) -> Capability;

    /// Current reading.  Fails with `Unsupported` unless sensed.
    fn read_value(&mut self) -> Result<f32, ElementError>;

    /// Apply an actuation intent.  Fails with `Unsupported` unless actuated.
    fn write_value(&mut self, on: bool) -> Result<(), ElementError>;

    /// Self-contained markup fragment keyed by [`name`](Element::name).
    fn render(&self) -> String;
}
