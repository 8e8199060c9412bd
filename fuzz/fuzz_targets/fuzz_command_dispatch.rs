//! Fuzz target: `CommandDispatcher::dispatch`
//!
//! The first byte picks the frame kind and FIN bit; the rest is the
//! payload.  The dispatcher must never panic, a rejected frame must leave
//! every reading unchanged, and an accepted one may only drive outputs.
//!
//! cargo fuzz run fuzz_command_dispatch

#![no_main]

use libfuzzer_sys::fuzz_target;
use sensornode::adapters::hardware::{AdcInput, GpioOutput};
use sensornode::dispatch::{CommandDispatcher, FrameKind, InboundFrame};
use sensornode::element::{AnalogSensor, PageScaffold, ToggleOutput};
use sensornode::registry::Registry;
use sensornode::sync::SyncEngine;

const KINDS: [FrameKind; 6] = [
    FrameKind::Text,
    FrameKind::Binary,
    FrameKind::Continuation,
    FrameKind::Ping,
    FrameKind::Pong,
    FrameKind::Close,
];

fn board() -> Registry {
    let mut reg = Registry::new();
    let _ = reg.register(Box::new(PageScaffold::new("fuzz")));
    let _ = reg.register(Box::new(ToggleOutput::new(32, GpioOutput::new(32))));
    let _ = reg.register(Box::new(ToggleOutput::new(33, GpioOutput::new(33))));
    let adc = AdcInput::new(6);
    adc.sim_handle().set(1234);
    let _ = reg.register(Box::new(AnalogSensor::new(34, 4095, adc)));
    reg
}

fuzz_target!(|data: &[u8]| {
    let Some((&head, payload)) = data.split_first() else {
        return;
    };
    let kind = KINDS[usize::from(head & 0x07) % KINDS.len()];
    let fin = head & 0x80 == 0;

    let Ok(frame) = InboundFrame::from_parts(kind, fin, payload) else {
        return;
    };

    let mut reg = board();
    let engine = SyncEngine::new();
    let before = engine.collect(&mut reg);

    let mut dispatcher = CommandDispatcher::new();
    let after = match dispatcher.dispatch(&frame, &mut reg) {
        Ok(outcome) => {
            assert!(outcome.applied.iter().all(|(name, _)| name.starts_with("led_")));
            engine.collect(&mut reg)
        }
        Err(_) => {
            let after = engine.collect(&mut reg);
            assert_eq!(after, before, "rejected frame changed state");
            after
        }
    };

    assert_eq!(after.get("photoresistor_34"), before.get("photoresistor_34"));
});
