#![no_std]

// Scanning and strike-detection engine shared by the firmware and the host emulator.
//
// Nothing in here touches hardware directly. Sampling devices, multiplexer
// select lines and event consumers are reached through the traits in
// `sampler` and `telemetry`, so the same scan loop runs on the MCU and in tests.

pub mod addressing;
pub mod channels;
pub mod clock;
pub mod config;
pub mod keymap;
pub mod peaks;
pub mod repl;
pub mod sampler;
pub mod scan;
pub mod telemetry;
pub mod trigger;
