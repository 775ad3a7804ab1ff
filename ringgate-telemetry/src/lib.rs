//! Telemetry setup shared by ringgate binaries and tests.

pub mod tracing;
