pub mod batch;
pub mod garde;
pub mod queue;
pub mod telemetry;
