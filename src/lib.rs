// Live telemetry backend for an ASIC miner dashboard
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
