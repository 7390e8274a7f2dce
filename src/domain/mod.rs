// Domain layer - Pure models and policies, no I/O
pub mod chart;
pub mod readings;
pub mod series;
pub mod telemetry;
pub mod theme;
