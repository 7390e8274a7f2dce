// Application layer - Polling, history and chart use cases
pub mod dashboard_service;
pub mod history;
pub mod metric_source;
pub mod scheduler;
