pub mod capture_cycle;
pub mod capture_pipeline;
pub mod capture_session;
pub mod cycle_event;
pub mod cycle_logger;
pub mod infrastructure;
