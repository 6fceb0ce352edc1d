pub mod command_source;
pub mod progress_observer;
pub mod sci_bus;
