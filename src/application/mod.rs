pub mod aggregator;
pub mod completion;
pub mod history;
pub mod orchestrator;
pub mod providers;
