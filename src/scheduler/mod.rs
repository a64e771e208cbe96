mod runner;
mod trigger;

pub use runner::Runner;
pub use trigger::TriggerEngine;
