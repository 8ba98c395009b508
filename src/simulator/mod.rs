pub mod context;
pub mod outcome;

pub use context::{ForecastBundle, SimulatorContext};
pub use outcome::{EvBatterySnapshot, OutcomeRecord};
