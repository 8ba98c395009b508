pub mod appliance;
pub mod battery;
pub mod ev_charger;
pub mod inverter;
pub mod types;

pub use appliance::*;
pub use battery::*;
pub use ev_charger::*;
pub use inverter::*;
pub use types::*;
