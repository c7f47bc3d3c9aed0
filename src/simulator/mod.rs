//! The simulated order-execution engine.

mod driver;
mod engine;

pub use driver::SimulationOrderExecutionDriver;
pub use engine::{BOARD_LOT, SecurityOrderSimulator};
