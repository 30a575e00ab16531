//! The rebalancing engine: allocation capping, the portfolio ledger, the
//! rebalance state machine, and the day-by-day simulation loop.

pub mod allocation;
pub mod ledger;
pub mod rebalance;
pub mod simulation;

pub use allocation::cap_allocation;
pub use ledger::PortfolioLedger;
pub use rebalance::{RebalanceEngine, RebalanceOutcome};
pub use simulation::{run_index_simulation, Simulation, SimulationResult};
