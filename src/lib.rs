pub mod confluent_flow;
pub mod error;
pub mod maximum_flow;

pub use crate::confluent_flow::arborescence::{Arborescence, ConfluentFlow};
pub use crate::confluent_flow::demand_graph::DemandGraph;
pub use crate::confluent_flow::{confluent_flow, ConfluentFlowConfig, ConfluentFlowSolver};
pub use crate::error::{ConfluentFlowError, Result};
