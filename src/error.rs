use crate::maximum_flow::Status;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfluentFlowError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfluentFlowError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// The maximum flow collaborator did not reach an optimal flow.
    #[error("maximum flow solver finished with status {0:?}")]
    MaximumFlow(Status),

    /// The reduction reached a state its operators cannot make progress from.
    /// Either the support graph was malformed or there is a defect in the engine.
    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] InvariantViolation),
}

impl ConfluentFlowError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ConfluentFlowError::InvalidInput(_))
    }

    pub fn is_internal(&self) -> bool {
        !self.is_invalid_input()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("node {node} is out of range for a graph with {num_nodes} nodes")]
    NodeOutOfRange { node: usize, num_nodes: usize },

    #[error("node {node} has a negative demand")]
    NegativeDemand { node: usize },

    #[error("arc {from} -> {to} has a negative capacity")]
    NegativeCapacity { from: usize, to: usize },

    #[error("arc {node} -> {node} is a self-loop")]
    SelfLoop { node: usize },

    #[error("total demand overflows the flow type")]
    DemandOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("no operator applies with {free_nodes} free nodes left")]
    Stalled { free_nodes: usize },

    #[error("flow is not conserved at node {node}")]
    Conservation { node: usize },

    #[error("flow leaving sink {sink} cannot be withdrawn at node {node}")]
    SinkOutflow { sink: usize, node: usize },
}
