//! Core identifier and value types shared across the planner.

use std::collections::HashMap;

/// Index of an agent among the agents present in a state. The ego agent is always `0`.
pub type AgentIdx = usize;

/// Index of an action within one agent's available-action enumeration.
pub type ActionIdx = usize;

/// Identifier of a behavioural hypothesis for one opponent.
pub type HypothesisId = usize;

/// A reward, Q-value, or discounted return.
pub type Reward = f64;

/// A probability or likelihood, always in `[0, 1]`.
pub type Probability = f64;

/// One action per agent, enacted simultaneously. Position `i` is agent `i`'s action.
pub type JointAction = Vec<ActionIdx>;

/// Opponent agent index -> the hypothesis currently assumed for that opponent.
///
/// Sampled once per simulation from the [`crate::belief::BeliefTracker`] and shared by
/// reference across every stage node visited during that simulation.
pub type HypothesisAssignment = HashMap<AgentIdx, HypothesisId>;
