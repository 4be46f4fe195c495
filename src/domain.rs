//! The domain interface (component A): the abstract contract a concrete environment must
//! satisfy for the planner to search over it.
//!
//! Concrete environments (a crossing/intersection toy world, or anything else) are deliberately
//! out of scope for this crate — they are external collaborators implementing these traits.

use crate::types::{ActionIdx, AgentIdx, HypothesisAssignment, HypothesisId, JointAction, Probability, Reward};

/// A state in a sequential, discrete, simultaneous-move decision process.
///
/// Implementations must be deterministic given the same `(state, joint_action)`; any
/// stochasticity in a transition must be folded in using [`crate::random::RandomSource`] so
/// that a full planning pass remains reproducible under a fixed seed. `execute` must not
/// mutate `self` — it returns a fresh, independent state.
pub trait State: Clone + std::fmt::Debug {
    /// Applies one action per agent simultaneously, returning the resulting state and one
    /// reward per agent, aligned by agent index.
    fn execute(&self, joint_action: &JointAction) -> (Self, Vec<Reward>)
    where
        Self: Sized;

    /// Number of actions available to `agent` in this state.
    fn get_num_actions(&self, agent: AgentIdx) -> usize;

    /// Whether this state ends the decision process.
    fn is_terminal(&self) -> bool;

    /// The agents present in this state, in the order their joint-action slots are assigned.
    /// The ego agent must always be at position `0`.
    fn get_agent_idx(&self) -> Vec<AgentIdx>;
}

/// Extends [`State`] with what's needed to plan against opponents whose behaviour is modeled
/// by a small set of hypotheses the ego maintains beliefs over.
pub trait HypothesisState: State {
    /// Samples (or otherwise decides) the action `agent` takes under the hypothesis currently
    /// assigned to it in `hypotheses`. This is how an opponent intermediate node selects its
    /// action during search — it does not run UCB.
    fn plan_action_under_current_hypothesis(
        &self,
        agent: AgentIdx,
        hypotheses: &HypothesisAssignment,
    ) -> ActionIdx;

    /// Likelihood of `agent` taking `action` under `hypothesis`, in this state.
    fn get_probability(&self, hypothesis: HypothesisId, agent: AgentIdx, action: ActionIdx) -> Probability;

    /// Prior probability mass on `hypothesis` for `agent`, before any observations.
    fn get_prior(&self, hypothesis: HypothesisId, agent: AgentIdx) -> Probability;

    /// Number of hypotheses tracked for `agent`.
    fn get_num_hypothesis(&self, agent: AgentIdx) -> usize;

    /// The most recent action observed for `agent`, if any (used by callers reporting a real
    /// step to [`crate::belief::BeliefTracker::update`]).
    fn get_last_action(&self, agent: AgentIdx) -> Option<ActionIdx>;
}
