//! The heuristic interface (component D): a leaf-value estimate without deeper search.

use crate::config::Config;
use crate::domain::HypothesisState;
use crate::random::RandomSource;
use crate::types::{JointAction, Reward};

/// Produces `(leaf_value, ego_cost_estimate)` per agent for a non-terminal leaf state, aligned
/// to `state.get_agent_idx()`. The contract is only determinism under the shared PRNG — callers
/// are free to substitute a domain-specific heuristic.
pub trait Heuristic<S: HypothesisState> {
    fn evaluate(&self, state: &S, config: &Config) -> Vec<(Reward, Reward)>;
}

/// Reference implementation: a fixed-depth uniform-random rollout, discounting each step's
/// reward by `config.discount_factor` and summing per agent. Stops early if the rollout hits a
/// terminal state. `leaf_value` and `ego_cost_estimate` coincide for this reference heuristic —
/// the distinction only matters for more sophisticated heuristics that separate "value" from
/// "cost-to-go" accounting.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRolloutHeuristic;

impl<S: HypothesisState> Heuristic<S> for RandomRolloutHeuristic {
    fn evaluate(&self, state: &S, config: &Config) -> Vec<(Reward, Reward)> {
        let agents = state.get_agent_idx();
        let mut totals = vec![0.0; agents.len()];
        let mut discount = 1.0;
        let mut cur = state.clone();

        for _ in 0..config.heuristic_rollout_depth {
            if cur.is_terminal() {
                break;
            }
            let joint: JointAction = agents
                .iter()
                .map(|&agent| {
                    let n = cur.get_num_actions(agent);
                    RandomSource::handle().gen_index(n)
                })
                .collect();
            let (next, rewards) = cur.execute(&joint);
            for (total, r) in totals.iter_mut().zip(rewards.iter()) {
                *total += discount * r;
            }
            discount *= config.discount_factor;
            cur = next;
        }

        totals.into_iter().map(|v| (v, v)).collect()
    }
}
