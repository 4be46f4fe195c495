//! The search driver (component F): iterative selection, expansion, heuristic evaluation and
//! backpropagation over a fixed iteration budget.

use log::{debug, trace};

use crate::config::Config;
use crate::domain::HypothesisState;
use crate::heuristic::Heuristic;
use crate::statistics::Statistic;
use crate::tree::StageNode;
use crate::types::{ActionIdx, HypothesisAssignment, Reward};

/// Runs one simulation from `node` down to a leaf (terminal, depth cutoff, or fresh expansion)
/// and backpropagates the result back up, returning the `(value, visits)` this node reports to
/// its own parent.
///
/// Hitting `max_search_depth` evaluates a heuristic leaf value without mutating `node`'s
/// persistent statistics and without creating further children, so a node below the cutoff
/// stays revisitable by simulations that terminate sooner.
fn simulate<S, H>(
    node: &mut StageNode<S>,
    config: &Config,
    heuristic: &H,
    hypotheses: &HypothesisAssignment,
    next_id: &mut u64,
) -> (Reward, u64)
where
    S: HypothesisState,
    H: Heuristic<S>,
{
    if node.state.is_terminal() {
        return (0.0, 1);
    }
    if node.depth >= config.max_search_depth as u32 {
        let values = heuristic.evaluate(&node.state, config);
        trace!("depth cutoff at node {}: heuristic value {}", node.id, values[0].0);
        return (values[0].0, 1);
    }

    let joint_action = node.choose_joint_action(hypotheses);

    let (child_value, child_visits, rewards) = if node.children.contains_key(&joint_action) {
        let child = node.children.get_mut(&joint_action).expect("just checked");
        let (value, visits) = simulate(child, config, heuristic, hypotheses, next_id);
        let rewards = child.rewards_in.clone().expect("non-root stage nodes always carry rewards_in");
        (value, visits, rewards)
    } else {
        let id = *next_id;
        *next_id += 1;
        let mut child = StageNode::child(&node.state, joint_action.clone(), config, id, node.depth + 1);
        let rewards = child.rewards_in.clone().expect("child() always sets rewards_in");
        let (value, visits) = if child.state.is_terminal() {
            (0.0, 1)
        } else {
            let values = heuristic.evaluate(&child.state, config);
            child.install_heuristic(&values, hypotheses);
            child.ego_value_and_visits()
        };
        trace!("expanded node {id} at depth {} via {:?}", child.depth, joint_action);
        node.children.insert(joint_action.clone(), child);
        (value, visits, rewards)
    };

    node.backprop(&joint_action, &rewards, child_value, child_visits, hypotheses);
    node.ego_value_and_visits()
}

/// The multi-agent MCTS planner (component F). Owns a heuristic and, between calls to
/// [`Mcts::plan`], the most recently built tree for diagnostics.
pub struct Mcts<S: HypothesisState, H: Heuristic<S>> {
    config: Config,
    heuristic: H,
    next_id: u64,
    last_root: Option<StageNode<S>>,
}

impl<S: HypothesisState, H: Heuristic<S>> Mcts<S, H> {
    pub fn new(config: Config, heuristic: H) -> Self {
        Self { config, heuristic, next_id: 0, last_root: None }
    }

    /// Builds a fresh tree rooted at `root_state` and runs `config.max_iterations` simulations
    /// against one sampled-per-call `hypotheses` assignment, returning the ego's chosen action.
    pub fn plan(&mut self, root_state: S, hypotheses: &HypothesisAssignment) -> ActionIdx {
        let id = self.next_id;
        self.next_id += 1;
        let mut root = StageNode::root(root_state, &self.config, id);

        for iteration in 0..self.config.max_iterations {
            simulate(&mut root, &self.config, &self.heuristic, hypotheses, &mut self.next_id);
            trace!("iteration {iteration} complete");
        }

        let best = root.ego.statistic.get_best_action();
        debug!("plan: {} iterations, chose action {best}", self.config.max_iterations);
        self.last_root = Some(root);
        best
    }

    /// `(action_count, action_value)` per ego action from the most recently built tree, for
    /// diagnostics and tests. `None` before the first [`Mcts::plan`] call.
    pub fn get_root_statistics(&self) -> Option<Vec<(u64, Reward)>> {
        self.last_root.as_ref().map(|root| root.ego.statistic.action_stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PosteriorType};
    use crate::domain::State;
    use crate::heuristic::RandomRolloutHeuristic;
    use crate::types::{AgentIdx, HypothesisId, JointAction, Probability};

    /// A 3-step corridor: the ego picks left (0) or right (1) each step; going right twice in a
    /// row scores 1.0 on the second step, everything else scores 0.0. No opponents.
    #[derive(Clone, Debug)]
    struct CorridorState {
        step: u32,
        last_was_right: bool,
    }

    impl State for CorridorState {
        fn execute(&self, joint_action: &JointAction) -> (Self, Vec<Reward>) {
            let went_right = joint_action[0] == 1;
            let reward = if went_right && self.last_was_right { 1.0 } else { 0.0 };
            (Self { step: self.step + 1, last_was_right: went_right }, vec![reward])
        }
        fn get_num_actions(&self, _agent: AgentIdx) -> usize {
            2
        }
        fn is_terminal(&self) -> bool {
            self.step >= 3
        }
        fn get_agent_idx(&self) -> Vec<AgentIdx> {
            vec![0]
        }
    }

    impl HypothesisState for CorridorState {
        fn plan_action_under_current_hypothesis(&self, _agent: AgentIdx, _hypotheses: &HypothesisAssignment) -> ActionIdx {
            0
        }
        fn get_probability(&self, _hypothesis: HypothesisId, _agent: AgentIdx, _action: ActionIdx) -> Probability {
            1.0
        }
        fn get_prior(&self, _hypothesis: HypothesisId, _agent: AgentIdx) -> Probability {
            1.0
        }
        fn get_num_hypothesis(&self, _agent: AgentIdx) -> usize {
            1
        }
        fn get_last_action(&self, _agent: AgentIdx) -> Option<ActionIdx> {
            None
        }
    }

    fn corridor_config(seed: u64) -> Config {
        Config::new(0.95, std::f64::consts::SQRT_2, 150, 10, 0.0, 1.0, PosteriorType::Product, 0.3, seed, 6).unwrap()
    }

    #[test]
    fn zero_iterations_returns_untried_action_zero() {
        let config = corridor_config(1);
        let mut mcts = Mcts::new(Config { max_iterations: 0, ..config }, RandomRolloutHeuristic);
        let root = CorridorState { step: 0, last_was_right: false };
        let action = mcts.plan(root, &HypothesisAssignment::new());
        assert_eq!(action, 0);
    }

    #[test]
    fn plan_is_deterministic_given_a_fixed_seed() {
        let config = corridor_config(42);
        let mut first = Mcts::new(config, RandomRolloutHeuristic);
        let mut second = Mcts::new(config, RandomRolloutHeuristic);
        let root = CorridorState { step: 0, last_was_right: false };
        let hyps = HypothesisAssignment::new();

        crate::random::RandomSource::seed(42);
        let a = first.plan(root.clone(), &hyps);
        crate::random::RandomSource::seed(42);
        let b = second.plan(root, &hyps);
        assert_eq!(a, b);
    }

    #[test]
    fn plan_prefers_the_rewarding_action() {
        let config = corridor_config(7);
        crate::random::RandomSource::seed(7);
        let mut mcts = Mcts::new(config, RandomRolloutHeuristic);
        let root = CorridorState { step: 0, last_was_right: false };
        let action = mcts.plan(root, &HypothesisAssignment::new());
        assert_eq!(action, 1, "the only rewarding path is right-then-right");
    }

    #[test]
    fn plan_logs_its_iterations() {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = corridor_config(11);
        crate::random::RandomSource::seed(11);
        let mut mcts = Mcts::new(config, RandomRolloutHeuristic);
        let root = CorridorState { step: 0, last_was_right: false };
        mcts.plan(root, &HypothesisAssignment::new());
        assert!(mcts.get_root_statistics().is_some());
    }
}
