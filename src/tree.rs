//! The search tree (component E): stage nodes factored into one intermediate node per agent,
//! with children keyed by the joint action that reached them.

use std::collections::HashMap;

use crate::config::Config;
use crate::domain::HypothesisState;
use crate::statistics::{HypothesisStatistic, Statistic, UcbStatistic};
use crate::types::{ActionIdx, AgentIdx, JointAction, Reward};

/// A per-agent statistics container inside a stage node.
#[derive(Debug, Clone)]
pub struct IntermediateNode<St> {
    agent_idx: AgentIdx,
    num_actions: usize,
    pub statistic: St,
}

impl<St> IntermediateNode<St> {
    pub fn agent_idx(&self) -> AgentIdx {
        self.agent_idx
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }
}

pub type EgoNode = IntermediateNode<UcbStatistic>;
pub type OpponentNode = IntermediateNode<HypothesisStatistic>;

fn ego_node<S: HypothesisState>(state: &S, config: &Config) -> EgoNode {
    let agent_idx = 0;
    let num_actions = state.get_num_actions(agent_idx);
    IntermediateNode { agent_idx, num_actions, statistic: UcbStatistic::new(num_actions, config) }
}

fn opponent_nodes<S: HypothesisState>(state: &S, config: &Config) -> Vec<OpponentNode> {
    state
        .get_agent_idx()
        .into_iter()
        .skip(1)
        .map(|agent_idx| {
            let num_actions = state.get_num_actions(agent_idx);
            IntermediateNode { agent_idx, num_actions, statistic: HypothesisStatistic::new(agent_idx, num_actions, config) }
        })
        .collect()
}

/// A decision stage at one tree depth, owning its own state, per-agent intermediate nodes, and
/// its (exclusively owned) children keyed by joint action.
#[derive(Debug)]
pub struct StageNode<S> {
    pub id: u64,
    pub depth: u32,
    pub is_root: bool,
    pub state: S,
    /// The joint action that led here, and the rewards observed on that transition. `None` at
    /// the root.
    pub joint_action_in: Option<JointAction>,
    pub rewards_in: Option<Vec<Reward>>,
    pub ego: EgoNode,
    pub opponents: Vec<OpponentNode>,
    pub children: HashMap<JointAction, StageNode<S>>,
}

impl<S: HypothesisState> StageNode<S> {
    /// Builds the root stage node of a fresh search tree.
    pub fn root(state: S, config: &Config, id: u64) -> Self {
        let ego = ego_node(&state, config);
        let opponents = opponent_nodes(&state, config);
        Self {
            id,
            depth: 0,
            is_root: true,
            state,
            joint_action_in: None,
            rewards_in: None,
            ego,
            opponents,
            children: HashMap::new(),
        }
    }

    /// Builds a child stage node by executing `joint_action` against `parent_state`. Returns
    /// the child; callers are responsible for inserting it into `children`.
    pub fn child(parent_state: &S, joint_action: JointAction, config: &Config, id: u64, depth: u32) -> Self {
        let (state, rewards) = parent_state.execute(&joint_action);
        debug_assert_eq!(
            rewards.len(),
            joint_action.len(),
            "execute must return one reward per agent in the joint action"
        );
        let ego = ego_node(&state, config);
        let opponents = opponent_nodes(&state, config);
        Self {
            id,
            depth,
            is_root: false,
            state,
            joint_action_in: Some(joint_action),
            rewards_in: Some(rewards),
            ego,
            opponents,
            children: HashMap::new(),
        }
    }

    /// Assembles this stage's joint action by asking every intermediate node's statistic to
    /// choose, in agent-index order (ego first).
    pub fn choose_joint_action(&mut self, hypotheses: &crate::types::HypothesisAssignment) -> JointAction {
        let mut joint = Vec::with_capacity(1 + self.opponents.len());
        joint.push(self.ego.statistic.choose_next_action(&self.state, hypotheses));
        for opponent in &mut self.opponents {
            joint.push(opponent.statistic.choose_next_action(&self.state, hypotheses));
        }
        joint
    }

    /// Installs a heuristic-derived leaf estimate on every intermediate node, aligned to
    /// `state.get_agent_idx()` (ego at position 0).
    pub fn install_heuristic(&mut self, values: &[(Reward, Reward)], hypotheses: &crate::types::HypothesisAssignment) {
        let (ego_value, ego_cost) = values[0];
        self.ego.statistic.update_from_heuristic(ego_value, ego_cost, hypotheses);
        for (node, &(value, cost)) in self.opponents.iter_mut().zip(values[1..].iter()) {
            node.statistic.update_from_heuristic(value, cost, hypotheses);
        }
    }

    /// Backpropagates one transition's rewards into every intermediate node at this stage.
    pub fn backprop(&mut self, joint_action: &[ActionIdx], rewards: &[Reward], child_value: Reward, child_visits: u64, hypotheses: &crate::types::HypothesisAssignment) {
        self.ego.statistic.collect(joint_action[0], rewards[0], child_value, child_visits, hypotheses);
        for (i, opponent) in self.opponents.iter_mut().enumerate() {
            opponent.statistic.collect(joint_action[i + 1], rewards[i + 1], child_value, child_visits, hypotheses);
        }
    }

    /// The `(value, total_node_visits)` a parent should use when backpropagating the
    /// transition that led into this node.
    pub fn ego_value_and_visits(&self) -> (Reward, u64) {
        (self.ego.statistic.value(), self.ego.statistic.total_node_visits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PosteriorType};
    use crate::domain::State;
    use crate::types::{HypothesisAssignment, HypothesisId, JointAction, Probability};

    /// Ego (agent 0) and one opponent (agent 1) each pick between two actions. The opponent's
    /// hypothesis 0 always plays action 4 (out of range on purpose to make s4 unambiguous to
    /// assert on); hypothesis 1 always plays action 0.
    #[derive(Clone, Debug)]
    struct TwoAgentState;

    impl State for TwoAgentState {
        fn execute(&self, joint_action: &JointAction) -> (Self, Vec<Reward>) {
            (TwoAgentState, vec![0.0; joint_action.len()])
        }
        fn get_num_actions(&self, agent: AgentIdx) -> usize {
            if agent == 0 {
                2
            } else {
                5
            }
        }
        fn is_terminal(&self) -> bool {
            false
        }
        fn get_agent_idx(&self) -> Vec<AgentIdx> {
            vec![0, 1]
        }
    }

    impl HypothesisState for TwoAgentState {
        fn plan_action_under_current_hypothesis(&self, agent: AgentIdx, hypotheses: &HypothesisAssignment) -> ActionIdx {
            assert_eq!(agent, 1, "only agent 1 is an opponent in this fixture");
            match hypotheses[&agent] {
                0 => 4,
                1 => 0,
                h => panic!("unexpected hypothesis {h}"),
            }
        }
        fn get_probability(&self, _hypothesis: HypothesisId, _agent: AgentIdx, _action: ActionIdx) -> Probability {
            0.5
        }
        fn get_prior(&self, _hypothesis: HypothesisId, _agent: AgentIdx) -> Probability {
            0.5
        }
        fn get_num_hypothesis(&self, _agent: AgentIdx) -> usize {
            2
        }
        fn get_last_action(&self, _agent: AgentIdx) -> Option<ActionIdx> {
            None
        }
    }

    fn test_config() -> Config {
        Config::new(0.9, 1.0, 50, 10, 0.0, 1.0, PosteriorType::Product, 0.3, 3, 4).unwrap()
    }

    #[test]
    fn s4_opponent_joint_action_uses_hypothesis_plan() {
        let config = test_config();
        let mut root = StageNode::root(TwoAgentState, &config, 0);
        let mut hyps = HypothesisAssignment::new();
        hyps.insert(1, 0);
        let joint = root.choose_joint_action(&hyps);
        assert_eq!(joint[1], 4);

        hyps.insert(1, 1);
        let joint = root.choose_joint_action(&hyps);
        assert_eq!(joint[1], 0);
    }

    #[test]
    fn backprop_reaches_every_intermediate_node() {
        let config = test_config();
        let mut root = StageNode::root(TwoAgentState, &config, 0);
        let mut hyps = HypothesisAssignment::new();
        hyps.insert(1, 0);
        root.backprop(&[0, 4], &[1.0, 1.0], 0.5, 1, &hyps);
        assert_eq!(root.ego.statistic.total_node_visits(), 1);
        assert_eq!(root.opponents[0].statistic.total_node_visits(), 1);
    }
}
