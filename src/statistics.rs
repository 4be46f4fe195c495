//! The statistic interface (component C): selection + backprop policy for one intermediate
//! node, plus its two concrete variants.
//!
//! Both variants share the same backprop arithmetic: `action_count` is the
//! visit-weighted sum used by the UCB exploration term, while `action_value` is an incremental
//! *mean over backprop events*, not over `action_count`. The two are deliberately different
//! denominators — conflating them silently breaks the worked arithmetic the test suite pins
//! down.

use std::collections::HashMap;

use crate::config::Config;
use crate::domain::HypothesisState;
use crate::random::RandomSource;
use crate::types::{ActionIdx, AgentIdx, HypothesisAssignment, HypothesisId, Reward};

/// Capability set shared by every intermediate node's statistic.
///
/// Only `choose_next_action` needs the domain state, and it needs it for two different
/// reasons depending on the variant (reading `get_num_actions` vs. planning under a
/// hypothesis), so it is generic over the state type rather than the trait itself — that keeps
/// `collect`/`value`/`total_node_visits` unambiguous single-impl methods on each concrete type.
pub trait Statistic {
    /// Total number of times this statistic has been backpropagated into (plus one if the
    /// node counts construction as an initial visit).
    fn total_node_visits(&self) -> u64;

    /// Picks this agent's action for the current simulation.
    fn choose_next_action<S: HypothesisState>(&mut self, state: &S, hypotheses: &HypothesisAssignment) -> ActionIdx;

    /// Backpropagates one transition: `action` was taken, yielding `reward` for this agent and
    /// leading to a child whose ego-value is `child_value` after `child_visits` visits.
    fn collect(&mut self, action: ActionIdx, reward: Reward, child_value: Reward, child_visits: u64, hypotheses: &HypothesisAssignment);

    /// Installs a heuristic-derived leaf estimate in place of deeper search. Does not count as
    /// a backprop event for the per-action running means.
    fn update_from_heuristic(&mut self, value: Reward, ego_cost: Reward, hypotheses: &HypothesisAssignment);

    /// The node's own scalar value, used by a parent's backprop as `child_value`.
    fn value(&self) -> Reward;

    /// The best action by current statistics. Meaningful for the ego (used by the driver);
    /// defined but unused for opponents.
    fn get_best_action(&self) -> ActionIdx;
}

/// Per-action bookkeeping shared by both statistic variants.
#[derive(Debug, Clone)]
struct ActionRecord {
    /// n_a: sum of visited-children's `total_node_visits`. Drives the UCB exploration term.
    count: u64,
    /// Q_a: incremental mean of `(reward + discount * child_value)` over backprop events.
    value: Reward,
    /// k: number of backprop events contributing to `value` (the running-mean denominator).
    updates: u32,
}

impl ActionRecord {
    fn new() -> Self {
        Self { count: 0, value: 0.0, updates: 0 }
    }

    fn backprop(&mut self, reward: Reward, child_value: Reward, child_visits: u64, discount: Reward) {
        self.count += child_visits;
        self.updates += 1;
        let term = reward + discount * child_value;
        self.value += (term - self.value) / self.updates as Reward;
    }
}

fn argmax_untried(records: &[ActionRecord]) -> Option<ActionIdx> {
    let untried: Vec<ActionIdx> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.count == 0)
        .map(|(i, _)| i)
        .collect();
    if untried.is_empty() {
        None
    } else {
        Some(*RandomSource::handle().choose(&untried))
    }
}

fn ucb_select(records: &[ActionRecord], total_visits: u64, exploration: Reward, lb: Reward, ub: Reward) -> ActionIdx {
    if let Some(a) = argmax_untried(records) {
        return a;
    }
    let ln_n = (total_visits.max(1) as Reward).ln();
    let span = (ub - lb).max(Reward::EPSILON);
    let scores: Vec<Reward> = records
        .iter()
        .map(|r| {
            let normalized = ((r.value - lb) / span).clamp(0.0, 1.0);
            normalized + exploration * (ln_n / r.count.max(1) as Reward).sqrt()
        })
        .collect();
    let best = scores.iter().cloned().fold(Reward::MIN, Reward::max);
    let tied: Vec<ActionIdx> = scores
        .iter()
        .enumerate()
        .filter(|(_, &s)| s == best)
        .map(|(i, _)| i)
        .collect();
    *RandomSource::handle().choose(&tied)
}

/// UCB1 statistic for the ego agent.
#[derive(Debug, Clone)]
pub struct UcbStatistic {
    total_node_visits: u64,
    actions: Vec<ActionRecord>,
    value: Reward,
    discount: Reward,
    exploration: Reward,
    return_lb: Reward,
    return_ub: Reward,
}

impl UcbStatistic {
    pub fn new(num_actions: usize, config: &Config) -> Self {
        assert!(num_actions > 0, "an intermediate node needs at least one action");
        Self {
            total_node_visits: 0,
            actions: vec![ActionRecord::new(); num_actions],
            value: config.latest_return_lb,
            discount: config.discount_factor,
            exploration: config.exploration_constant,
            return_lb: config.latest_return_lb,
            return_ub: config.latest_return_ub,
        }
    }

    /// Read-only access to `(action_count, action_value)` per action, for diagnostics/tests.
    pub fn action_stats(&self) -> Vec<(u64, Reward)> {
        self.actions.iter().map(|r| (r.count, r.value)).collect()
    }
}

impl Statistic for UcbStatistic {
    fn total_node_visits(&self) -> u64 {
        self.total_node_visits
    }

    fn choose_next_action<S: HypothesisState>(&mut self, _state: &S, _hypotheses: &HypothesisAssignment) -> ActionIdx {
        ucb_select(&self.actions, self.total_node_visits, self.exploration, self.return_lb, self.return_ub)
    }

    fn collect(&mut self, action: ActionIdx, reward: Reward, child_value: Reward, child_visits: u64, _hypotheses: &HypothesisAssignment) {
        self.total_node_visits += 1;
        self.actions[action].backprop(reward, child_value, child_visits, self.discount);
        self.value = self.actions.iter().map(|r| r.value).fold(Reward::MIN, Reward::max);
    }

    fn update_from_heuristic(&mut self, value: Reward, ego_cost: Reward, _hypotheses: &HypothesisAssignment) {
        for record in &mut self.actions {
            record.value = ego_cost;
        }
        self.value = value;
        self.total_node_visits = 1;
    }

    fn value(&self) -> Reward {
        self.value
    }

    fn get_best_action(&self) -> ActionIdx {
        let mut best = 0;
        for i in 1..self.actions.len() {
            if self.actions[i].value > self.actions[best].value {
                best = i;
            }
        }
        best
    }
}

/// One hypothesis's row of per-action bookkeeping plus its own visit count.
#[derive(Debug, Clone)]
struct HypothesisRow {
    actions: Vec<ActionRecord>,
    visits: u64,
}

impl HypothesisRow {
    fn new(num_actions: usize) -> Self {
        Self { actions: vec![ActionRecord::new(); num_actions], visits: 0 }
    }
}

/// Hypothesis-conditioned statistic for an opponent agent. Only the row of the hypothesis
/// currently assigned to this agent is touched by any given `collect`/`choose_next_action`.
#[derive(Debug, Clone)]
pub struct HypothesisStatistic {
    agent_idx: AgentIdx,
    num_actions: usize,
    total_node_visits: u64,
    rows: HashMap<HypothesisId, HypothesisRow>,
    discount: Reward,
}

impl HypothesisStatistic {
    pub fn new(agent_idx: AgentIdx, num_actions: usize, config: &Config) -> Self {
        assert!(num_actions > 0, "an intermediate node needs at least one action");
        Self {
            agent_idx,
            num_actions,
            total_node_visits: 0,
            rows: HashMap::new(),
            discount: config.discount_factor,
        }
    }

    fn current_hypothesis(&self, hypotheses: &HypothesisAssignment) -> HypothesisId {
        *hypotheses
            .get(&self.agent_idx)
            .unwrap_or_else(|| panic!("no hypothesis assigned to opponent agent {}", self.agent_idx))
    }

    fn row_mut(&mut self, hypothesis: HypothesisId) -> &mut HypothesisRow {
        self.rows.entry(hypothesis).or_insert_with(|| HypothesisRow::new(self.num_actions))
    }

    /// Read-only access to a hypothesis row's `(action_count, action_value)`, for diagnostics
    /// and tests. Returns `None` if that hypothesis has never been current.
    pub fn row_stats(&self, hypothesis: HypothesisId) -> Option<Vec<(u64, Reward)>> {
        self.rows.get(&hypothesis).map(|row| row.actions.iter().map(|r| (r.count, r.value)).collect())
    }
}

impl Statistic for HypothesisStatistic {
    fn total_node_visits(&self) -> u64 {
        self.total_node_visits
    }

    fn choose_next_action<S: HypothesisState>(&mut self, state: &S, hypotheses: &HypothesisAssignment) -> ActionIdx {
        state.plan_action_under_current_hypothesis(self.agent_idx, hypotheses)
    }

    fn collect(&mut self, action: ActionIdx, reward: Reward, child_value: Reward, child_visits: u64, hypotheses: &HypothesisAssignment) {
        self.total_node_visits += 1;
        let hypothesis = self.current_hypothesis(hypotheses);
        let discount = self.discount;
        let row = self.row_mut(hypothesis);
        row.visits += 1;
        row.actions[action].backprop(reward, child_value, child_visits, discount);
    }

    fn update_from_heuristic(&mut self, _value: Reward, ego_cost: Reward, hypotheses: &HypothesisAssignment) {
        self.total_node_visits = 1;
        let hypothesis = self.current_hypothesis(hypotheses);
        let row = self.row_mut(hypothesis);
        row.visits = 1;
        for record in &mut row.actions {
            record.value = ego_cost;
        }
    }

    fn value(&self) -> Reward {
        // Opponents do not define an independent value; this is never read by the driver.
        0.0
    }

    fn get_best_action(&self) -> ActionIdx {
        // Unused by the search driver; provided for completeness and diagnostics only. Falls
        // back to action 0 if no hypothesis has ever been current (nothing to rank).
        let mut hypotheses: Vec<&HypothesisId> = self.rows.keys().collect();
        hypotheses.sort_unstable();
        let Some(&&best_hypothesis) = hypotheses.iter().max_by_key(|&&h| self.rows[&h].visits) else {
            return 0;
        };
        let row = &self.rows[&best_hypothesis];
        let mut best = 0;
        for i in 1..row.actions.len() {
            if row.actions[i].value > row.actions[best].value {
                best = i;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PosteriorType};

    fn test_config() -> Config {
        Config::new(0.8, 1.0, 100, 10, 0.0, 40.0, PosteriorType::Product, 0.3, 1, 4).unwrap()
    }

    #[test]
    fn s1_single_update_ego_arithmetic() {
        let cfg = test_config();
        let mut stat = UcbStatistic::new(6, &cfg);
        let hyps = HypothesisAssignment::new();
        stat.collect(5, 2.3, 20.0, 1, &hyps);
        let (n, v) = stat.action_stats()[5];
        assert_eq!(n, 1);
        assert!((v - 18.3).abs() < 1e-9, "got {v}");
        assert_eq!(Statistic::total_node_visits(&stat), 1);
    }

    #[test]
    fn s2_two_updates_same_action() {
        let cfg = test_config();
        let mut stat = UcbStatistic::new(6, &cfg);
        let hyps = HypothesisAssignment::new();
        stat.collect(5, 2.3, 20.0, 1, &hyps);
        stat.collect(5, 4.3, 24.5, 1, &hyps);
        let (n, v) = stat.action_stats()[5];
        assert_eq!(n, 2);
        assert!((v - 21.1).abs() < 1e-9, "got {v}");
    }

    #[test]
    fn s6_ucb_prefers_untried() {
        let cfg = test_config();
        let mut stat = UcbStatistic::new(2, &cfg);
        let hyps = HypothesisAssignment::new();
        stat.collect(0, 39.0, 0.0, 1, &hyps);
        RandomSource::seed(99);
        let action = stat.choose_next_action(&DummyState, &hyps);
        assert_eq!(action, 1);
    }

    #[test]
    fn s3_hypothesis_switch_isolates_rows() {
        let cfg = test_config();
        let mut stat = HypothesisStatistic::new(1, 3, &cfg);
        let mut hyps = HypothesisAssignment::new();
        hyps.insert(1, 0);
        hyps.insert(2, 1);
        stat.collect(2, 1.0, 0.0, 1, &hyps);

        hyps.insert(1, 1);
        stat.collect(2, 1.0, 0.0, 1, &hyps);

        let row0 = stat.row_stats(0).unwrap();
        let row1 = stat.row_stats(1).unwrap();
        assert_eq!(row0[2].0, 1);
        assert_eq!(row1[2].0, 1);
    }

    #[derive(Clone, Debug)]
    struct DummyState;

    impl crate::domain::State for DummyState {
        fn execute(&self, _joint_action: &crate::types::JointAction) -> (Self, Vec<Reward>) {
            (DummyState, vec![0.0])
        }
        fn get_num_actions(&self, _agent: AgentIdx) -> usize {
            2
        }
        fn is_terminal(&self) -> bool {
            false
        }
        fn get_agent_idx(&self) -> Vec<AgentIdx> {
            vec![0]
        }
    }

    impl HypothesisState for DummyState {
        fn plan_action_under_current_hypothesis(&self, _agent: AgentIdx, _hypotheses: &HypothesisAssignment) -> ActionIdx {
            0
        }
        fn get_probability(&self, _hypothesis: HypothesisId, _agent: AgentIdx, _action: ActionIdx) -> Reward {
            0.5
        }
        fn get_prior(&self, _hypothesis: HypothesisId, _agent: AgentIdx) -> Reward {
            0.5
        }
        fn get_num_hypothesis(&self, _agent: AgentIdx) -> usize {
            2
        }
        fn get_last_action(&self, _agent: AgentIdx) -> Option<ActionIdx> {
            None
        }
    }
}
