//! The belief tracker (component G): a posterior over each opponent's hypothesis, updated from
//! observed actions and sampled once per simulation.

use std::collections::HashMap;

use log::warn;

use crate::config::{Config, PosteriorType};
use crate::domain::HypothesisState;
use crate::random::RandomSource;
use crate::types::{AgentIdx, HypothesisAssignment, HypothesisId, JointAction, Probability, Reward};

/// One hypothesis's accumulated evidence for one opponent.
#[derive(Debug, Clone)]
struct HypothesisAccumulator {
    prior: Probability,
    log_likelihood_sum: Reward,
    observation_count: u32,
    /// Exponential moving average register, used only by [`PosteriorType::FixedAlpha`].
    /// Seeded from the prior so the posterior equals the prior before any observation.
    ema: Reward,
}

impl HypothesisAccumulator {
    fn new(prior: Probability) -> Self {
        Self { prior, log_likelihood_sum: 0.0, observation_count: 0, ema: prior }
    }
}

/// Per-opponent posterior over hypothesis id, persisted across planner invocations.
pub struct BeliefTracker {
    config: Config,
    per_agent: HashMap<AgentIdx, Vec<HypothesisAccumulator>>,
}

impl BeliefTracker {
    /// Initializes one accumulator vector per opponent by reading `get_num_hypothesis` and
    /// `get_prior` off `state` once.
    pub fn new<S: HypothesisState>(state: &S, opponents: &[AgentIdx], config: Config) -> Self {
        let per_agent = opponents
            .iter()
            .map(|&agent| {
                let n = state.get_num_hypothesis(agent);
                let accumulators = (0..n).map(|h| HypothesisAccumulator::new(state.get_prior(h, agent))).collect();
                (agent, accumulators)
            })
            .collect();
        Self { config, per_agent }
    }

    /// The normalized posterior over hypothesis ids for `agent`.
    pub fn posterior(&self, agent: AgentIdx) -> Vec<Probability> {
        let accumulators = &self.per_agent[&agent];
        let scores: Vec<Reward> = match self.config.belief_posterior_type {
            PosteriorType::Product => accumulators.iter().map(|a| a.log_likelihood_sum).collect(),
            PosteriorType::Sum => accumulators
                .iter()
                .map(|a| a.log_likelihood_sum / (a.observation_count.max(1) as Reward))
                .collect(),
            PosteriorType::FixedAlpha => accumulators.iter().map(|a| a.ema.max(Reward::MIN_POSITIVE).ln()).collect(),
        };
        normalize_log_posterior(accumulators, &scores)
    }

    /// Samples one hypothesis per opponent from the current posteriors.
    ///
    /// Draws from the PRNG in ascending agent-index order: `per_agent` is a `HashMap`, whose
    /// key order is randomized per instance, so iterating it directly would hand PRNG draws to
    /// different agents on different runs even under the same seed.
    pub fn sample(&self) -> HypothesisAssignment {
        let mut agents: Vec<AgentIdx> = self.per_agent.keys().copied().collect();
        agents.sort_unstable();
        agents
            .into_iter()
            .map(|agent| {
                let posterior = self.posterior(agent);
                (agent, RandomSource::handle().sample_categorical(&posterior))
            })
            .collect()
    }

    /// Folds one real-world observed joint action into every opponent's evidence.
    pub fn update<S: HypothesisState>(&mut self, state: &S, observed_joint_action: &JointAction) {
        for (&agent, accumulators) in self.per_agent.iter_mut() {
            let Some(&action) = observed_joint_action.get(agent) else { continue };
            for (hypothesis, accumulator) in accumulators.iter_mut().enumerate() {
                let likelihood = state.get_probability(hypothesis, agent, action);
                accumulator.log_likelihood_sum += likelihood.max(Reward::MIN_POSITIVE).ln();
                accumulator.observation_count += 1;
                let alpha = self.config.belief_alpha;
                accumulator.ema = (1.0 - alpha) * accumulator.ema + alpha * likelihood;
            }
        }
    }
}

/// `prior(h) * exp(score[h] - max(score))`, normalized; falls back to uniform with a warning
/// if the normalization sum is zero or non-finite.
fn normalize_log_posterior(accumulators: &[HypothesisAccumulator], scores: &[Reward]) -> Vec<Probability> {
    let max_score = scores.iter().cloned().fold(Reward::MIN, Reward::max);
    let unnormalized: Vec<Reward> = accumulators
        .iter()
        .zip(scores.iter())
        .map(|(acc, &score)| acc.prior * (score - max_score).exp())
        .collect();
    let total: Reward = unnormalized.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        warn!("belief posterior normalization collapsed to {total}; falling back to uniform");
        let n = accumulators.len().max(1);
        return vec![1.0 / n as Reward; accumulators.len()];
    }
    unnormalized.into_iter().map(|v| v / total).collect()
}
