//! Planner configuration (component H).
//!
//! A single validated record consumed by the search driver, the statistics, and the belief
//! tracker. Construction is the one place in this crate that returns a `Result` instead of
//! panicking, since configuration is external input rather than an internal invariant.

use crate::error::ConfigError;

/// Which posterior update rule the belief tracker uses to turn per-hypothesis
/// log-likelihood accumulators into a normalized distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosteriorType {
    /// `P(h) ∝ prior(h) · exp(log_likelihood_sum[h])`
    Product,
    /// `P(h) ∝ prior(h) · exp(log_likelihood_sum[h] / max(observation_count[h], 1))`
    Sum,
    /// `P(h) ∝ prior(h) · ema[h]`, an exponential moving average of per-step likelihoods.
    FixedAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub discount_factor: f64,
    pub exploration_constant: f64,
    pub max_iterations: usize,
    pub max_search_depth: usize,
    pub latest_return_lb: f64,
    pub latest_return_ub: f64,
    pub belief_posterior_type: PosteriorType,
    pub belief_alpha: f64,
    pub random_seed: u64,
    /// How many steps the reference rollout heuristic simulates before stopping.
    pub heuristic_rollout_depth: usize,
}

impl Config {
    /// Validates each option against its precondition and returns a ready-to-use `Config`, or
    /// the first violated precondition.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        discount_factor: f64,
        exploration_constant: f64,
        max_iterations: usize,
        max_search_depth: usize,
        latest_return_lb: f64,
        latest_return_ub: f64,
        belief_posterior_type: PosteriorType,
        belief_alpha: f64,
        random_seed: u64,
        heuristic_rollout_depth: usize,
    ) -> Result<Self, ConfigError> {
        if !(discount_factor > 0.0 && discount_factor <= 1.0) {
            return Err(ConfigError::DiscountFactorOutOfRange(discount_factor));
        }
        if !(exploration_constant > 0.0) {
            return Err(ConfigError::NonPositiveExplorationConstant(exploration_constant));
        }
        if max_search_depth < 1 {
            return Err(ConfigError::ZeroMaxSearchDepth(max_search_depth));
        }
        if !(latest_return_lb < latest_return_ub) {
            return Err(ConfigError::InvalidReturnRange {
                lb: latest_return_lb,
                ub: latest_return_ub,
            });
        }
        if !(belief_alpha > 0.0 && belief_alpha <= 1.0) {
            return Err(ConfigError::BeliefAlphaOutOfRange(belief_alpha));
        }
        if heuristic_rollout_depth < 1 {
            return Err(ConfigError::ZeroRolloutDepth(heuristic_rollout_depth));
        }
        Ok(Self {
            discount_factor,
            exploration_constant,
            max_iterations,
            max_search_depth,
            latest_return_lb,
            latest_return_ub,
            belief_posterior_type,
            belief_alpha,
            random_seed,
            heuristic_rollout_depth,
        })
    }

    /// A reasonable default used by tests and simple callers: `γ=0.95`, `c=√2`, 200 iterations,
    /// depth 50, return range `[-1, 1]`, product posterior, seeded from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(
            0.95,
            std::f64::consts::SQRT_2,
            200,
            50,
            -1.0,
            1.0,
            PosteriorType::Product,
            0.3,
            seed,
            10,
        )
        .expect("default configuration is always valid")
    }
}
