//! Typed errors for the one recoverable boundary in this crate: configuration construction.
//!
//! Everything past construction is either a pure function of `(state, joint_action, rng)` or a
//! programmer error (duplicate child key, wrong reward arity, ...), and those are reported with
//! `assert!`/`panic!` rather than a `Result`, per the error-handling design: a single planning
//! call has no recoverable runtime errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("discount_factor must be in (0, 1], got {0}")]
    DiscountFactorOutOfRange(f64),

    #[error("exploration_constant must be > 0, got {0}")]
    NonPositiveExplorationConstant(f64),

    #[error("max_search_depth must be >= 1, got {0}")]
    ZeroMaxSearchDepth(usize),

    #[error("latest_return_lb ({lb}) must be < latest_return_ub ({ub})")]
    InvalidReturnRange { lb: f64, ub: f64 },

    #[error("belief_alpha must be in (0, 1], got {0}")]
    BeliefAlphaOutOfRange(f64),

    #[error("heuristic_rollout_depth must be >= 1, got {0}")]
    ZeroRolloutDepth(usize),
}
