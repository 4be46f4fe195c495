//! Multi-agent Monte-Carlo tree search with opponent-hypothesis belief tracking.
//!
//! A caller implements [`domain::State`] (and, to model opponents, [`domain::HypothesisState`])
//! for their own decision process, then drives [`search::Mcts`] to pick the ego agent's next
//! action and [`belief::BeliefTracker`] to keep that agent's posterior over opponent hypotheses
//! up to date between calls.

pub mod belief;
pub mod config;
pub mod domain;
pub mod error;
pub mod heuristic;
pub mod random;
pub mod search;
pub mod statistics;
pub mod tree;
pub mod types;

pub use belief::BeliefTracker;
pub use config::{Config, PosteriorType};
pub use domain::{HypothesisState, State};
pub use error::ConfigError;
pub use heuristic::{Heuristic, RandomRolloutHeuristic};
pub use random::RandomSource;
pub use search::Mcts;
pub use statistics::{HypothesisStatistic, Statistic, UcbStatistic};
pub use types::{ActionIdx, AgentIdx, HypothesisAssignment, HypothesisId, JointAction, Probability, Reward};
