//! Authorization evaluator: combines standing permissions and grants
//! into a single access decision.

pub mod evaluator;
pub mod handlers;
pub mod models;
pub mod types;

pub use evaluator::evaluate_access;
pub use models::{AccessDecision, AccessSource};
