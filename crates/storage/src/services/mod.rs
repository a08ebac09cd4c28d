//! The battle engine: one module per component, each a set of async
//! functions generic over the [`Store`](crate::repository::Store).

pub mod battles;
pub mod criteria;
pub mod eligibility;
pub mod rewards;
pub mod roster;
pub mod scoring;
pub mod votes;
