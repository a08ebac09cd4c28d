pub mod battles;
pub mod results;
pub mod roster;
pub mod votes;
