pub mod project;
pub mod stats;
pub mod vote;
