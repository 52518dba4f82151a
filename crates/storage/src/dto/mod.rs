pub mod admin;
pub mod catalog;
pub mod stats;
pub mod vote;
