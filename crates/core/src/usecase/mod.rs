pub mod app_service;
pub mod evaluator;
pub mod orchestrator;
pub mod questions;
pub mod report;
pub mod round_runner;
pub mod skills;

#[cfg(test)]
pub(crate) mod test_support;
