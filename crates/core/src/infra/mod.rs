pub mod llm;
pub mod metrics;
pub mod post_processor;
pub mod speech;
