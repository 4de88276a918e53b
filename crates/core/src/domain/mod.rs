pub mod aptitude;
pub mod error;
pub mod job;
pub mod report;
pub mod round;
pub mod session;
pub mod settings;
pub mod speech;
pub mod types;
