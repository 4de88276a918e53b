mod input;
mod noop;

pub use input::SpeechInput;
pub use noop::{NoMediaDevices, NoopSpeechOutput, UnavailableRecognizer};
