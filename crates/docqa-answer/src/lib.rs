//! Answer synthesis: retrieved segments + question -> grounded answer.

mod prompt;
mod remote;
mod synthesizer;

pub use prompt::PromptBuilder;
pub use remote::RemoteGenerator;
pub use synthesizer::Synthesizer;
