//! Upstream model access: the Gemini client and the fallback orchestrator.

pub mod fallback;
pub mod gemini;
pub mod traits;

pub use fallback::FallbackOrchestrator;
pub use gemini::GeminiClient;
pub use traits::ModelClient;
