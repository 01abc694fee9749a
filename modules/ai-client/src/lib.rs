//! Text-generation client used by the research runner.
//!
//! `TextModel` is the provider-agnostic seam; `Gemini` is the production
//! implementation (Google Search grounded `generateContent`).

pub mod gemini;
pub mod traits;
pub mod util;

pub use gemini::Gemini;
pub use traits::TextModel;
