//! Language Oracle Adapters.
//!
//! Implementations of the LanguageOracle port.
//!
//! ## Available Adapters
//!
//! - `MockOracle` - Scripted oracle for testing
//! - `OpenAIOracle` - OpenAI chat completions (gpt-4o family)

mod mock_oracle;
mod openai_oracle;

pub use mock_oracle::{MockAnswer, MockOracle};
pub use openai_oracle::{OpenAIConfig, OpenAIOracle};
