//! nutribot-bot
//!
//! The conversational pipeline. Composes a `FoodSearch` and a `FoodRepository`
//! through the core traits: `parser` reads the message, `aggregate` averages
//! the nutrition observations of the matched foods, `compose` writes the reply
//! and `session` records turns per conversation.

pub mod parser;
pub mod aggregate;
pub mod compose;
pub mod pipeline;
pub mod session;

pub use aggregate::{aggregate, MatchedFood};
pub use compose::Composer;
pub use parser::parse;
pub use pipeline::Bot;
pub use session::{InMemoryTranscriptStore, Sessions, FAILURE_REPLY};
