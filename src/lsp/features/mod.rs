//! LSP features for dictionary completion
//!
//! - `traits.rs`: the narrow host interfaces (`DocumentSource`, `SettingsStore`,
//!   `SuggestionSink`) the completion core is written against
//! - `completion/`: word index, context guards and suggestion building

pub mod completion;
pub mod traits;

pub use traits::{CursorPosition, DocumentSource, SettingsStore, SuggestionSink};
