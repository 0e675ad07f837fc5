pub mod json;
pub mod markdown;
pub mod text;

pub use json::{JsonConfig, JsonFormatter, convert_to_json, story_record};
pub use markdown::{MarkdownConfig, MarkdownFormatter, convert_to_markdown};
pub use text::{TextConfig, TextFormatter, convert_to_text};
