pub mod assemble;
pub mod blocks;
pub mod catalog;
pub mod config;
pub mod consistency;
pub mod detect;
pub mod dom;
pub mod error;
pub mod extract;
pub mod featured;
pub mod page_config;
pub mod page_type;
pub mod pipeline;
pub mod quotes;
pub mod rewrite;
pub mod schema;
pub mod settings;
pub mod signals;
pub mod text;
pub mod types;

pub use config::ConvertOptions;
pub use consistency::enforce_consistency;
pub use error::ConvertError;
pub use page_type::classify_page_type;
pub use pipeline::{convert, convert_batch};
pub use quotes::repair_schema_quotes;
pub use text::normalize_slug;
pub use types::*;
