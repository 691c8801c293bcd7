pub mod duckduckgo;
pub mod gnews;
pub mod wikipedia;

pub use duckduckgo::{DuckDuckGoHtml, DuckDuckGoInstant};
pub use gnews::GNewsProvider;
pub use wikipedia::{WikipediaRest, WikipediaSearch};
