mod format;
mod model;

pub use format::{format_duration, html_to_text};
pub use model::Episode;
