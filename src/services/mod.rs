mod clipboard;
mod page;

pub use clipboard::copy_to_clipboard;
pub use page::{hostname_title, ActivePage, PageFetcher, PageMetadata};
