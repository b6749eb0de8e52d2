mod research;

pub use research::{format_result, Operation, ResearchClient};
