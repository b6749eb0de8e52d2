mod source;
mod summary;
mod topic;

pub use source::{credibility_label, credibility_stars, Source, SourceInput, SourceType};
pub use summary::{ResultPanel, Summary};
pub use topic::{Topic, TopicRow};

use rand::Rng;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Builds `<prefix>_<unix millis>_<9 base36 chars>`.
pub fn generate_id(prefix: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!(
        "{}_{}_{}",
        prefix,
        chrono::Utc::now().timestamp_millis(),
        suffix
    )
}
