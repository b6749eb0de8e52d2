use futures::future::join_all;

use crate::error::{AppError, Result};
use crate::models::{Source, SourceInput, SourceType, Summary, Topic, TopicRow};
use crate::services::ActivePage;

use super::store::Store;

pub const TOPICS_KEY: &str = "researchTopics";
pub const SUMMARY_LIMIT: usize = 20;

const AUTO_ADDED_NOTE: &str = "Auto-added from summarization";
const AUTO_ADDED_CREDIBILITY: u8 = 3;

pub fn notes_key(topic_id: &str) -> String {
    format!("notes_{topic_id}")
}

pub fn sources_key(topic_id: &str) -> String {
    format!("sources_{topic_id}")
}

pub fn summaries_key(topic_id: &str) -> String {
    format!("summaries_{topic_id}")
}

/// Topics, sources, summaries and notes on top of the key/value store.
///
/// Every mutation is a read-modify-write of one whole list value; two writers
/// racing on the same key resolve as last-write-wins.
#[derive(Clone)]
pub struct Repository {
    store: Store,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let store = Store::open(db_path).await?;
        Ok(Self { store })
    }

    #[cfg(test)]
    pub fn with_store(store: Store) -> Self {
        Self { store }
    }

    // Topic operations

    pub async fn list_topics(&self) -> Result<Vec<Topic>> {
        Ok(self.store.get(TOPICS_KEY).await?.unwrap_or_default())
    }

    pub async fn find_topic(&self, id: &str) -> Result<Option<Topic>> {
        let topics = self.list_topics().await?;
        Ok(topics.into_iter().find(|t| t.id == id))
    }

    pub async fn find_topic_by_name(&self, name: &str) -> Result<Option<Topic>> {
        let needle = name.trim().to_lowercase();
        let topics = self.list_topics().await?;
        Ok(topics.into_iter().find(|t| t.name.to_lowercase() == needle))
    }

    pub async fn create_topic(&self, name: &str) -> Result<Topic> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Please enter a topic name"));
        }

        let mut topics = self.list_topics().await?;
        let lowered = name.to_lowercase();
        if topics.iter().any(|t| t.name.to_lowercase() == lowered) {
            return Err(AppError::validation("A topic with this name already exists"));
        }

        let topic = Topic::new(name);
        topics.push(topic.clone());
        self.store.set(TOPICS_KEY, &topics).await?;

        tracing::info!("Created topic {} ({})", topic.name, topic.id);
        Ok(topic)
    }

    /// Returns `false` when no topic had that id; nothing is touched then.
    pub async fn delete_topic(&self, id: &str) -> Result<bool> {
        let mut topics = self.list_topics().await?;
        let before = topics.len();
        topics.retain(|t| t.id != id);
        if topics.len() == before {
            return Ok(false);
        }

        self.store.set(TOPICS_KEY, &topics).await?;
        self.store
            .remove(&[notes_key(id), summaries_key(id), sources_key(id)])
            .await?;

        tracing::info!("Deleted topic {}", id);
        Ok(true)
    }

    /// Topics in stored order with summary counts read fresh from storage.
    pub async fn topic_rows(&self) -> Result<Vec<TopicRow>> {
        let topics = self.list_topics().await?;
        let counts = join_all(topics.iter().map(|t| self.count_summaries(&t.id))).await;

        topics
            .into_iter()
            .zip(counts)
            .map(|(topic, count)| {
                Ok(TopicRow {
                    topic,
                    summary_count: count?,
                })
            })
            .collect()
    }

    // Notes

    pub async fn load_notes(&self, topic_id: &str) -> Result<String> {
        Ok(self.store.get(&notes_key(topic_id)).await?.unwrap_or_default())
    }

    pub async fn save_notes(&self, topic_id: &str, notes: &str) -> Result<()> {
        self.store.set(&notes_key(topic_id), notes).await?;

        let mut topics = self.list_topics().await?;
        if let Some(topic) = topics.iter_mut().find(|t| t.id == topic_id) {
            topic.notes = notes.to_string();
            self.store.set(TOPICS_KEY, &topics).await?;
        }
        Ok(())
    }

    // Source operations

    pub async fn list_sources(&self, topic_id: &str) -> Result<Vec<Source>> {
        Ok(self
            .store
            .get(&sources_key(topic_id))
            .await?
            .unwrap_or_default())
    }

    /// Merges into the source with a matching id, otherwise prepends a new one.
    pub async fn upsert_source(&self, topic_id: &str, input: SourceInput) -> Result<Source> {
        let key = sources_key(topic_id);
        let mut sources = self.list_sources(topic_id).await?;

        let existing = input
            .id
            .as_ref()
            .and_then(|id| sources.iter().position(|s| &s.id == id));

        let saved = match existing {
            Some(index) => {
                let mut updated = sources[index].clone();
                input.merge_into(&mut updated);
                updated.validate()?;
                sources[index] = updated.clone();
                updated
            }
            None => {
                let source = input.into_source();
                source.validate()?;
                sources.insert(0, source.clone());
                source
            }
        };

        self.store.set(&key, &sources).await?;
        Ok(saved)
    }

    pub async fn delete_source(&self, topic_id: &str, source_id: &str) -> Result<bool> {
        let mut sources = self.list_sources(topic_id).await?;
        let before = sources.len();
        sources.retain(|s| s.id != source_id);
        if sources.len() == before {
            return Ok(false);
        }
        self.store.set(&sources_key(topic_id), &sources).await?;
        Ok(true)
    }

    /// Captures a page as a website source unless its url is already listed.
    pub async fn add_page_source(&self, topic_id: &str, page: &ActivePage) -> Result<Option<Source>> {
        let mut sources = self.list_sources(topic_id).await?;
        if sources.iter().any(|s| s.url == page.url) {
            tracing::debug!("{} already captured for {}", page.url, topic_id);
            return Ok(None);
        }

        let title = [page.metadata.title.as_str(), page.title.as_str()]
            .into_iter()
            .find(|t| !t.trim().is_empty())
            .unwrap_or("Untitled");

        let source = SourceInput {
            url: Some(page.url.clone()),
            title: Some(title.to_string()),
            author: Some(page.metadata.author.clone()),
            date: Some(page.metadata.date.clone()),
            source_type: Some(SourceType::Website),
            credibility: Some(AUTO_ADDED_CREDIBILITY),
            notes: Some(AUTO_ADDED_NOTE.to_string()),
            ..Default::default()
        }
        .into_source();

        sources.insert(0, source.clone());
        self.store.set(&sources_key(topic_id), &sources).await?;
        Ok(Some(source))
    }

    // Summary operations

    pub async fn list_summaries(&self, topic_id: &str) -> Result<Vec<Summary>> {
        Ok(self
            .store
            .get(&summaries_key(topic_id))
            .await?
            .unwrap_or_default())
    }

    /// Prepends and keeps only the newest `SUMMARY_LIMIT` entries.
    pub async fn append_summary(&self, topic_id: &str, summary: Summary) -> Result<()> {
        let mut summaries = self.list_summaries(topic_id).await?;
        summaries.insert(0, summary);
        summaries.truncate(SUMMARY_LIMIT);
        self.store.set(&summaries_key(topic_id), &summaries).await
    }

    pub async fn count_summaries(&self, topic_id: &str) -> Result<usize> {
        Ok(self.list_summaries(topic_id).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PageMetadata;
    use tokio_test::{assert_err, assert_ok};

    async fn repository() -> Repository {
        Repository::with_store(Store::open_in_memory().await.unwrap())
    }

    fn page(url: &str, title: &str) -> ActivePage {
        ActivePage {
            url: url.to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn duplicate_names_differing_in_case_are_rejected() {
        let repo = repository().await;
        assert_ok!(repo.create_topic("Climate").await);

        let err = repo.create_topic("cLIMATE").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("already exists")));
        assert_eq!(repo.list_topics().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_name_is_rejected_without_writing() {
        let repo = repository().await;
        assert_err!(repo.create_topic("   ").await);
        assert!(repo.list_topics().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn topics_keep_creation_order_and_trimmed_names() {
        let repo = repository().await;
        repo.create_topic("  Oceans ").await.unwrap();
        repo.create_topic("Forests").await.unwrap();

        let names: Vec<String> = repo
            .list_topics()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Oceans", "Forests"]);
    }

    #[tokio::test]
    async fn deleting_a_topic_clears_its_keys() {
        let repo = repository().await;
        let topic = repo.create_topic("Climate").await.unwrap();
        let other = repo.create_topic("Energy").await.unwrap();

        repo.save_notes(&topic.id, "some notes").await.unwrap();
        repo.upsert_source(
            &topic.id,
            SourceInput {
                url: Some("http://a.test".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        repo.append_summary(&topic.id, Summary::new("s".into(), "o".into(), String::new()))
            .await
            .unwrap();
        repo.save_notes(&other.id, "keep me").await.unwrap();

        assert!(repo.delete_topic(&topic.id).await.unwrap());

        let ids: Vec<String> = repo.list_topics().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![other.id.clone()]);
        assert_eq!(repo.load_notes(&topic.id).await.unwrap(), "");
        assert!(repo.list_sources(&topic.id).await.unwrap().is_empty());
        assert!(repo.list_summaries(&topic.id).await.unwrap().is_empty());
        assert_eq!(repo.load_notes(&other.id).await.unwrap(), "keep me");
    }

    #[tokio::test]
    async fn deleting_an_unknown_topic_is_a_no_op() {
        let repo = repository().await;
        repo.create_topic("Climate").await.unwrap();

        assert!(!repo.delete_topic("topic_0_missing").await.unwrap());
        assert_eq!(repo.list_topics().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn summaries_are_capped_newest_first() {
        let repo = repository().await;
        let topic = repo.create_topic("Climate").await.unwrap();

        for i in 0..25 {
            let mut summary = Summary::new(format!("summary {i}"), String::new(), String::new());
            summary.id = i;
            repo.append_summary(&topic.id, summary).await.unwrap();
        }

        let summaries = repo.list_summaries(&topic.id).await.unwrap();
        assert_eq!(summaries.len(), SUMMARY_LIMIT);
        let ids: Vec<i64> = summaries.iter().map(|s| s.id).collect();
        let expected: Vec<i64> = (5..25).rev().collect();
        assert_eq!(ids, expected);
        assert_eq!(repo.count_summaries(&topic.id).await.unwrap(), SUMMARY_LIMIT);
    }

    #[tokio::test]
    async fn upsert_with_known_id_merges_fields() {
        let repo = repository().await;
        let topic = repo.create_topic("Climate").await.unwrap();

        let created = repo
            .upsert_source(
                &topic.id,
                SourceInput {
                    url: Some("http://a.test".into()),
                    title: Some("A".into()),
                    author: Some("Ann".into()),
                    credibility: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = repo
            .upsert_source(
                &topic.id,
                SourceInput {
                    id: Some(created.id.clone()),
                    notes: Some("read twice".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.url, "http://a.test");
        assert_eq!(updated.author, "Ann");
        assert_eq!(updated.credibility, Some(4));
        assert_eq!(updated.notes, "read twice");
        assert_eq!(updated.added_at, created.added_at);
        assert_eq!(repo.list_sources(&topic.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn new_sources_are_prepended() {
        let repo = repository().await;
        let topic = repo.create_topic("Climate").await.unwrap();

        for url in ["http://first.test", "http://second.test"] {
            repo.upsert_source(
                &topic.id,
                SourceInput {
                    url: Some(url.into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let urls: Vec<String> = repo
            .list_sources(&topic.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.url)
            .collect();
        assert_eq!(urls, vec!["http://second.test", "http://first.test"]);
    }

    #[tokio::test]
    async fn create_topic_then_add_source_scenario() {
        let repo = repository().await;
        let topic = repo.create_topic("Climate").await.unwrap();

        repo.upsert_source(
            &topic.id,
            SourceInput {
                url: Some("http://a.test".into()),
                title: Some("A".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let sources = repo.list_sources(&topic.id).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "http://a.test");
        assert!(!sources[0].id.is_empty());
    }

    #[tokio::test]
    async fn invalid_source_leaves_list_untouched() {
        let repo = repository().await;
        let topic = repo.create_topic("Climate").await.unwrap();

        let result = repo
            .upsert_source(
                &topic.id,
                SourceInput {
                    author: Some("Nobody".into()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(repo.list_sources(&topic.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_source_removes_only_that_record() {
        let repo = repository().await;
        let topic = repo.create_topic("Climate").await.unwrap();
        let keep = repo
            .upsert_source(&topic.id, SourceInput { title: Some("Keep".into()), ..Default::default() })
            .await
            .unwrap();
        let drop = repo
            .upsert_source(&topic.id, SourceInput { title: Some("Drop".into()), ..Default::default() })
            .await
            .unwrap();

        assert!(repo.delete_source(&topic.id, &drop.id).await.unwrap());
        assert!(!repo.delete_source(&topic.id, &drop.id).await.unwrap());

        let sources = repo.list_sources(&topic.id).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, keep.id);
    }

    #[tokio::test]
    async fn page_capture_skips_known_urls() {
        let repo = repository().await;
        let topic = repo.create_topic("Climate").await.unwrap();
        let mut captured = page("http://news.test/story", "Tab title");
        captured.metadata = PageMetadata {
            title: "Story headline".into(),
            author: "Reporter".into(),
            date: "2023-04-05".into(),
        };

        let first = repo.add_page_source(&topic.id, &captured).await.unwrap().unwrap();
        assert_eq!(first.title, "Story headline");
        assert_eq!(first.source_type, SourceType::Website);
        assert_eq!(first.credibility, Some(3));
        assert_eq!(first.notes, AUTO_ADDED_NOTE);

        assert!(repo.add_page_source(&topic.id, &captured).await.unwrap().is_none());
        assert_eq!(repo.list_sources(&topic.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn page_capture_falls_back_to_untitled() {
        let repo = repository().await;
        let topic = repo.create_topic("Climate").await.unwrap();

        let source = repo
            .add_page_source(&topic.id, &page("http://bare.test", ""))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(source.title, "Untitled");
    }

    #[tokio::test]
    async fn notes_are_mirrored_into_the_topic() {
        let repo = repository().await;
        let topic = repo.create_topic("Climate").await.unwrap();

        repo.save_notes(&topic.id, "line one\nline two").await.unwrap();

        assert_eq!(repo.load_notes(&topic.id).await.unwrap(), "line one\nline two");
        let stored = repo.find_topic(&topic.id).await.unwrap().unwrap();
        assert_eq!(stored.notes, "line one\nline two");
    }

    #[tokio::test]
    async fn topic_rows_count_summaries_from_storage() {
        let repo = repository().await;
        let a = repo.create_topic("A").await.unwrap();
        repo.create_topic("B").await.unwrap();
        for _ in 0..3 {
            repo.append_summary(&a.id, Summary::new("s".into(), "o".into(), String::new()))
                .await
                .unwrap();
        }

        let rows = repo.topic_rows().await.unwrap();
        let counts: Vec<(String, usize)> = rows
            .into_iter()
            .map(|r| (r.topic.name, r.summary_count))
            .collect();
        assert_eq!(counts, vec![("A".to_string(), 3), ("B".to_string(), 0)]);
    }

    #[tokio::test]
    async fn topic_lookup_by_name_ignores_case() {
        let repo = repository().await;
        let topic = repo.create_topic("Climate").await.unwrap();
        let found = repo.find_topic_by_name(" climate ").await.unwrap().unwrap();
        assert_eq!(found.id, topic.id);
    }
}
