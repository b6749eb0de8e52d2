//! Which page is visible, which modals are open, and the selected topic.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Topics,
    TopicDetail(String),
    Sources(String),
}

impl Page {
    /// The selected topic; `None` on the topic list.
    pub fn topic_id(&self) -> Option<&str> {
        match self {
            Page::Topics => None,
            Page::TopicDetail(id) | Page::Sources(id) => Some(id),
        }
    }

    pub fn next(&self, event: &NavEvent) -> Option<Page> {
        match (self, event) {
            (_, NavEvent::ViewTopics) => Some(Page::Topics),
            (Page::Topics, NavEvent::SelectTopic(id)) => Some(Page::TopicDetail(id.clone())),
            (Page::TopicDetail(id), NavEvent::ViewSources) => Some(Page::Sources(id.clone())),
            (Page::Sources(id), NavEvent::Back) => Some(Page::TopicDetail(id.clone())),
            (Page::TopicDetail(_) | Page::Sources(_), NavEvent::TopicDeleted) => Some(Page::Topics),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    ViewTopics,
    SelectTopic(String),
    ViewSources,
    Back,
    TopicDeleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    AddTopic,
    AddSource,
    Citation,
}

/// Independent visibility flags, one per modal.
#[derive(Debug, Clone, Default)]
pub struct Modals {
    add_topic: bool,
    add_source: bool,
    citation: bool,
}

impl Modals {
    fn flag(&mut self, modal: Modal) -> &mut bool {
        match modal {
            Modal::AddTopic => &mut self.add_topic,
            Modal::AddSource => &mut self.add_source,
            Modal::Citation => &mut self.citation,
        }
    }

    pub fn open(&mut self, modal: Modal) {
        *self.flag(modal) = true;
    }

    pub fn close(&mut self, modal: Modal) {
        *self.flag(modal) = false;
    }

    pub fn is_open(&self, modal: Modal) -> bool {
        match modal {
            Modal::AddTopic => self.add_topic,
            Modal::AddSource => self.add_source,
            Modal::Citation => self.citation,
        }
    }

    /// The modal that receives input when several are open.
    pub fn topmost(&self) -> Option<Modal> {
        [Modal::Citation, Modal::AddSource, Modal::AddTopic]
            .into_iter()
            .find(|m| self.is_open(*m))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Navigation {
    page: Page,
    pub modals: Modals,
}

impl Navigation {
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn current_topic_id(&self) -> Option<&str> {
        self.page.topic_id()
    }

    /// Applies `event`, returning the new page when the transition is allowed.
    pub fn apply(&mut self, event: NavEvent) -> Option<&Page> {
        let next = self.page.next(&event)?;
        self.page = next;
        Some(&self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_topics_works_from_anywhere() {
        for page in [
            Page::Topics,
            Page::TopicDetail("t".into()),
            Page::Sources("t".into()),
        ] {
            assert_eq!(page.next(&NavEvent::ViewTopics), Some(Page::Topics));
        }
    }

    #[test]
    fn topic_flow_follows_the_table() {
        let mut nav = Navigation::default();
        assert_eq!(nav.current_topic_id(), None);

        nav.apply(NavEvent::SelectTopic("t1".into())).unwrap();
        assert_eq!(nav.page(), &Page::TopicDetail("t1".into()));
        assert_eq!(nav.current_topic_id(), Some("t1"));

        nav.apply(NavEvent::ViewSources).unwrap();
        assert_eq!(nav.page(), &Page::Sources("t1".into()));

        nav.apply(NavEvent::Back).unwrap();
        assert_eq!(nav.page(), &Page::TopicDetail("t1".into()));

        nav.apply(NavEvent::TopicDeleted).unwrap();
        assert_eq!(nav.page(), &Page::Topics);
        assert_eq!(nav.current_topic_id(), None);
    }

    #[test]
    fn undefined_transitions_are_rejected() {
        let mut nav = Navigation::default();
        assert!(nav.apply(NavEvent::ViewSources).is_none());
        assert!(nav.apply(NavEvent::Back).is_none());
        assert!(nav.apply(NavEvent::TopicDeleted).is_none());
        assert_eq!(nav.page(), &Page::Topics);

        nav.apply(NavEvent::SelectTopic("a".into()));
        assert!(nav.apply(NavEvent::SelectTopic("b".into())).is_none());
        assert_eq!(nav.current_topic_id(), Some("a"));
    }

    #[test]
    fn modals_are_independent_of_pages_and_each_other() {
        let mut nav = Navigation::default();
        nav.modals.open(Modal::AddTopic);
        nav.modals.open(Modal::Citation);

        nav.apply(NavEvent::SelectTopic("t".into()));
        assert!(nav.modals.is_open(Modal::AddTopic));
        assert_eq!(nav.modals.topmost(), Some(Modal::Citation));

        nav.modals.close(Modal::Citation);
        assert_eq!(nav.modals.topmost(), Some(Modal::AddTopic));
    }
}
