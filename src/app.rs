use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::ai::{format_result, Operation, ResearchClient};
use crate::citation::CitationSet;
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{ResultPanel, Source, Summary, Topic, TopicRow};
use crate::nav::{Modal, NavEvent, Navigation, Page};
use crate::services::{copy_to_clipboard, hostname_title, ActivePage, PageFetcher};
use crate::tui::{AppAction, InputContext, SourceForm};

/// A summarize/suggest call, bound to the topic that was current when it was issued.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub request_id: u64,
    pub topic_id: String,
    pub operation: Operation,
    pub content: String,
    pub page_url: String,
    pub page_title: String,
}

// Message for a finished request
pub struct ProcessOutcome {
    pub request: ProcessRequest,
    pub result: std::result::Result<String, String>,
}

/// Calls the endpoint and, for summaries, stores the result under the captured topic.
pub async fn run_request(
    client: &ResearchClient,
    repository: &Repository,
    request: &ProcessRequest,
) -> Result<String> {
    let text = client
        .process(&request.content, request.operation)
        .await
        .inspect_err(|e| {
            if e.is_remote() {
                tracing::warn!("Research endpoint failed for topic {}: {}", request.topic_id, e);
            }
        })?;
    let formatted = format_result(&text);

    if request.operation.persists() {
        let summary = Summary::new(
            formatted.clone(),
            request.content.clone(),
            request.page_url.clone(),
        );
        repository.append_summary(&request.topic_id, summary).await?;
    }

    Ok(formatted)
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub is_error: bool,
    shown_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    PageUrl,
    Selection,
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::PageUrl => " Open page - enter URL ",
            PromptKind::Selection => " Select text - type or paste ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteTopic(String),
    DeleteSource { topic_id: String, source_id: String },
}

#[derive(Debug, Clone)]
pub struct Confirm {
    pub message: String,
    pub action: ConfirmAction,
}

/// Page a displayed summary came from, kept for "Add to Sources".
#[derive(Debug, Clone)]
struct SummarizedPage {
    url: String,
    title: String,
    summary: String,
}

pub struct App {
    // Navigation
    pub nav: Navigation,

    // Data (views of storage, reloaded after every mutation)
    pub topics: Vec<TopicRow>,
    pub current_topic: Option<Topic>,
    pub sources: Vec<Source>,
    pub summaries: Vec<Summary>,

    // UI State
    pub topic_index: usize,
    pub source_index: usize,
    pub notes: String,
    pub notes_editing: bool,
    pub result: ResultPanel,
    pub topic_input: String,
    pub source_form: SourceForm,
    pub citations: Option<CitationSet>,
    pub prompt: Option<Prompt>,
    pub confirm: Option<Confirm>,
    pub active_page: Option<ActivePage>,
    pub notification: Option<Notification>,
    pub show_help: bool,
    summarized_page: Option<SummarizedPage>,
    notification_ttl: Duration,

    // Async state
    next_request_id: u64,
    latest_request_id: Option<u64>,
    result_rx: mpsc::Receiver<ProcessOutcome>,
    result_tx: mpsc::Sender<ProcessOutcome>,

    // Services
    pub repository: Repository,
    client: Arc<ResearchClient>,
    fetcher: PageFetcher,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        let client = ResearchClient::new(config.api_url.clone())?;
        let fetcher = PageFetcher::new(&config.user_agent)?;

        Self::with_services(
            repository,
            client,
            fetcher,
            Duration::from_secs(config.notification_seconds),
        )
        .await
    }

    pub async fn with_services(
        repository: Repository,
        client: ResearchClient,
        fetcher: PageFetcher,
        notification_ttl: Duration,
    ) -> Result<Self> {
        let topics = repository.topic_rows().await?;
        let (result_tx, result_rx) = mpsc::channel(8);

        Ok(Self {
            nav: Navigation::default(),
            topics,
            current_topic: None,
            sources: Vec::new(),
            summaries: Vec::new(),
            topic_index: 0,
            source_index: 0,
            notes: String::new(),
            notes_editing: false,
            result: ResultPanel::Empty,
            topic_input: String::new(),
            source_form: SourceForm::default(),
            citations: None,
            prompt: None,
            confirm: None,
            active_page: None,
            notification: None,
            show_help: false,
            summarized_page: None,
            notification_ttl,
            next_request_id: 1,
            latest_request_id: None,
            result_rx,
            result_tx,
            repository,
            client: Arc::new(client),
            fetcher,
        })
    }

    pub fn input_context(&self) -> InputContext {
        if self.show_help {
            return InputContext::Help;
        }
        if self.confirm.is_some() {
            return InputContext::Confirm;
        }
        if self.prompt.is_some() {
            return InputContext::Prompt;
        }
        match self.nav.modals.topmost() {
            Some(Modal::AddTopic) => InputContext::TopicName,
            Some(Modal::AddSource) => InputContext::SourceForm,
            Some(Modal::Citation) => InputContext::Citations,
            None => match self.nav.page() {
                Page::Topics => InputContext::Topics,
                Page::TopicDetail(_) if self.notes_editing => InputContext::NotesEditor,
                Page::TopicDetail(_) => InputContext::TopicDetail,
                Page::Sources(_) => InputContext::Sources,
            },
        }
    }

    pub fn selected_source(&self) -> Option<&Source> {
        self.sources.get(self.source_index)
    }

    fn current_topic_id(&self) -> Option<String> {
        self.nav.current_topic_id().map(str::to_string)
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification {
            message: message.into(),
            is_error: false,
            shown_at: Instant::now(),
        });
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification {
            message: message.into(),
            is_error: true,
            shown_at: Instant::now(),
        });
    }

    /// Drops the notification once it has been visible long enough.
    pub fn tick(&mut self) {
        if let Some(n) = &self.notification {
            if n.shown_at.elapsed() >= self.notification_ttl {
                self.notification = None;
            }
        }
    }

    /// Runs an action and turns any failure into a notification.
    pub async fn dispatch(&mut self, action: AppAction) -> bool {
        match self.handle_action(action).await {
            Ok(should_quit) => should_quit,
            Err(AppError::Validation(message)) => {
                self.notify(message);
                false
            }
            Err(e) => {
                tracing::error!("Action failed: {}", e);
                self.notify_error(e.to_string());
                false
            }
        }
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::ShowHelp => self.show_help = true,
            AppAction::HideHelp => self.show_help = false,

            AppAction::MoveUp => match self.nav.page() {
                Page::Topics => self.topic_index = self.topic_index.saturating_sub(1),
                Page::Sources(_) => self.source_index = self.source_index.saturating_sub(1),
                Page::TopicDetail(_) => {}
            },

            AppAction::MoveDown => match self.nav.page() {
                Page::Topics => {
                    if self.topic_index + 1 < self.topics.len() {
                        self.topic_index += 1;
                    }
                }
                Page::Sources(_) => {
                    if self.source_index + 1 < self.sources.len() {
                        self.source_index += 1;
                    }
                }
                Page::TopicDetail(_) => {}
            },

            AppAction::CloseModal(modal) => {
                self.nav.modals.close(modal);
                match modal {
                    Modal::AddSource => self.source_form = SourceForm::default(),
                    Modal::Citation => self.citations = None,
                    Modal::AddTopic => self.topic_input.clear(),
                }
            }

            // Topics page
            AppAction::OpenAddTopic => {
                self.topic_input.clear();
                self.nav.modals.open(Modal::AddTopic);
            }

            AppAction::SelectTopic => {
                if let Some(row) = self.topics.get(self.topic_index) {
                    let id = row.topic.id.clone();
                    self.show_topic_detail(NavEvent::SelectTopic(id)).await?;
                }
            }

            AppAction::TopicInputChar(c) => self.topic_input.push(c),
            AppAction::TopicInputBackspace => {
                self.topic_input.pop();
            }

            AppAction::TopicInputConfirm => {
                let topic = self.repository.create_topic(&self.topic_input).await?;
                self.nav.modals.close(Modal::AddTopic);
                self.topic_input.clear();
                self.reload_topics().await?;
                if let Some(index) = self.topics.iter().position(|r| r.topic.id == topic.id) {
                    self.topic_index = index;
                }
                self.notify("Topic created successfully!");
            }

            // Topic detail page
            AppAction::ViewTopics => self.show_topics().await?,
            AppAction::ViewSources => self.show_sources().await?,
            AppAction::BackToTopic => self.show_topic_detail(NavEvent::Back).await?,

            AppAction::Summarize => self.start_request(Operation::Summarize),
            AppAction::Suggest => self.start_request(Operation::Suggest),

            AppAction::OpenPageStart => {
                let input = self
                    .active_page
                    .as_ref()
                    .map(|p| p.url.clone())
                    .unwrap_or_default();
                self.prompt = Some(Prompt {
                    kind: PromptKind::PageUrl,
                    input,
                });
            }

            AppAction::SelectTextStart => {
                let input = self
                    .active_page
                    .as_ref()
                    .map(|p| p.selection.clone())
                    .unwrap_or_default();
                self.prompt = Some(Prompt {
                    kind: PromptKind::Selection,
                    input,
                });
            }

            AppAction::AddResultToSources => self.add_result_to_sources(),
            AppAction::CapturePage => self.capture_page().await?,
            AppAction::ClearResults => self.result = ResultPanel::Empty,

            AppAction::RequestDeleteTopic => {
                if let Some(id) = self.current_topic_id() {
                    self.confirm = Some(Confirm {
                        message: "Are you sure you want to delete this topic? This will remove all associated notes and data.".to_string(),
                        action: ConfirmAction::DeleteTopic(id),
                    });
                }
            }

            AppAction::EditNotes => self.notes_editing = true,
            AppAction::StopEditingNotes => self.notes_editing = false,
            AppAction::NotesChar(c) => self.notes.push(c),
            AppAction::NotesNewline => self.notes.push('\n'),
            AppAction::NotesBackspace => {
                self.notes.pop();
            }

            AppAction::SaveNotes => {
                if let Some(id) = self.current_topic_id() {
                    self.repository.save_notes(&id, &self.notes).await?;
                    self.notify("Notes saved successfully");
                }
            }

            // Sources page
            AppAction::OpenAddSource => {
                self.source_form = SourceForm::default();
                self.nav.modals.open(Modal::AddSource);
            }

            AppAction::EditSource => {
                if let Some(source) = self.selected_source() {
                    self.source_form = SourceForm::edit(source);
                    self.nav.modals.open(Modal::AddSource);
                }
            }

            AppAction::RequestDeleteSource => {
                if let (Some(topic_id), Some(source)) =
                    (self.current_topic_id(), self.selected_source())
                {
                    self.confirm = Some(Confirm {
                        message: "Are you sure you want to delete this source?".to_string(),
                        action: ConfirmAction::DeleteSource {
                            topic_id,
                            source_id: source.id.clone(),
                        },
                    });
                }
            }

            AppAction::GenerateCitations => self.generate_citations().await?,

            AppAction::OpenSourceInBrowser => {
                if let Some(source) = self.selected_source() {
                    if !source.url.is_empty() {
                        if let Err(e) = open::that(&source.url) {
                            tracing::warn!("Failed to open {}: {}", source.url, e);
                        }
                    }
                }
            }

            // Source form
            AppAction::FormNextField => self.source_form.next_field(),
            AppAction::FormPrevField => self.source_form.prev_field(),
            AppAction::FormChar(c) => self.source_form.input_char(c),
            AppAction::FormBackspace => self.source_form.backspace(),
            AppAction::FormAdjust(forward) => self.source_form.adjust(forward),
            AppAction::FormAutoFill => self.autofill_source().await,
            AppAction::FormSave => self.save_source().await?,

            // Citation modal
            AppAction::CopyCitations(style) => {
                if let Some(citations) = &self.citations {
                    match copy_to_clipboard(citations.get(style)) {
                        Ok(()) => self.notify(format!("Copied {} citations", style.label())),
                        Err(e) => {
                            tracing::warn!("{}", e);
                            self.notify_error("Could not copy to clipboard");
                        }
                    }
                }
            }

            // Prompt
            AppAction::PromptChar(c) => {
                if let Some(prompt) = &mut self.prompt {
                    prompt.input.push(c);
                }
            }
            AppAction::PromptBackspace => {
                if let Some(prompt) = &mut self.prompt {
                    prompt.input.pop();
                }
            }
            AppAction::PromptCancel => self.prompt = None,
            AppAction::PromptConfirm => {
                if let Some(prompt) = self.prompt.take() {
                    self.confirm_prompt(prompt).await;
                }
            }

            // Confirmation dialog
            AppAction::ConfirmYes => {
                if let Some(confirm) = self.confirm.take() {
                    self.confirm_action(confirm.action).await?;
                }
            }
            AppAction::ConfirmNo => self.confirm = None,

            AppAction::Paste(text) => self.paste(&text),
        }

        Ok(false)
    }

    // Navigation

    async fn show_topics(&mut self) -> Result<()> {
        if self.nav.apply(NavEvent::ViewTopics).is_none() {
            return Ok(());
        }
        self.current_topic = None;
        self.notes_editing = false;
        self.reload_topics().await
    }

    /// Enters the detail page: fresh notes and summaries, empty result panel.
    async fn show_topic_detail(&mut self, event: NavEvent) -> Result<()> {
        let id = match (&event, self.nav.page()) {
            (NavEvent::SelectTopic(id), _) => id.clone(),
            (_, page) => match page.topic_id() {
                Some(id) => id.to_string(),
                None => return Ok(()),
            },
        };

        let Some(topic) = self.repository.find_topic(&id).await? else {
            return Ok(());
        };
        if self.nav.apply(event).is_none() {
            return Ok(());
        }

        self.notes = self.repository.load_notes(&id).await?;
        self.summaries = self.repository.list_summaries(&id).await?;
        self.notes_editing = false;
        self.result = ResultPanel::Empty;
        self.summarized_page = None;
        self.current_topic = Some(topic);
        Ok(())
    }

    async fn show_sources(&mut self) -> Result<()> {
        let Some(id) = self.current_topic_id() else {
            return Ok(());
        };
        if self.nav.apply(NavEvent::ViewSources).is_none() {
            return Ok(());
        }
        self.notes_editing = false;
        self.source_index = 0;
        self.reload_sources(&id).await
    }

    async fn reload_topics(&mut self) -> Result<()> {
        self.topics = self.repository.topic_rows().await?;
        if self.topic_index >= self.topics.len() {
            self.topic_index = self.topics.len().saturating_sub(1);
        }
        Ok(())
    }

    async fn reload_sources(&mut self, topic_id: &str) -> Result<()> {
        self.sources = self.repository.list_sources(topic_id).await?;
        if self.source_index >= self.sources.len() {
            self.source_index = self.sources.len().saturating_sub(1);
        }
        Ok(())
    }

    // Summaries and suggestions

    fn start_request(&mut self, operation: Operation) {
        let Some(topic_id) = self.current_topic_id() else {
            return;
        };
        let page = self.active_page.clone().unwrap_or_default();
        let Some(content) = page.selected_text().map(str::to_string) else {
            self.result = ResultPanel::Message("Please select some text first".to_string());
            return;
        };

        let request = ProcessRequest {
            request_id: self.next_request_id,
            topic_id,
            operation,
            content,
            page_url: page.url,
            page_title: page.title,
        };
        self.next_request_id += 1;
        self.latest_request_id = Some(request.request_id);
        self.result = ResultPanel::Pending(operation.pending_message().to_string());

        // Spawn background task for the endpoint call
        let client = Arc::clone(&self.client);
        let repository = self.repository.clone();
        let tx = self.result_tx.clone();

        tokio::spawn(async move {
            let result = run_request(&client, &repository, &request)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ProcessOutcome { request, result }).await;
        });
    }

    /// Poll for finished endpoint calls (non-blocking)
    pub async fn poll_process_result(&mut self) {
        while let Ok(outcome) = self.result_rx.try_recv() {
            let request = outcome.request;
            let same_topic = self.nav.current_topic_id() == Some(request.topic_id.as_str());

            if same_topic && request.operation.persists() && outcome.result.is_ok() {
                match self.repository.list_summaries(&request.topic_id).await {
                    Ok(summaries) => self.summaries = summaries,
                    Err(e) => {
                        tracing::error!("Failed to reload summaries: {}", e);
                        self.notify_error(e.to_string());
                    }
                }
            }

            let latest = self.latest_request_id == Some(request.request_id);
            if latest {
                self.latest_request_id = None;
            }
            if !same_topic || !latest {
                tracing::debug!(
                    "Discarding result of request {} for topic {}",
                    request.request_id,
                    request.topic_id
                );
                continue;
            }

            match outcome.result {
                Ok(text) => match request.operation {
                    Operation::Summarize => {
                        self.summarized_page = Some(SummarizedPage {
                            url: request.page_url,
                            title: request.page_title,
                            summary: text.clone(),
                        });
                        self.result = ResultPanel::Summary(text);
                    }
                    Operation::Suggest => self.result = ResultPanel::Suggestions(text),
                },
                Err(e) => {
                    tracing::error!("Research request failed: {}", e);
                    self.result = ResultPanel::Error(format!("Error: {e}"));
                }
            }
        }
    }

    // Sources

    fn add_result_to_sources(&mut self) {
        if self.current_topic_id().is_none() {
            return;
        }
        let Some(page) = &self.summarized_page else {
            self.notify("Summarize a selection first");
            return;
        };
        let notes = page.summary.replace("<br>", " ");
        self.source_form = SourceForm::for_page(&page.url, &page.title, notes.trim());
        self.nav.modals.open(Modal::AddSource);
    }

    async fn capture_page(&mut self) -> Result<()> {
        let Some(topic_id) = self.current_topic_id() else {
            return Ok(());
        };
        let Some(page) = self.active_page.as_ref().filter(|p| !p.url.is_empty()) else {
            self.notify("Open a page first");
            return Ok(());
        };

        let added = self.repository.add_page_source(&topic_id, page).await?;
        match added {
            Some(_) => self.notify("Source added!"),
            None => self.notify("This page is already in your sources"),
        }
        Ok(())
    }

    async fn save_source(&mut self) -> Result<()> {
        let Some(topic_id) = self.current_topic_id() else {
            return Ok(());
        };
        let editing = self.source_form.is_editing();

        self.repository
            .upsert_source(&topic_id, self.source_form.to_input())
            .await?;

        self.nav.modals.close(Modal::AddSource);
        self.source_form = SourceForm::default();
        if matches!(self.nav.page(), Page::Sources(_)) {
            self.reload_sources(&topic_id).await?;
        }
        self.notify(if editing { "Source updated!" } else { "Source added!" });
        Ok(())
    }

    /// Fills title/author/date from the active page or by fetching the form's URL.
    async fn autofill_source(&mut self) {
        let url = self.source_form.url.trim().to_string();
        if url.is_empty() {
            self.notify("Please enter a URL first");
            return;
        }

        if let Some(page) = self.active_page.as_ref().filter(|p| p.url == url) {
            let metadata = page.metadata.clone();
            self.source_form.apply_metadata(&metadata);
            self.notify("Auto-filled successfully!");
            return;
        }

        let Some(host) = hostname_title(&url) else {
            self.notify_error("Could not auto-fill. Please enter details manually.");
            return;
        };

        match self.fetcher.fetch(&url).await {
            Ok(page) => {
                self.source_form.apply_metadata(&page.metadata);
                if self.source_form.title.is_empty() {
                    self.source_form.title = host;
                }
                self.notify("Auto-filled successfully!");
            }
            Err(e) => {
                tracing::debug!("Auto-fill fetch failed for {}: {}", url, e);
                self.source_form.title = host;
                self.notify("Please fill in additional details manually");
            }
        }
    }

    async fn generate_citations(&mut self) -> Result<()> {
        let Some(topic_id) = self.current_topic_id() else {
            return Ok(());
        };
        let sources = self.repository.list_sources(&topic_id).await?;
        if sources.is_empty() {
            self.notify("No sources to cite");
            return Ok(());
        }

        let today = chrono::Local::now().date_naive();
        self.citations = Some(CitationSet::build(&sources, today));
        self.nav.modals.open(Modal::Citation);
        Ok(())
    }

    // Prompts and confirmations

    async fn confirm_prompt(&mut self, prompt: Prompt) {
        match prompt.kind {
            PromptKind::PageUrl => {
                let url = prompt.input.trim().to_string();
                if url.is_empty() {
                    self.notify("Please enter a URL first");
                    return;
                }
                self.open_page(url).await;
            }
            PromptKind::Selection => {
                let page = self.active_page.get_or_insert_with(ActivePage::default);
                page.selection = prompt.input;
                if page.selected_text().is_some() {
                    self.notify("Selection updated");
                } else {
                    self.notify("Selection cleared");
                }
            }
        }
    }

    async fn open_page(&mut self, url: String) {
        match self.fetcher.fetch(&url).await {
            Ok(page) => {
                let label = if page.title.is_empty() {
                    page.url.clone()
                } else {
                    page.title.clone()
                };
                self.active_page = Some(page);
                self.notify(format!("Opened {label}"));
            }
            Err(e) => {
                tracing::warn!("Could not load {}: {}", url, e);
                self.active_page = Some(ActivePage {
                    title: hostname_title(&url).unwrap_or_default(),
                    url,
                    ..Default::default()
                });
                self.notify_error("Could not load the page; only its URL is available");
            }
        }
    }

    async fn confirm_action(&mut self, action: ConfirmAction) -> Result<()> {
        match action {
            ConfirmAction::DeleteTopic(id) => {
                self.repository.delete_topic(&id).await?;
                self.nav.apply(NavEvent::TopicDeleted);
                self.current_topic = None;
                self.notes.clear();
                self.summaries.clear();
                self.result = ResultPanel::Empty;
                self.reload_topics().await?;
                self.notify("Topic deleted");
            }
            ConfirmAction::DeleteSource {
                topic_id,
                source_id,
            } => {
                self.repository.delete_source(&topic_id, &source_id).await?;
                if matches!(self.nav.page(), Page::Sources(_)) {
                    self.reload_sources(&topic_id).await?;
                }
                self.notify("Source deleted");
            }
        }
        Ok(())
    }

    fn paste(&mut self, text: &str) {
        match self.input_context() {
            InputContext::Prompt => {
                if let Some(prompt) = &mut self.prompt {
                    match prompt.kind {
                        PromptKind::Selection => prompt.input.push_str(text),
                        PromptKind::PageUrl => prompt.input.push_str(text.trim()),
                    }
                }
            }
            InputContext::TopicName => self.topic_input.push_str(&text.replace(['\r', '\n'], " ")),
            InputContext::SourceForm => self.source_form.paste(text),
            InputContext::NotesEditor => self.notes.push_str(text),
            _ => {}
        }
    }
}
