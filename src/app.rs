use std::path::PathBuf;

use futures_util::StreamExt;
use ratatui::widgets::ListState;
use tokio::sync::mpsc;

use crate::api::{Agent, FileKind, FoundryClient};
use crate::stream::{self, FrameDecoder, StreamEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Agents,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Files,
}

/// Which files sidebar section has the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilesSection {
    #[default]
    Uploads,
    Outputs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Agent,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub role: ChatRole,
    pub text: String,
}

/// Phase of the chat send workflow. Overlapping sends are allowed; the
/// phase tracks the aggregate (Idle only once every stream has drained).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPhase {
    #[default]
    Idle,
    Sending,
    Streaming,
    Failed,
}

/// Progress reports from one spawned agent-run stream.
#[derive(Debug)]
pub enum StreamUpdate {
    /// Response body opened; chunks are flowing.
    Started,
    Event(StreamEvent),
    Finished,
    Failed(String),
}

/// Everything background tasks report back to the UI task. All state
/// mutation happens on the UI task, in the order updates arrive.
#[derive(Debug)]
pub enum AppUpdate {
    Agents(Vec<Agent>),
    AgentDetail(Agent),
    Files(FileKind, Vec<String>),
    Uploaded(String),
    UploadFailed(String),
    Downloaded(String),
    Stream(StreamUpdate),
    Notice(String),
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Agents screen
    pub agents: Vec<Agent>,
    pub agents_state: ListState,

    // Detail screen
    pub agent: Option<Agent>,
    pub messages: Vec<ChatMessage>,
    next_message_id: u64,
    pub input: String,
    pub cursor: usize,

    // Files sidebar
    pub uploads: Vec<String>,
    pub downloads: Vec<String>,
    pub files_section: FilesSection,
    pub uploads_state: ListState,
    pub outputs_state: ListState,

    // Upload path prompt
    pub show_upload_prompt: bool,
    pub upload_input: String,
    pub upload_cursor: usize,

    // Send workflow
    pub send_phase: SendPhase,
    pub active_streams: usize,

    // Chat viewport (updated during render, used for scroll math)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Status line
    pub notice: Option<String>,
    pub animation_frame: u8,

    // Collaborators
    client: FoundryClient,
    tx: mpsc::UnboundedSender<AppUpdate>,
    download_dir: PathBuf,
}

impl App {
    pub fn new(
        client: FoundryClient,
        tx: mpsc::UnboundedSender<AppUpdate>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Agents,
            input_mode: InputMode::Normal,
            focus: FocusPane::Chat,

            agents: Vec::new(),
            agents_state: ListState::default(),

            agent: None,
            messages: Vec::new(),
            next_message_id: 0,
            input: String::new(),
            cursor: 0,

            uploads: Vec::new(),
            downloads: Vec::new(),
            files_section: FilesSection::default(),
            uploads_state: ListState::default(),
            outputs_state: ListState::default(),

            show_upload_prompt: false,
            upload_input: String::new(),
            upload_cursor: 0,

            send_phase: SendPhase::default(),
            active_streams: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            notice: None,
            animation_frame: 0,

            client,
            tx,
            download_dir,
        }
    }

    // ---- Transcript and artifact models ------------------------------

    /// Append one message. The transcript only ever grows; ids stay unique
    /// for display-list stability.
    pub fn push_message(&mut self, role: ChatRole, text: String) {
        let id = self.next_message_id;
        self.next_message_id += 1;
        self.messages.push(ChatMessage { id, role, text });
    }

    /// Idempotent artifact insertion: announcing the same filename twice
    /// leaves exactly one entry.
    pub fn insert_download(&mut self, name: String) {
        if !self.downloads.contains(&name) {
            self.downloads.push(name);
        }
    }

    /// Dispatch one successfully parsed stream event.
    pub fn apply_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Log { message } => {
                self.push_message(ChatRole::Agent, message.unwrap_or_default());
                self.scroll_chat_to_bottom();
            }
            StreamEvent::Artifact { file } => {
                if let Some(file) = file.filter(|f| !f.is_empty()) {
                    self.insert_download(file);
                }
            }
            // The prompt is already shown locally when it is submitted.
            StreamEvent::User { .. } => {}
        }
    }

    pub fn apply_update(&mut self, update: AppUpdate) {
        match update {
            AppUpdate::Agents(agents) => {
                self.agents = agents;
                if self.agents.is_empty() {
                    self.agents_state.select(None);
                } else if self.agents_state.selected().is_none() {
                    self.agents_state.select(Some(0));
                }
            }
            AppUpdate::AgentDetail(agent) => {
                self.agent = Some(agent);
            }
            AppUpdate::Files(FileKind::Uploads, files) => {
                self.uploads = files;
            }
            AppUpdate::Files(FileKind::Outputs, files) => {
                // Keep artifacts that streamed in before the listing landed.
                let streamed = std::mem::take(&mut self.downloads);
                self.downloads = files;
                for name in streamed {
                    self.insert_download(name);
                }
            }
            AppUpdate::Uploaded(name) => {
                self.notice = Some(format!("Uploaded {name}"));
                self.show_upload_prompt = false;
                self.upload_input.clear();
                self.upload_cursor = 0;
                self.input_mode = InputMode::Normal;
                self.start_refresh_files(FileKind::Uploads);
            }
            AppUpdate::UploadFailed(message) => {
                // The prompt keeps its path so the user can retry.
                self.notice = Some(message);
            }
            AppUpdate::Downloaded(destination) => {
                self.notice = Some(format!("Saved to {destination}"));
            }
            AppUpdate::Stream(update) => self.apply_stream_update(update),
            AppUpdate::Notice(message) => {
                self.notice = Some(message);
            }
        }
    }

    fn apply_stream_update(&mut self, update: StreamUpdate) {
        match update {
            StreamUpdate::Started => {
                self.send_phase = SendPhase::Streaming;
            }
            StreamUpdate::Event(event) => self.apply_event(event),
            StreamUpdate::Finished => {
                self.active_streams = self.active_streams.saturating_sub(1);
                if self.active_streams == 0 {
                    self.send_phase = SendPhase::Idle;
                }
            }
            StreamUpdate::Failed(message) => {
                self.active_streams = self.active_streams.saturating_sub(1);
                if self.active_streams == 0 {
                    self.send_phase = SendPhase::Failed;
                }
                self.notice = Some(message);
            }
        }
    }

    // ---- Chat send workflow ------------------------------------------

    /// `Idle -> Sending`: validate the submission and apply its local side
    /// effects. Returns the slug and prompt for the request, or `None` when
    /// nothing should be sent (blank input, no agent loaded).
    fn begin_send(&mut self) -> Option<(String, String)> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        let slug = self.agent.as_ref()?.slug.clone();

        self.push_message(ChatRole::User, text.clone());
        self.input.clear();
        self.cursor = 0;
        self.send_phase = SendPhase::Sending;
        self.active_streams += 1;
        self.scroll_chat_to_bottom();

        Some((slug, text))
    }

    /// Submit the current input and stream the run response. Concurrent
    /// sends are allowed; their events interleave in chunk-arrival order.
    pub fn start_send(&mut self) {
        let Some((slug, prompt)) = self.begin_send() else {
            return;
        };

        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match client.run_agent(&slug, &prompt).await {
                Ok(response) => {
                    let _ = tx.send(AppUpdate::Stream(StreamUpdate::Started));

                    let mut decoder = FrameDecoder::new();
                    let mut body = response.bytes_stream();
                    while let Some(chunk) = body.next().await {
                        let chunk = match chunk {
                            Ok(chunk) => chunk,
                            // A dropped connection just ends the stream.
                            Err(e) => {
                                tracing::warn!(error = %e, "stream read failed");
                                break;
                            }
                        };
                        for frame in decoder.feed(&chunk) {
                            match stream::parse_event(&frame) {
                                Some(event) => {
                                    let _ = tx.send(AppUpdate::Stream(StreamUpdate::Event(event)));
                                }
                                None => {
                                    tracing::debug!(frame = frame.as_str(), "discarding frame");
                                }
                            }
                        }
                    }
                    if decoder.has_partial() {
                        tracing::debug!("dropping unterminated trailing frame");
                    }
                    let _ = tx.send(AppUpdate::Stream(StreamUpdate::Finished));
                }
                Err(e) => {
                    tracing::warn!(error = %e, slug = slug.as_str(), "agent run request failed");
                    let _ = tx.send(AppUpdate::Stream(StreamUpdate::Failed(format!(
                        "Send failed: {e}"
                    ))));
                }
            }
        });
    }

    // ---- Collaborator calls ------------------------------------------

    pub fn start_load_agents(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match client.list_agents().await {
                Ok(agents) => {
                    let _ = tx.send(AppUpdate::Agents(agents));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "agent listing failed");
                    let _ = tx.send(AppUpdate::Agents(Vec::new()));
                    let _ = tx.send(AppUpdate::Notice(format!("Could not list agents: {e}")));
                }
            }
        });
    }

    /// Open the selected agent's detail view. The transcript starts empty
    /// and is discarded again when the view is left.
    pub fn open_selected_agent(&mut self) {
        let Some(agent) = self.selected_agent().cloned() else {
            return;
        };

        self.screen = Screen::Detail;
        self.focus = FocusPane::Chat;
        self.input_mode = InputMode::Normal;
        self.agent = Some(agent.clone());
        self.messages.clear();
        self.next_message_id = 0;
        self.input.clear();
        self.cursor = 0;
        self.uploads.clear();
        self.downloads.clear();
        self.uploads_state.select(None);
        self.outputs_state.select(None);
        self.chat_scroll = 0;
        self.send_phase = SendPhase::Idle;

        // Fresh metadata plus both file listings.
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match client.get_agent(&agent.slug).await {
                Ok(detail) => {
                    let _ = tx.send(AppUpdate::AgentDetail(detail));
                }
                Err(e) => {
                    tracing::warn!(error = %e, slug = agent.slug.as_str(), "agent detail failed");
                    let _ = tx.send(AppUpdate::Notice(format!("Could not load agent: {e}")));
                }
            }
        });
        self.start_refresh_files(FileKind::Uploads);
        self.start_refresh_files(FileKind::Outputs);
    }

    pub fn leave_detail(&mut self) {
        self.screen = Screen::Agents;
        self.agent = None;
        self.messages.clear();
        self.show_upload_prompt = false;
        self.notice = None;
    }

    pub fn start_refresh_files(&self, kind: FileKind) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match client.list_files(kind).await {
                Ok(files) => {
                    let _ = tx.send(AppUpdate::Files(kind, files));
                }
                Err(e) => {
                    tracing::warn!(error = %e, kind = kind.as_str(), "file listing failed");
                    let _ = tx.send(AppUpdate::Files(kind, Vec::new()));
                    let _ = tx.send(AppUpdate::Notice(format!(
                        "Could not list {}: {e}",
                        kind.as_str()
                    )));
                }
            }
        });
    }

    /// Upload the path typed into the prompt. On failure the prompt keeps
    /// its contents so the path can be corrected and retried.
    pub fn start_upload(&mut self) {
        let path = PathBuf::from(self.upload_input.trim());
        if path.as_os_str().is_empty() {
            return;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match client.upload_file(&path).await {
                Ok(()) => {
                    let _ = tx.send(AppUpdate::Uploaded(name));
                }
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "upload failed");
                    let _ = tx.send(AppUpdate::UploadFailed(format!(
                        "Upload of {name} failed: {e}"
                    )));
                }
            }
        });
    }

    /// Download the file selected in the focused sidebar section into the
    /// configured download directory.
    pub fn start_download(&self) {
        let (kind, name) = match self.files_section {
            FilesSection::Uploads => (
                FileKind::Uploads,
                self.selected_file(&self.uploads_state, &self.uploads),
            ),
            FilesSection::Outputs => (
                FileKind::Outputs,
                self.selected_file(&self.outputs_state, &self.downloads),
            ),
        };
        let Some(name) = name else {
            return;
        };

        let destination = self.download_dir.join(&name);
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = async {
                let bytes = client.download_file(kind, &name).await?;
                tokio::fs::write(&destination, bytes).await?;
                anyhow::Ok(())
            }
            .await;

            match result {
                Ok(()) => {
                    let _ = tx.send(AppUpdate::Downloaded(destination.display().to_string()));
                }
                Err(e) => {
                    tracing::warn!(error = %e, file = name.as_str(), "download failed");
                    let _ = tx.send(AppUpdate::Notice(format!("Download of {name} failed: {e}")));
                }
            }
        });
    }

    fn selected_file(&self, state: &ListState, files: &[String]) -> Option<String> {
        state.selected().and_then(|i| files.get(i)).cloned()
    }

    // ---- Navigation helpers ------------------------------------------

    pub fn selected_agent(&self) -> Option<&Agent> {
        self.agents_state.selected().and_then(|i| self.agents.get(i))
    }

    pub fn agents_nav_down(&mut self) {
        let len = self.agents.len();
        if len > 0 {
            let i = self.agents_state.selected().unwrap_or(0);
            self.agents_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn agents_nav_up(&mut self) {
        let i = self.agents_state.selected().unwrap_or(0);
        self.agents_state.select(Some(i.saturating_sub(1)));
    }

    pub fn files_nav_down(&mut self) {
        let (state, len) = match self.files_section {
            FilesSection::Uploads => (&mut self.uploads_state, self.uploads.len()),
            FilesSection::Outputs => (&mut self.outputs_state, self.downloads.len()),
        };
        if len > 0 {
            let i = state.selected().unwrap_or(0);
            state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn files_nav_up(&mut self) {
        let state = match self.files_section {
            FilesSection::Uploads => &mut self.uploads_state,
            FilesSection::Outputs => &mut self.outputs_state,
        };
        let i = state.selected().unwrap_or(0);
        state.select(Some(i.saturating_sub(1)));
    }

    pub fn toggle_files_section(&mut self) {
        self.files_section = match self.files_section {
            FilesSection::Uploads => FilesSection::Outputs,
            FilesSection::Outputs => FilesSection::Uploads,
        };
        let (state, len) = match self.files_section {
            FilesSection::Uploads => (&mut self.uploads_state, self.uploads.len()),
            FilesSection::Outputs => (&mut self.outputs_state, self.downloads.len()),
        };
        if state.selected().is_none() && len > 0 {
            state.select(Some(0));
        }
    }

    // ---- Chat viewport -----------------------------------------------

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_chat_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Pin the viewport to the newest message, accounting for wrapping.
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in &self.messages {
            total_lines += 1; // role line
            for line in msg.text.lines() {
                // Character count, not byte length, for UTF-8 text
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // blank line after message
        }
        if self.active_streams > 0 {
            total_lines += 2; // "Agent:" + "Working..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }

    /// Tick animation frame (driven by the Tick event).
    pub fn tick_animation(&mut self) {
        if self.active_streams > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = FoundryClient::new("http://localhost:8000");
        let app = App::new(client, tx, PathBuf::from("."));
        (app, rx)
    }

    fn detail_app() -> (App, mpsc::UnboundedReceiver<AppUpdate>) {
        let (mut app, rx) = test_app();
        app.screen = Screen::Detail;
        app.agent = Some(Agent {
            name: "Researcher".to_string(),
            slug: "researcher".to_string(),
            description: "Looks things up".to_string(),
        });
        (app, rx)
    }

    #[test]
    fn duplicate_artifacts_collapse_to_one() {
        let (mut app, _rx) = test_app();
        app.insert_download("out.csv".to_string());
        app.insert_download("out.csv".to_string());
        assert_eq!(app.downloads, vec!["out.csv".to_string()]);
    }

    #[test]
    fn artifact_from_stream_and_listing_collapse_to_one() {
        let (mut app, _rx) = test_app();
        app.apply_event(StreamEvent::Artifact {
            file: Some("out.csv".to_string()),
        });
        app.apply_update(AppUpdate::Files(
            FileKind::Outputs,
            vec!["old.txt".to_string(), "out.csv".to_string()],
        ));
        assert_eq!(
            app.downloads,
            vec!["old.txt".to_string(), "out.csv".to_string()]
        );
    }

    #[test]
    fn artifact_without_file_is_ignored() {
        let (mut app, _rx) = test_app();
        app.apply_event(StreamEvent::Artifact { file: None });
        app.apply_event(StreamEvent::Artifact {
            file: Some("".to_string()),
        });
        assert!(app.downloads.is_empty());
    }

    #[test]
    fn user_event_is_a_no_op() {
        let (mut app, _rx) = test_app();
        app.apply_event(StreamEvent::User {
            message: Some("echo".to_string()),
        });
        assert!(app.messages.is_empty());
        assert!(app.downloads.is_empty());
    }

    #[test]
    fn transcript_preserves_arrival_order() {
        let (mut app, _rx) = test_app();
        for i in 0..5 {
            app.apply_event(StreamEvent::Log {
                message: Some(format!("step {i}")),
            });
        }
        let texts: Vec<&str> = app.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["step 0", "step 1", "step 2", "step 3", "step 4"]);

        let ids: Vec<u64> = app.messages.iter().map(|m| m.id).collect();
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids, deduped, "ids stay unique");
    }

    #[test]
    fn log_without_message_becomes_empty_agent_line() {
        let (mut app, _rx) = test_app();
        app.apply_event(StreamEvent::Log { message: None });
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].role, ChatRole::Agent);
        assert_eq!(app.messages[0].text, "");
    }

    #[test]
    fn blank_submission_stays_idle() {
        let (mut app, _rx) = detail_app();
        app.input = "   \t ".to_string();
        assert!(app.begin_send().is_none());
        assert!(app.messages.is_empty());
        assert_eq!(app.send_phase, SendPhase::Idle);
        assert_eq!(app.active_streams, 0);
    }

    #[test]
    fn submission_without_agent_is_rejected() {
        let (mut app, _rx) = test_app();
        app.input = "hello".to_string();
        assert!(app.begin_send().is_none());
        assert!(app.messages.is_empty());
    }

    #[test]
    fn submission_appends_user_message_and_enters_sending() {
        let (mut app, _rx) = detail_app();
        app.input = "  hello  ".to_string();

        let (slug, prompt) = app.begin_send().expect("send should start");
        assert_eq!(slug, "researcher");
        assert_eq!(prompt, "hello");
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].role, ChatRole::User);
        assert_eq!(app.messages[0].text, "hello");
        assert!(app.input.is_empty());
        assert_eq!(app.send_phase, SendPhase::Sending);
        assert_eq!(app.active_streams, 1);
    }

    #[test]
    fn stream_lifecycle_returns_to_idle() {
        let (mut app, _rx) = detail_app();
        app.input = "go".to_string();
        app.begin_send().unwrap();

        app.apply_update(AppUpdate::Stream(StreamUpdate::Started));
        assert_eq!(app.send_phase, SendPhase::Streaming);

        app.apply_update(AppUpdate::Stream(StreamUpdate::Finished));
        assert_eq!(app.send_phase, SendPhase::Idle);
        assert_eq!(app.active_streams, 0);
    }

    #[test]
    fn failed_request_surfaces_a_notice() {
        let (mut app, _rx) = detail_app();
        app.input = "go".to_string();
        app.begin_send().unwrap();

        app.apply_update(AppUpdate::Stream(StreamUpdate::Failed(
            "Send failed: connection refused".to_string(),
        )));
        assert_eq!(app.send_phase, SendPhase::Failed);
        assert_eq!(app.messages.len(), 1, "only the user message remains");
        assert!(app.notice.as_deref().unwrap().contains("connection refused"));
    }

    #[test]
    fn overlapping_sends_interleave_without_going_idle_early() {
        let (mut app, _rx) = detail_app();
        app.input = "first".to_string();
        app.begin_send().unwrap();
        app.input = "second".to_string();
        app.begin_send().unwrap();
        assert_eq!(app.active_streams, 2);

        app.apply_update(AppUpdate::Stream(StreamUpdate::Started));
        app.apply_update(AppUpdate::Stream(StreamUpdate::Finished));
        assert_eq!(app.send_phase, SendPhase::Streaming);

        app.apply_update(AppUpdate::Stream(StreamUpdate::Finished));
        assert_eq!(app.send_phase, SendPhase::Idle);
    }

    // End-to-end path: submission plus the canonical two-frame stream.
    #[test]
    fn end_to_end_transcript_and_artifacts() {
        let (mut app, _rx) = detail_app();
        app.input = "hello".to_string();
        app.begin_send().unwrap();
        assert_eq!(app.messages[0].text, "hello");
        assert_eq!(app.messages[0].role, ChatRole::User);

        let bytes =
            b"data: {\"type\":\"log\",\"message\":\"hi\"}\n\ndata: {\"type\":\"artifact\",\"file\":\"out.csv\"}\n\n";
        let mut decoder = FrameDecoder::new();
        for frame in decoder.feed(bytes) {
            if let Some(event) = stream::parse_event(&frame) {
                app.apply_event(event);
            }
        }

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].role, ChatRole::Agent);
        assert_eq!(app.messages[1].text, "hi");
        assert_eq!(app.downloads, vec!["out.csv".to_string()]);
    }

    #[test]
    fn malformed_frames_leave_state_untouched_and_stream_continues() {
        let (mut app, _rx) = detail_app();
        let bytes = b"nodata {\"type\":\"log\",\"message\":\"skip\"}\n\ndata: {broken\n\ndata: {\"type\":\"log\",\"message\":\"kept\"}\n\n";
        let mut decoder = FrameDecoder::new();
        for frame in decoder.feed(bytes) {
            if let Some(event) = stream::parse_event(&frame) {
                app.apply_event(event);
            }
        }
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].text, "kept");
    }

    #[test]
    fn leaving_detail_discards_the_transcript() {
        let (mut app, _rx) = detail_app();
        app.push_message(ChatRole::User, "hello".to_string());
        app.leave_detail();
        assert!(app.messages.is_empty());
        assert_eq!(app.screen, Screen::Agents);
        assert!(app.agent.is_none());
    }
}
