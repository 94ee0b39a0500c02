use ratatui::layout::Rect;

use crate::backend::{AskReply, BackendCommand, BackendError};
use crate::conversation::Conversation;
use crate::sidebar::SidebarState;
use crate::sources::SourcePanel;
use crate::theme::Theme;
use crate::upload::UploadState;

pub const ASK_FAILED_MESSAGE: &str = "Error processing your question. Please try again.";
pub const UPLOAD_FIRST_MESSAGE: &str = "Please upload a document first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Input,
    Sources,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub theme: Theme,

    // Controllers
    pub conversation: Conversation,
    pub upload: UploadState,
    pub sources: SourcePanel,
    pub sidebar: SidebarState,

    // Question input state
    pub question_input: String,
    pub question_cursor: usize, // cursor position in question_input

    // Chat viewport state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub chat_total_lines: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub sources_area: Option<Rect>,

    // In-flight question, holding the document generation it was issued
    // under. A resolution whose generation no longer matches is stale.
    ask_generation: Option<u64>,
}

impl App {
    pub fn new(theme: Theme) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Chat,
            theme,

            conversation: Conversation::new(),
            upload: UploadState::new(),
            sources: SourcePanel::new(),
            sidebar: SidebarState::new(),

            question_input: String::new(),
            question_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_total_lines: 0,

            animation_frame: 0,

            chat_area: None,
            sources_area: None,

            ask_generation: None,
        }
    }

    pub fn question_in_flight(&self) -> bool {
        self.ask_generation.is_some()
    }

    /// The question input accepts a submission only with a ready document
    /// and no question already in flight.
    pub fn input_enabled(&self) -> bool {
        self.upload.document_ready() && !self.question_in_flight()
    }

    /// Submit the typed question. Appends the user message and the typing
    /// indicator, then hands back the command to issue. Rejections leave the
    /// input text alone: an empty or in-flight submission does nothing, and
    /// one without a ready document gets a one-line prompt to upload first.
    pub fn submit_question(&mut self) -> Option<BackendCommand> {
        let question = self.question_input.trim().to_string();
        if question.is_empty() {
            return None;
        }
        if !self.upload.document_ready() {
            self.conversation.push_assistant(UPLOAD_FIRST_MESSAGE);
            self.scroll_chat_to_bottom();
            return None;
        }
        if self.ask_generation.is_some() {
            tracing::debug!("question already in flight, submission ignored");
            return None;
        }

        // The user message lands in the log before the request goes out
        self.conversation.push_user(&question);
        self.conversation.begin_typing();
        self.ask_generation = Some(self.upload.generation());
        self.question_input.clear();
        self.question_cursor = 0;
        self.scroll_chat_to_bottom();

        Some(BackendCommand::Ask {
            question,
            generation: self.upload.generation(),
        })
    }

    /// Absorb a question resolution. The in-flight flag and the typing
    /// indicator clear exactly once on every path; a resolution issued
    /// against a document that has since been replaced is dropped.
    pub fn absorb_ask(&mut self, generation: u64, result: Result<AskReply, BackendError>) {
        self.ask_generation = None;
        self.conversation.clear_typing();

        if generation != self.upload.generation() {
            tracing::info!(
                generation,
                current = self.upload.generation(),
                "dropping answer issued against a replaced document"
            );
            return;
        }

        match result {
            Ok(reply) => {
                self.conversation.push_assistant(&reply.answer);
                let reveal = !reply.fragments.is_empty();
                self.sources.replace(reply.fragments);
                if reveal {
                    self.sidebar.reveal_if_collapsed();
                }
            }
            Err(err) => {
                // Detail goes to the log only; the rendered message stays generic.
                tracing::warn!(error = %err, "ask failed");
                self.conversation.push_error(ASK_FAILED_MESSAGE);
            }
        }
        self.scroll_chat_to_bottom();
    }

    /// Absorb an upload resolution. On success the question input gains
    /// focus, ready for the first question about the new document.
    pub fn absorb_upload(&mut self, result: Result<String, BackendError>) {
        let became_ready =
            self.upload
                .resolve(result, &mut self.conversation, &mut self.sources);
        if became_ready {
            self.focus = FocusPane::Input;
            self.input_mode = InputMode::Editing;
            self.question_cursor = self.question_input.chars().count();
        }
        self.scroll_chat_to_bottom();
    }

    /// Start a fresh conversation. Ignored while a question or upload is
    /// unresolved so transient entries cannot leak across logs.
    pub fn new_conversation(&mut self) {
        if self.ask_generation.is_some() || self.upload.in_flight() {
            tracing::debug!("request unresolved, keeping current conversation");
            return;
        }
        self.conversation.clear();
        self.chat_scroll = 0;
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.has_typing() || self.upload.in_flight() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn chat_scroll_down(&mut self) {
        if self.chat_scroll < self.chat_total_lines.saturating_sub(self.chat_height) {
            self.chat_scroll = self.chat_scroll.saturating_add(1);
        }
    }

    pub fn chat_scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll chat to bottom so the newest entry is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.conversation.messages() {
            total_lines += 1; // Role line ("You:" or "AI:")
            // Calculate wrapped lines for each line of content
            for line in msg.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
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

    pub fn status_document_label(&self) -> String {
        match self.upload.document() {
            Some(doc) => doc.filename.clone(),
            None => "no document".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{MessageKind, Role};
    use crate::sources::Fragment;

    fn ready_app() -> App {
        let mut app = App::new(Theme::Dark);
        app.upload.open_prompt();
        app.upload.path_input = "report.pdf".to_string();
        let command = app.upload.submit(&mut app.conversation);
        assert!(command.is_some());
        app.absorb_upload(Ok("report.pdf".to_string()));
        app
    }

    fn reply(answer: &str, fragments: Vec<Fragment>) -> AskReply {
        AskReply {
            answer: answer.to_string(),
            fragments,
        }
    }

    fn fragment(preview: &str, full: &str) -> Fragment {
        Fragment::new(preview.to_string(), full.to_string())
    }

    #[test]
    fn test_submit_appends_user_message_then_typing_before_command() {
        let mut app = ready_app();
        let log_len = app.conversation.messages().len();
        app.question_input = "What is the notice period?".to_string();

        let command = app.submit_question();

        assert!(matches!(command, Some(BackendCommand::Ask { .. })));
        let messages = &app.conversation.messages()[log_len..];
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "What is the notice period?");
        assert_eq!(messages[1].kind, MessageKind::Typing);
        assert!(app.question_in_flight());
        assert!(app.question_input.is_empty());
    }

    #[test]
    fn test_submit_without_document_prompts_to_upload_first() {
        let mut app = App::new(Theme::Dark);
        app.question_input = "anything?".to_string();

        let command = app.submit_question();

        assert!(command.is_none());
        assert!(!app.question_in_flight());
        assert_eq!(app.conversation.messages().len(), 1);
        assert_eq!(app.conversation.messages()[0].text, UPLOAD_FIRST_MESSAGE);
        // Input is preserved for after the upload
        assert_eq!(app.question_input, "anything?");
    }

    #[test]
    fn test_submit_while_in_flight_is_ignored() {
        let mut app = ready_app();
        app.question_input = "first?".to_string();
        app.submit_question().unwrap();
        let log_len = app.conversation.messages().len();

        app.question_input = "second?".to_string();
        let command = app.submit_question();

        assert!(command.is_none());
        assert_eq!(app.conversation.messages().len(), log_len);
        let typing_count = app
            .conversation
            .messages()
            .iter()
            .filter(|m| m.kind == MessageKind::Typing)
            .count();
        assert_eq!(typing_count, 1);
    }

    #[test]
    fn test_empty_submission_does_nothing() {
        let mut app = ready_app();
        app.question_input = "   ".to_string();
        assert!(app.submit_question().is_none());
        assert!(!app.question_in_flight());
    }

    #[test]
    fn test_answer_replaces_typing_and_reveals_sources() {
        let mut app = ready_app();
        app.sidebar.toggle();
        assert!(app.sidebar.is_collapsed());

        app.question_input = "What is the notice period?".to_string();
        app.submit_question().unwrap();
        let generation = app.upload.generation();

        app.absorb_ask(
            generation,
            Ok(reply("30 days", vec![fragment("short", "short and long")])),
        );

        assert!(!app.question_in_flight());
        assert!(!app.conversation.has_typing());
        let last = app.conversation.messages().last().unwrap();
        assert_eq!(last.text, "30 days");
        assert_eq!(last.kind, MessageKind::Normal);
        assert_eq!(app.sources.len(), 1);
        assert!(!app.sources.fragments()[0].is_expanded());
        assert!(!app.sidebar.is_collapsed());
    }

    #[test]
    fn test_answer_without_sources_empties_panel_without_revealing() {
        let mut app = ready_app();
        app.sources
            .replace(vec![fragment("stale", "stale full")]);
        app.sidebar.toggle();

        app.question_input = "anything?".to_string();
        app.submit_question().unwrap();
        app.absorb_ask(app.upload.generation(), Ok(reply("yes", Vec::new())));

        assert!(app.sources.is_empty());
        assert!(app.sidebar.is_collapsed());
    }

    #[test]
    fn test_ask_failure_is_reported_generically() {
        let mut app = ready_app();
        app.question_input = "anything?".to_string();
        app.submit_question().unwrap();

        app.absorb_ask(
            app.upload.generation(),
            Err(BackendError::Server("model overloaded".to_string())),
        );

        assert!(!app.question_in_flight());
        assert!(!app.conversation.has_typing());
        let last = app.conversation.messages().last().unwrap();
        assert_eq!(last.text, ASK_FAILED_MESSAGE);
        assert!(app
            .conversation
            .messages()
            .iter()
            .all(|m| !m.text.contains("model overloaded")));
    }

    #[test]
    fn test_resubmission_works_after_resolution() {
        let mut app = ready_app();
        app.question_input = "first?".to_string();
        app.submit_question().unwrap();
        app.absorb_ask(
            app.upload.generation(),
            Err(BackendError::Server("boom".to_string())),
        );

        app.question_input = "second?".to_string();
        assert!(app.submit_question().is_some());
    }

    #[test]
    fn test_stale_answer_is_dropped_but_clears_flight_state() {
        let mut app = ready_app();
        app.question_input = "about the old document?".to_string();
        app.submit_question().unwrap();
        let stale_generation = app.upload.generation();

        // A new upload completes while the question is still out
        app.upload.open_prompt();
        app.upload.path_input = "newer.pdf".to_string();
        app.upload.submit(&mut app.conversation).unwrap();
        app.absorb_upload(Ok("newer.pdf".to_string()));
        let log_len = app.conversation.messages().len();

        app.absorb_ask(stale_generation, Ok(reply("stale answer", vec![fragment("s", "s")])));

        assert!(!app.question_in_flight());
        assert!(!app.conversation.has_typing());
        // The typing indicator goes away and nothing else changes
        assert_eq!(app.conversation.messages().len(), log_len - 1);
        assert!(app
            .conversation
            .messages()
            .iter()
            .all(|m| m.text != "stale answer"));
        assert!(app.sources.is_empty());

        // And the conversation stays usable
        app.question_input = "about the new document?".to_string();
        assert!(app.submit_question().is_some());
    }

    #[test]
    fn test_input_enabled_iff_ready_and_idle() {
        let mut app = App::new(Theme::Dark);
        assert!(!app.input_enabled());

        app = ready_app();
        assert!(app.input_enabled());

        app.question_input = "anything?".to_string();
        app.submit_question().unwrap();
        assert!(!app.input_enabled());

        app.absorb_ask(app.upload.generation(), Ok(reply("done", Vec::new())));
        assert!(app.input_enabled());
    }

    #[test]
    fn test_upload_success_focuses_question_input() {
        let app = ready_app();
        assert_eq!(app.focus, FocusPane::Input);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn test_new_conversation_waits_for_resolution() {
        let mut app = ready_app();
        app.question_input = "anything?".to_string();
        app.submit_question().unwrap();

        app.new_conversation();
        assert!(!app.conversation.is_empty());

        app.absorb_ask(app.upload.generation(), Ok(reply("done", Vec::new())));
        app.new_conversation();
        assert!(app.conversation.is_empty());
        // The document survives a cleared conversation
        assert!(app.upload.document_ready());
    }

    #[test]
    fn test_tick_animates_only_while_waiting() {
        let mut app = ready_app();
        let frame = app.animation_frame;
        app.tick_animation();
        assert_eq!(app.animation_frame, frame);

        app.question_input = "anything?".to_string();
        app.submit_question().unwrap();
        app.tick_animation();
        assert_ne!(app.animation_frame, frame);
    }

    #[tokio::test]
    async fn test_upload_then_ask_through_the_dispatcher() {
        use axum::extract::Multipart;
        use axum::routing::post;
        use axum::{Json, Router};
        use serde_json::{json, Value};
        use tokio::sync::mpsc;

        use crate::backend::{BackendClient, Dispatcher};
        use crate::handler;

        async fn upload_route(mut multipart: Multipart) -> Json<Value> {
            let field = multipart.next_field().await.unwrap().unwrap();
            let filename = field.file_name().unwrap().to_string();
            field.bytes().await.unwrap();
            Json(json!({ "success": true, "filename": filename }))
        }

        async fn ask_route(Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(body["question"], "What is the notice period?");
            Json(json!({
                "answer": "30 days",
                "sources": [{
                    "content": "notice period is 30 days",
                    "full_content": "the notice period is 30 days from receipt"
                }]
            }))
        }

        let router = Router::new()
            .route("/upload", post(upload_route))
            .route("/ask", post(ask_route));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(BackendClient::new(&format!("http://{addr}")), tx);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.pdf");
        std::fs::write(&path, b"%PDF-1.4 test payload").unwrap();

        let mut app = App::new(Theme::Dark);
        app.upload.open_prompt();
        app.upload.path_input = path.to_string_lossy().into_owned();
        let command = app.upload.submit(&mut app.conversation).unwrap();
        dispatcher.dispatch(command);

        let event = rx.recv().await.unwrap();
        handler::handle_event(&mut app, event).unwrap();
        assert!(app.upload.document_ready());
        assert!(app.input_enabled());
        assert!(app
            .conversation
            .messages()
            .iter()
            .any(|m| m.text.contains("contract.pdf has been processed")));

        app.question_input = "What is the notice period?".to_string();
        let command = app.submit_question().unwrap();
        dispatcher.dispatch(command);

        let event = rx.recv().await.unwrap();
        handler::handle_event(&mut app, event).unwrap();

        assert_eq!(app.conversation.messages().last().unwrap().text, "30 days");
        assert!(!app.conversation.has_typing());
        assert_eq!(app.sources.len(), 1);
        assert!(!app.sources.fragments()[0].is_expanded());
    }
}
