use std::path::PathBuf;
use std::sync::Arc;

use futures_util::FutureExt;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use figurechat_core::{
    add_character, CharacterDraft, CharacterError, ChatSession, Figure, Responder, ResponderError,
    Roster,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Figures,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Name,
    Pdf,
}

/// State of the "create a custom character" popup
#[derive(Debug, Clone, Default)]
pub struct CharacterForm {
    pub name: String,
    pub pdf: String,
    pub field: FormField,
    pub error: Option<String>,
    pub creating: bool,
}

impl CharacterForm {
    pub fn active_field_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Name => &mut self.name,
            FormField::Pdf => &mut self.pdf,
        }
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            FormField::Name => FormField::Pdf,
            FormField::Pdf => FormField::Name,
        };
    }

    fn draft(&self) -> CharacterDraft {
        let pdf = self.pdf.trim();
        let pdf = (!pdf.is_empty()).then(|| PathBuf::from(pdf));
        CharacterDraft::new(&self.name, pdf)
    }
}

/// A character whose PDF upload is still running.
struct CharacterTask {
    draft: CharacterDraft,
    handle: JoinHandle<Result<Option<i64>, ResponderError>>,
}

pub struct App {
    pub should_quit: bool,
    pub focus: Focus,

    // Figure list
    pub roster: Roster,
    pub figure_state: ListState,

    // Conversation
    pub session: ChatSession,
    pub input_cursor: usize, // cursor position in chars
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the chat area, set during render
    pub follow_chat: bool,

    // Popups and status
    pub character_form: Option<CharacterForm>,
    character_task: Option<CharacterTask>,
    pub status: Option<String>,

    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(roster: Roster, responder: Arc<dyn Responder>) -> Self {
        let mut figure_state = ListState::default();
        if !roster.is_empty() {
            figure_state.select(Some(0));
        }

        Self {
            should_quit: false,
            focus: Focus::Figures,
            roster,
            figure_state,
            session: ChatSession::new(responder),
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            follow_chat: true,
            character_form: None,
            character_task: None,
            status: None,
            animation_frame: 0,
        }
    }

    pub fn highlighted_figure(&self) -> Option<&Figure> {
        self.figure_state
            .selected()
            .and_then(|i| self.roster.figures().get(i))
    }

    pub fn figures_nav_down(&mut self) {
        let len = self.roster.len();
        if len > 0 {
            let i = self.figure_state.selected().unwrap_or(0);
            self.figure_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn figures_nav_up(&mut self) {
        let i = self.figure_state.selected().unwrap_or(0);
        self.figure_state.select(Some(i.saturating_sub(1)));
    }

    /// Starts a conversation with the highlighted figure.
    pub fn select_highlighted_figure(&mut self) {
        if let Some(figure) = self.highlighted_figure().cloned() {
            self.start_conversation(figure);
        }
    }

    fn start_conversation(&mut self, figure: Figure) {
        if let Some(i) = self.roster.position(figure.id) {
            self.figure_state.select(Some(i));
        }
        self.session.select_figure(figure);
        self.input_cursor = 0;
        self.chat_scroll = 0;
        self.follow_chat = true;
        self.focus = Focus::Input;
    }

    // Input editing. The draft lives in the session; the cursor lives here.

    pub fn insert_char(&mut self, c: char) {
        let mut text = self.session.pending_input().to_string();
        let byte_pos = char_to_byte_index(&text, self.input_cursor);
        text.insert(byte_pos, c);
        self.session.set_pending_input(text);
        self.input_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            self.remove_char_at_cursor();
        }
    }

    pub fn delete(&mut self) {
        if self.input_cursor < self.session.pending_input().chars().count() {
            self.remove_char_at_cursor();
        }
    }

    fn remove_char_at_cursor(&mut self) {
        let mut text = self.session.pending_input().to_string();
        let byte_pos = char_to_byte_index(&text, self.input_cursor);
        text.remove(byte_pos);
        self.session.set_pending_input(text);
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.session.pending_input().chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.session.pending_input().chars().count();
    }

    /// Sends the draft. Invalid submissions are ignored without feedback.
    pub fn submit_input(&mut self) {
        match self.session.dispatch() {
            Ok(()) => {
                self.input_cursor = 0;
                self.follow_chat = true;
                self.status = None;
            }
            Err(rejection) => log::debug!("submission ignored: {}", rejection),
        }
    }

    /// Picks up a finished reply, if any.
    pub fn poll_reply(&mut self) {
        if self.session.try_resolve().is_some() {
            self.follow_chat = true;
        }
    }

    pub fn tick_animation(&mut self) {
        if self.session.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_up(&mut self) {
        self.follow_chat = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(self.chat_height.max(2) / 2);
    }

    pub fn scroll_chat_down(&mut self) {
        // Render clamps the offset and turns following back on at the bottom
        self.chat_scroll = self.chat_scroll.saturating_add(self.chat_height.max(2) / 2);
    }

    pub fn open_character_form(&mut self) {
        self.character_form = Some(CharacterForm::default());
    }

    pub fn close_character_form(&mut self) {
        self.character_form = None;
    }

    /// Validates the open form and starts uploading its PDF in the
    /// background. Validation errors stay in the form.
    pub fn start_character_creation(&mut self) {
        let Some(form) = self.character_form.as_mut() else {
            return;
        };
        if self.character_task.is_some() {
            return;
        }

        let draft = form.draft();
        let pdf = match draft.validate() {
            Ok((name, pdf)) => {
                log::info!("creating custom character {} from {}", name, pdf.display());
                pdf.to_path_buf()
            }
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };
        form.creating = true;
        form.error = None;

        let responder = Arc::clone(self.session.responder());
        let handle = tokio::spawn(async move { responder.upload_pdf(&pdf).await });
        self.character_task = Some(CharacterTask { draft, handle });
    }

    /// Finishes character creation once the upload has completed: the new
    /// figure joins the roster and its conversation starts. Upload errors
    /// stay in the form.
    pub fn poll_character(&mut self) {
        let Some(task) = self.character_task.as_mut() else {
            return;
        };
        let Some(joined) = (&mut task.handle).now_or_never() else {
            return;
        };
        let Some(task) = self.character_task.take() else {
            return;
        };

        let result = match joined {
            Ok(upload) => upload
                .map_err(CharacterError::from)
                .and_then(|remote_id| add_character(&task.draft, &mut self.roster, remote_id)),
            Err(join_error) => {
                log::error!("upload task failed: {}", join_error);
                Err(CharacterError::Upload(ResponderError::Transport(join_error.to_string())))
            }
        };

        match result {
            Ok(figure) => {
                self.status = Some("Character created successfully!".to_string());
                self.character_form = None;
                self.start_conversation(figure);
            }
            Err(e) => {
                log::warn!("could not create character: {}", e);
                if let Some(form) = self.character_form.as_mut() {
                    form.creating = false;
                    form.error = Some(e.to_string());
                }
            }
        }
    }
}

/// Convert a character index to a byte index in a string
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
