use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Minimal single-line editor for command-mode input: search text and
/// staged cell values. Holds a prompt, the current text and a cursor;
/// Enter finishes, Esc cancels.
#[derive(Default)]
pub struct Inputter {
    prompt: String,
    current_input: String,
    cursor_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone)]
pub struct InputResult {
    pub prompt: String,
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor_pos: usize,
}

impl Inputter {
    /// Reset and start a new input round, optionally pre-filled (cell
    /// editing starts from the staged value).
    pub fn start(&mut self, prompt: &str, initial: &str) {
        self.prompt = prompt.to_string();
        self.current_input = initial.to_string();
        self.cursor_pos = initial.chars().count();
        self.finished = false;
        self.canceled = false;
    }

    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.finished = true,
            (KeyCode::Esc, KeyModifiers::NONE) => {
                self.canceled = true;
                self.finished = true;
            }
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Left, KeyModifiers::NONE) => {
                self.cursor_pos = self.cursor_pos.saturating_sub(1)
            }
            (KeyCode::Right, KeyModifiers::NONE) => {
                if self.cursor_pos < self.current_input.chars().count() {
                    self.cursor_pos += 1;
                }
            }
            (code, _) => self.insert(code),
        }
        self.get()
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            prompt: self.prompt.clone(),
            input: self.current_input.clone(),
            finished: self.finished,
            canceled: self.canceled,
            cursor_pos: self.cursor_pos,
        }
    }

    fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let pos = self.byte_pos();
            self.current_input.remove(pos);
        }
    }

    fn insert(&mut self, code: KeyCode) {
        if let Some(chr) = code.as_char() {
            let pos = self.byte_pos();
            self.current_input.insert(pos, chr);
            self.cursor_pos += 1;
        }
    }

    fn byte_pos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
