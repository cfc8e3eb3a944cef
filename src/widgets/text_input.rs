//! Single-line text input widget.

use crate::core::component::{Action, Component, Widget};
use crate::core::cursor::CursorPos;
use crate::core::event::Event;
use crate::core::input::{InputEvent, Key, KeyEvent};
use crate::core::text::rich::RichText;
use crate::core::text::utils::{
    grapheme_segments, next_grapheme_len, next_word_boundary, previous_grapheme_len,
    previous_word_boundary,
};
use crate::core::text::width::grapheme_width;
use crate::core::theme::Theme;

const SECRET_MASK: &str = "*";

/// Single-line editor with horizontal scrolling.
///
/// Enter confirms the current value, Escape cancels.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    /// Byte offset into `value`, always on a grapheme boundary.
    cursor: usize,
    prompt: String,
    placeholder: String,
    default_value: Option<String>,
    secret: bool,
    allow_empty: bool,
    error: Option<String>,
    /// Grapheme index of the first visible grapheme.
    scroll: usize,
    last_cursor_pos: Option<CursorPos>,
}

impl TextInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            allow_empty: true,
            ..Self::default()
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Value confirmed when Enter is pressed on an empty input.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Masks every grapheme when rendering.
    pub fn secret(mut self, secret: bool) -> Self {
        self.secret = secret;
        self
    }

    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.len();
    }

    /// Cursor offset in bytes.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.value.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn delete_range(&mut self, start: usize, end: usize) {
        if start < end {
            self.value.replace_range(start..end, "");
            self.cursor = start;
        }
    }

    fn submit(&mut self) -> Action<String> {
        if self.value.is_empty() {
            if let Some(default) = &self.default_value {
                return Action::Confirm(default.clone());
            }
            if !self.allow_empty {
                self.error = Some("Input should not be empty".to_string());
                return Action::Continue;
            }
        }
        Action::Confirm(self.value.clone())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action<String> {
        if let Some(ch) = key.text() {
            let mut buf = [0u8; 4];
            self.insert_text(ch.encode_utf8(&mut buf));
            return Action::Continue;
        }

        let cursor = self.cursor;
        match (key.key, key.ctrl, key.alt) {
            (Key::Enter, false, false) => return self.submit(),
            (Key::Escape, _, _) => return Action::Cancel,
            (Key::Backspace, false, false) | (Key::Char('h'), true, false) => {
                let len = previous_grapheme_len(&self.value, cursor);
                self.delete_range(cursor - len, cursor);
            }
            (Key::Delete, false, false) | (Key::Char('d'), true, false) => {
                let len = next_grapheme_len(&self.value, cursor);
                self.delete_range(cursor, cursor + len);
            }
            (Key::Char('w'), true, false) | (Key::Backspace, false, true) => {
                let start = previous_word_boundary(&self.value, cursor);
                self.delete_range(start, cursor);
            }
            (Key::Char('d'), false, true) | (Key::Delete, true, false) => {
                let end = next_word_boundary(&self.value, cursor);
                self.delete_range(cursor, end);
            }
            (Key::Char('u'), true, false) => self.delete_range(0, cursor),
            (Key::Char('k'), true, false) => self.value.truncate(cursor),
            (Key::Left, false, false) | (Key::Char('b'), true, false) => {
                self.cursor -= previous_grapheme_len(&self.value, cursor);
            }
            (Key::Right, false, false) | (Key::Char('f'), true, false) => {
                self.cursor += next_grapheme_len(&self.value, cursor);
            }
            (Key::Left, true, false) | (Key::Left, false, true) | (Key::Char('b'), false, true) => {
                self.cursor = previous_word_boundary(&self.value, cursor);
            }
            (Key::Right, true, false)
            | (Key::Right, false, true)
            | (Key::Char('f'), false, true) => {
                self.cursor = next_word_boundary(&self.value, cursor);
            }
            (Key::Home, _, _) | (Key::Char('a'), true, false) => self.cursor = 0,
            (Key::End, _, _) | (Key::Char('e'), true, false) => self.cursor = self.value.len(),
            _ => {}
        }
        Action::Continue
    }
}

/// Graphemes as displayed, with their widths.
fn display_graphemes(value: &str, secret: bool) -> Vec<(&str, usize)> {
    grapheme_segments(value)
        .map(|g| {
            if secret {
                (SECRET_MASK, 1)
            } else {
                (g, grapheme_width(g))
            }
        })
        .collect()
}

impl Component for TextInput {
    fn render(&mut self, width: usize, theme: &Theme) -> Vec<RichText> {
        let decoration = theme.decoration("input");
        let mut line = RichText::styled(decoration, theme.resolve("input/decoration"));
        if !self.prompt.is_empty() {
            line = line.push(format!("{} ", self.prompt), theme.resolve("msg/text:question"));
        }
        let prefix_width = line.width();
        // One column is kept free for the cursor at the end of the value.
        let available = width.saturating_sub(prefix_width + 1);

        let graphemes = display_graphemes(&self.value, self.secret);
        let cursor_index = grapheme_segments(&self.value[..self.cursor]).count();

        if cursor_index < self.scroll {
            self.scroll = cursor_index;
        }
        while self.scroll < cursor_index
            && graphemes[self.scroll..cursor_index]
                .iter()
                .map(|(_, w)| w)
                .sum::<usize>()
                > available
        {
            self.scroll += 1;
        }

        if self.value.is_empty() && !self.placeholder.is_empty() {
            let placeholder =
                RichText::styled(self.placeholder.as_str(), theme.resolve("input/placeholder"));
            line = line + placeholder.truncate(available, "");
        } else {
            let mut visible = String::new();
            let mut used = 0;
            for (g, w) in &graphemes[self.scroll..] {
                if used + w > available {
                    break;
                }
                visible.push_str(g);
                used += w;
            }
            line = line.push(visible, theme.resolve("input/text"));
        }

        let cursor_col = prefix_width
            + graphemes[self.scroll..cursor_index]
                .iter()
                .map(|(_, w)| w)
                .sum::<usize>();
        self.last_cursor_pos = Some(CursorPos::new(0, cursor_col));

        let mut lines = vec![line];
        if let Some(error) = &self.error {
            lines.push(
                RichText::styled(error.as_str(), theme.resolve("msg/text:error")).truncate(width, "…"),
            );
        }
        lines
    }

    fn cursor_pos(&self) -> Option<CursorPos> {
        self.last_cursor_pos
    }
}

impl Widget for TextInput {
    type Value = String;

    fn handle_event(&mut self, event: &Event) -> Action<String> {
        let Event::Input(input) = event else {
            return Action::Continue;
        };
        let action = match input {
            InputEvent::Key(key) => self.handle_key(*key),
            InputEvent::Paste(text) => {
                let cleaned = text.replace(['\r', '\n'], "");
                self.insert_text(&cleaned);
                Action::Continue
            }
            InputEvent::Interrupt => Action::Cancel,
            InputEvent::Resize { .. } | InputEvent::Unknown(_) => Action::Continue,
        };
        if matches!(action, Action::Continue) && !matches!(input, InputEvent::Key(k) if k.key == Key::Enter)
        {
            self.error = None;
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::TextInput;
    use crate::core::component::{Action, Component, Widget};
    use crate::core::cursor::CursorPos;
    use crate::core::event::Event;
    use crate::core::input::{InputEvent, Key, KeyEvent};
    use crate::core::theme::Theme;

    fn press(input: &mut TextInput, key: KeyEvent) -> Action<String> {
        input.handle_event(&Event::Input(InputEvent::Key(key)))
    }

    fn type_str(input: &mut TextInput, text: &str) {
        for ch in text.chars() {
            press(input, KeyEvent::plain(Key::Char(ch)));
        }
    }

    #[test]
    fn typing_and_confirm() {
        let mut input = TextInput::new("");
        type_str(&mut input, "héllo");
        assert_eq!(input.value(), "héllo");
        assert_eq!(
            press(&mut input, KeyEvent::plain(Key::Enter)),
            Action::Confirm("héllo".to_string())
        );
    }

    #[test]
    fn escape_cancels() {
        let mut input = TextInput::new("");
        assert_eq!(press(&mut input, KeyEvent::plain(Key::Escape)), Action::Cancel);
    }

    #[test]
    fn editing_keys() {
        let mut input = TextInput::new("");
        type_str(&mut input, "git commit --amend");
        press(&mut input, KeyEvent::ctrl(Key::Char('w')));
        assert_eq!(input.value(), "git commit --");
        press(&mut input, KeyEvent::ctrl(Key::Char('w')));
        assert_eq!(input.value(), "git commit ");
        press(&mut input, KeyEvent::alt(Key::Char('b')));
        assert_eq!(input.cursor(), 4);
        press(&mut input, KeyEvent::ctrl(Key::Char('k')));
        assert_eq!(input.value(), "git ");
        press(&mut input, KeyEvent::plain(Key::Left));
        press(&mut input, KeyEvent::ctrl(Key::Char('u')));
        assert_eq!(input.value(), " ");
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut input = TextInput::new("");
        input.set_value("ae\u{0301}");
        press(&mut input, KeyEvent::plain(Key::Backspace));
        assert_eq!(input.value(), "a");
    }

    #[test]
    fn paste_drops_newlines() {
        let mut input = TextInput::new("");
        input.handle_event(&Event::Input(InputEvent::Paste("a\nb\r\n".to_string())));
        assert_eq!(input.value(), "ab");
    }

    #[test]
    fn default_and_empty_handling() {
        let mut input = TextInput::new("").default_value("main");
        assert_eq!(
            press(&mut input, KeyEvent::plain(Key::Enter)),
            Action::Confirm("main".to_string())
        );

        let mut strict = TextInput::new("").allow_empty(false);
        assert_eq!(press(&mut strict, KeyEvent::plain(Key::Enter)), Action::Continue);
        assert_eq!(strict.render(40, &Theme::empty()).len(), 2);
        type_str(&mut strict, "x");
        assert_eq!(strict.render(40, &Theme::empty()).len(), 1);
    }

    #[test]
    fn render_scrolls_to_keep_cursor_visible() {
        let theme = Theme::empty();
        let mut input = TextInput::new("");
        input.set_value("abcdefghij");
        let lines = input.render(6, &theme);
        // Five columns for text, one reserved for the cursor.
        assert_eq!(lines[0].plain_text(), "fghij");
        assert_eq!(input.cursor_pos(), Some(CursorPos::new(0, 5)));

        press(&mut input, KeyEvent::plain(Key::Home));
        let lines = input.render(6, &theme);
        assert_eq!(lines[0].plain_text(), "abcde");
        assert_eq!(input.cursor_pos(), Some(CursorPos::new(0, 0)));
    }

    #[test]
    fn secret_and_placeholder() {
        let theme = Theme::empty();
        let mut input = TextInput::new("Password").secret(true).placeholder("hidden");
        assert_eq!(input.render(40, &theme)[0].plain_text(), "Password hidden");
        type_str(&mut input, "pw");
        assert_eq!(input.render(40, &theme)[0].plain_text(), "Password **");
        assert_eq!(input.cursor_pos(), Some(CursorPos::new(0, 11)));
    }
}
