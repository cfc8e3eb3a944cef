//! ChoiceList widget: pick one option from a filtered, scrolling list.

use std::ops::Range;

use crate::core::component::{Action, Component, Widget};
use crate::core::cursor::CursorPos;
use crate::core::event::Event;
use crate::core::input::{InputEvent, Key, KeyEvent};
use crate::core::style::Style;
use crate::core::text::rich::RichText;
use crate::core::theme::Theme;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub description: Option<String>,
}

impl Choice {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(normalize_to_single_line(&description.into()));
        self
    }
}

impl From<&str> for Choice {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

fn normalize_to_single_line(text: &str) -> String {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Selection, filtering and scrolling shared by the list widgets.
#[derive(Debug, Clone)]
pub(crate) struct ListState {
    keys: Vec<String>,
    filtered: Vec<usize>,
    selected: usize,
    filter: String,
    filterable: bool,
    max_visible: usize,
}

impl ListState {
    pub(crate) fn new<'a>(labels: impl Iterator<Item = &'a str>, max_visible: usize) -> Self {
        let keys: Vec<String> = labels.map(str::to_lowercase).collect();
        Self {
            filtered: (0..keys.len()).collect(),
            keys,
            selected: 0,
            filter: String::new(),
            filterable: true,
            max_visible: max_visible.max(1),
        }
    }

    pub(crate) fn set_filterable(&mut self, filterable: bool) {
        self.filterable = filterable;
    }

    pub(crate) fn filter(&self) -> &str {
        &self.filter
    }

    pub(crate) fn filtered(&self) -> &[usize] {
        &self.filtered
    }

    /// Original index of the highlighted item.
    pub(crate) fn current(&self) -> Option<usize> {
        self.filtered.get(self.selected).copied()
    }

    pub(crate) fn selected_position(&self) -> usize {
        self.selected
    }

    pub(crate) fn select_original(&mut self, index: usize) {
        if let Some(pos) = self.filtered.iter().position(|&i| i == index) {
            self.selected = pos;
        }
    }

    fn set_filter(&mut self, filter: String) {
        let current = self.current();
        let needle = filter.to_lowercase();
        self.filtered = self
            .keys
            .iter()
            .enumerate()
            .filter(|(_, key)| key.contains(&needle))
            .map(|(i, _)| i)
            .collect();
        self.filter = filter;
        self.selected = 0;
        if let Some(index) = current {
            self.select_original(index);
        }
    }

    fn step(&mut self, forward: bool) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        self.selected = if forward {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
    }

    fn page(&mut self, forward: bool) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        self.selected = if forward {
            (self.selected + self.max_visible).min(len - 1)
        } else {
            self.selected.saturating_sub(self.max_visible)
        };
    }

    /// Handles navigation and filter keys; returns whether the key was used.
    pub(crate) fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match (key.key, key.ctrl, key.alt) {
            (Key::Up, false, false) | (Key::BackTab, _, _) | (Key::Char('p'), true, false) => {
                self.step(false)
            }
            (Key::Down, false, false) | (Key::Tab, false, false) | (Key::Char('n'), true, false) => {
                self.step(true)
            }
            (Key::PageUp, _, _) => self.page(false),
            (Key::PageDown, _, _) => self.page(true),
            (Key::Home, _, _) => self.selected = 0,
            (Key::End, _, _) => self.selected = self.filtered.len().saturating_sub(1),
            (Key::Backspace, false, false) if self.filterable && !self.filter.is_empty() => {
                let mut filter = self.filter.clone();
                filter.pop();
                self.set_filter(filter);
            }
            (Key::Char('u'), true, false) if self.filterable => self.set_filter(String::new()),
            (Key::Char(ch), false, false) if self.filterable && ch != ' ' => {
                let mut filter = self.filter.clone();
                filter.push(ch);
                self.set_filter(filter);
            }
            _ => return false,
        }
        true
    }

    /// Escape clears a non-empty filter; returns whether it did.
    pub(crate) fn clear_filter(&mut self) -> bool {
        if self.filter.is_empty() {
            return false;
        }
        self.set_filter(String::new());
        true
    }

    /// Positions in `filtered` to show, keeping the selection centered.
    pub(crate) fn window(&self) -> Range<usize> {
        let len = self.filtered.len();
        let visible = self.max_visible.min(len);
        let start = if len <= visible {
            0
        } else {
            self.selected.saturating_sub(visible / 2).min(len - visible)
        };
        start..start + visible
    }

    /// Filter prompt and scroll footer around item rows.
    pub(crate) fn decorate(
        &self,
        rows: Vec<RichText>,
        width: usize,
        theme: &Theme,
    ) -> (Vec<RichText>, Option<CursorPos>) {
        let mut lines = Vec::new();
        let mut cursor = None;
        if self.filterable && !self.filter.is_empty() {
            let line = RichText::styled(theme.decoration("input"), theme.resolve("input/decoration"))
                .push(self.filter.as_str(), theme.resolve("input/text"));
            let col = line.width().min(width.saturating_sub(1));
            cursor = Some(CursorPos::new(0, col));
            lines.push(line.truncate(width, "…"));
        }

        if self.filtered.is_empty() {
            lines.push(RichText::styled("  No matching options", theme.resolve("msg/text:hint")));
            return (lines, cursor);
        }

        lines.extend(rows);
        let window = self.window();
        if window.start > 0 || window.end < self.filtered.len() {
            let info = format!("  ({}/{})", self.selected + 1, self.filtered.len());
            lines.push(RichText::styled(info, theme.resolve("msg/text:hint")).truncate(width, ""));
        }
        (lines, cursor)
    }
}

/// Renders one option row: decoration, label, then a dimmed description.
pub(crate) fn render_row(
    decoration: RichText,
    label: &str,
    label_style: Style,
    description: Option<&str>,
    width: usize,
    theme: &Theme,
) -> RichText {
    let mut line = decoration.push(label, label_style);
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        let remaining = width.saturating_sub(line.width() + 2);
        if remaining > 10 {
            line = line.push("  ", Style::new()).append(
                &RichText::styled(description, theme.resolve("menu/description"))
                    .truncate(remaining, "…"),
            );
        }
    }
    line.truncate(width, "…")
}

/// Pick one of several options; confirms with the chosen option's index.
#[derive(Debug, Clone)]
pub struct ChoiceList {
    choices: Vec<Choice>,
    state: ListState,
    cursor: Option<CursorPos>,
}

impl ChoiceList {
    pub fn new<I, C>(choices: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Choice>,
    {
        let choices: Vec<Choice> = choices.into_iter().map(Into::into).collect();
        let state = ListState::new(choices.iter().map(|c| c.label.as_str()), 8);
        Self {
            choices,
            state,
            cursor: None,
        }
    }

    /// Rows of options shown at once.
    pub fn max_visible(mut self, rows: usize) -> Self {
        let mut state = ListState::new(self.choices.iter().map(|c| c.label.as_str()), rows);
        state.set_filterable(self.state.filterable);
        self.state = state;
        self
    }

    /// Whether typing filters the list (on by default).
    pub fn filterable(mut self, filterable: bool) -> Self {
        self.state.set_filterable(filterable);
        self
    }

    pub fn selected(mut self, index: usize) -> Self {
        self.state.select_original(index);
        self
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Index of the highlighted choice.
    pub fn current(&self) -> Option<usize> {
        self.state.current()
    }

    pub fn filter(&self) -> &str {
        self.state.filter()
    }
}

impl Component for ChoiceList {
    fn render(&mut self, width: usize, theme: &Theme) -> Vec<RichText> {
        let selected = self.state.selected_position();
        let rows = self
            .state
            .window()
            .map(|pos| {
                let index = self.state.filtered()[pos];
                let choice = &self.choices[index];
                let (decoration, label_style) = if pos == selected {
                    ("choice/active", theme.resolve("menu/text:choice/active"))
                } else {
                    ("choice/inactive", theme.resolve("menu/text:choice/inactive"))
                };
                let decoration =
                    RichText::styled(theme.decoration(decoration), theme.resolve("menu/decoration"));
                render_row(
                    decoration,
                    &choice.label,
                    label_style,
                    choice.description.as_deref(),
                    width,
                    theme,
                )
            })
            .collect();
        let (lines, cursor) = self.state.decorate(rows, width, theme);
        self.cursor = cursor;
        lines
    }

    fn cursor_pos(&self) -> Option<CursorPos> {
        self.cursor
    }
}

impl Widget for ChoiceList {
    type Value = usize;

    fn handle_event(&mut self, event: &Event) -> Action<usize> {
        let Event::Input(input) = event else {
            return Action::Continue;
        };
        match input {
            InputEvent::Interrupt => Action::Cancel,
            InputEvent::Key(key) if key.key == Key::Enter && !key.ctrl => match self.current() {
                Some(index) => Action::Confirm(index),
                None => Action::Continue,
            },
            InputEvent::Key(key) if key.key == Key::Escape => {
                if self.state.clear_filter() {
                    Action::Continue
                } else {
                    Action::Cancel
                }
            }
            InputEvent::Key(key) => {
                self.state.handle_key(key);
                Action::Continue
            }
            _ => Action::Continue,
        }
    }
}
