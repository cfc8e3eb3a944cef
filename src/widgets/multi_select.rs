//! MultiSelect widget: toggle any number of options.

use crate::core::component::{Action, Component, Widget};
use crate::core::cursor::CursorPos;
use crate::core::event::Event;
use crate::core::input::{InputEvent, Key};
use crate::core::text::rich::RichText;
use crate::core::theme::Theme;

use super::choice_list::{render_row, Choice, ListState};

/// Space toggles the highlighted option, Ctrl-A toggles every visible one and
/// Enter confirms the selected indices in ascending order.
#[derive(Debug, Clone)]
pub struct MultiSelect {
    choices: Vec<Choice>,
    checked: Vec<bool>,
    state: ListState,
    min_selected: usize,
    error: Option<String>,
    cursor: Option<CursorPos>,
}

impl MultiSelect {
    pub fn new<I, C>(choices: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Choice>,
    {
        let choices: Vec<Choice> = choices.into_iter().map(Into::into).collect();
        let state = ListState::new(choices.iter().map(|c| c.label.as_str()), 8);
        Self {
            checked: vec![false; choices.len()],
            choices,
            state,
            min_selected: 0,
            error: None,
            cursor: None,
        }
    }

    pub fn max_visible(mut self, rows: usize) -> Self {
        self.state = ListState::new(self.choices.iter().map(|c| c.label.as_str()), rows);
        self
    }

    pub fn checked(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        for index in indices {
            if let Some(slot) = self.checked.get_mut(index) {
                *slot = true;
            }
        }
        self
    }

    /// Enter is refused until at least `count` options are selected.
    pub fn min_selected(mut self, count: usize) -> Self {
        self.min_selected = count;
        self
    }

    pub fn selection(&self) -> Vec<usize> {
        self.checked
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn current(&self) -> Option<usize> {
        self.state.current()
    }

    fn toggle_current(&mut self) {
        if let Some(index) = self.state.current() {
            self.checked[index] = !self.checked[index];
        }
    }

    /// Checks every visible option, or unchecks them all if they already are.
    fn toggle_all(&mut self) {
        let visible = self.state.filtered();
        let all_on = visible.iter().all(|&i| self.checked[i]);
        for &i in visible {
            self.checked[i] = !all_on;
        }
    }
}

impl Component for MultiSelect {
    fn render(&mut self, width: usize, theme: &Theme) -> Vec<RichText> {
        let selected = self.state.selected_position();
        let rows = self
            .state
            .window()
            .map(|pos| {
                let index = self.state.filtered()[pos];
                let choice = &self.choices[index];
                let active = pos == selected;
                let pointer = if active { "choice/active" } else { "choice/inactive" };
                let checkbox = if self.checked[index] {
                    "checkbox/on"
                } else {
                    "checkbox/off"
                };
                let label_path = match (active, self.checked[index]) {
                    (true, _) => "menu/text:choice/active",
                    (false, true) => "menu/text:choice/selected",
                    (false, false) => "menu/text:choice/inactive",
                };
                let decoration_style = theme.resolve("menu/decoration");
                let decoration = RichText::styled(theme.decoration(pointer), decoration_style)
                    .push(theme.decoration(checkbox), decoration_style);
                render_row(
                    decoration,
                    &choice.label,
                    theme.resolve(label_path),
                    choice.description.as_deref(),
                    width,
                    theme,
                )
            })
            .collect();
        let (mut lines, cursor) = self.state.decorate(rows, width, theme);
        if let Some(error) = &self.error {
            lines.push(RichText::styled(error.as_str(), theme.resolve("msg/text:error")).truncate(width, "…"));
        }
        self.cursor = cursor;
        lines
    }

    fn cursor_pos(&self) -> Option<CursorPos> {
        self.cursor
    }
}

impl Widget for MultiSelect {
    type Value = Vec<usize>;

    fn handle_event(&mut self, event: &Event) -> Action<Vec<usize>> {
        let Event::Input(input) = event else {
            return Action::Continue;
        };
        let InputEvent::Key(key) = input else {
            return match input {
                InputEvent::Interrupt => Action::Cancel,
                _ => Action::Continue,
            };
        };
        self.error = None;
        match (key.key, key.ctrl, key.alt) {
            (Key::Enter, false, false) => {
                let selection = self.selection();
                if selection.len() < self.min_selected {
                    self.error = Some(format!(
                        "Select at least {} option{}",
                        self.min_selected,
                        if self.min_selected == 1 { "" } else { "s" }
                    ));
                    return Action::Continue;
                }
                Action::Confirm(selection)
            }
            (Key::Escape, _, _) => {
                if self.state.clear_filter() {
                    Action::Continue
                } else {
                    Action::Cancel
                }
            }
            (Key::Char(' '), false, false) => {
                self.toggle_current();
                Action::Continue
            }
            (Key::Char('a'), true, false) => {
                self.toggle_all();
                Action::Continue
            }
            _ => {
                self.state.handle_key(key);
                Action::Continue
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MultiSelect;
    use crate::core::component::{Action, Component, Widget};
    use crate::core::event::Event;
    use crate::core::input::{InputEvent, Key, KeyEvent};
    use crate::core::theme::Theme;

    fn key(widget: &mut MultiSelect, key: KeyEvent) -> Action<Vec<usize>> {
        widget.handle_event(&Event::Input(InputEvent::Key(key)))
    }

    #[test]
    fn space_toggles_and_enter_returns_sorted_indices() {
        let mut select = MultiSelect::new(["a", "b", "c"]);
        key(&mut select, KeyEvent::plain(Key::Up));
        key(&mut select, KeyEvent::plain(Key::Char(' ')));
        key(&mut select, KeyEvent::plain(Key::Home));
        key(&mut select, KeyEvent::plain(Key::Char(' ')));
        assert_eq!(
            key(&mut select, KeyEvent::plain(Key::Enter)),
            Action::Confirm(vec![0, 2])
        );
    }

    #[test]
    fn ctrl_a_toggles_all_visible() {
        let mut select = MultiSelect::new(["x", "y", "z"]).checked([1]);
        key(&mut select, KeyEvent::ctrl(Key::Char('a')));
        assert_eq!(select.selection(), vec![0, 1, 2]);
        key(&mut select, KeyEvent::ctrl(Key::Char('a')));
        assert!(select.selection().is_empty());
    }

    #[test]
    fn minimum_selection_is_enforced() {
        let mut select = MultiSelect::new(["x", "y"]).min_selected(1);
        assert_eq!(key(&mut select, KeyEvent::plain(Key::Enter)), Action::Continue);
        let lines = select.render(40, &Theme::empty());
        assert_eq!(lines.last().map(|l| l.plain_text()), Some("Select at least 1 option".to_string()));
        key(&mut select, KeyEvent::plain(Key::Char(' ')));
        assert_eq!(
            key(&mut select, KeyEvent::plain(Key::Enter)),
            Action::Confirm(vec![0])
        );
    }

    #[test]
    fn checkbox_decorations_follow_state() {
        let caps = crate::core::capabilities::TerminalCapabilities::plain();
        let theme = Theme::for_capabilities(&caps);
        let mut select = MultiSelect::new(["x", "y"]).checked([1]);
        let lines: Vec<String> = select
            .render(40, &theme)
            .iter()
            .map(|l| l.plain_text())
            .collect();
        assert_eq!(lines, vec!["> [ ] x", "  [x] y"]);
    }
}
