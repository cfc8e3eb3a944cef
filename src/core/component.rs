//! Component and Widget traits, and the per-widget interaction state machine.

use crate::core::cursor::CursorPos;
use crate::core::event::Event;
use crate::core::input::InputEvent;
use crate::core::text::rich::RichText;
use crate::core::theme::Theme;

/// Renderable component interface.
pub trait Component {
    /// Render to a list of lines at most `width` columns wide.
    ///
    /// The number of returned lines is the number of rows used.
    fn render(&mut self, width: usize, theme: &Theme) -> Vec<RichText>;

    /// Cursor position relative to the lines returned from the last `render()`.
    fn cursor_pos(&self) -> Option<CursorPos> {
        None
    }
}

impl<C: Component + ?Sized> Component for Box<C> {
    fn render(&mut self, width: usize, theme: &Theme) -> Vec<RichText> {
        (**self).render(width, theme)
    }

    fn cursor_pos(&self) -> Option<CursorPos> {
        (**self).cursor_pos()
    }
}

/// What a widget wants after handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<V> {
    Continue,
    Confirm(V),
    Cancel,
}

impl<V> Action<V> {
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Action<U> {
        match self {
            Self::Continue => Action::Continue,
            Self::Confirm(value) => Action::Confirm(f(value)),
            Self::Cancel => Action::Cancel,
        }
    }

    pub fn is_done(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// An interactive component that produces a value.
pub trait Widget: Component {
    type Value;

    fn handle_event(&mut self, event: &Event) -> Action<Self::Value>;
}

impl<W: Widget + ?Sized> Widget for Box<W> {
    type Value = W::Value;

    fn handle_event(&mut self, event: &Event) -> Action<Self::Value> {
        (**self).handle_event(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    #[default]
    Idle,
    Focused,
    Confirmed,
    Cancelled,
}

impl WidgetState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }
}

/// Drives one widget through `Idle -> Focused -> Confirmed | Cancelled`.
///
/// [`InputEvent::Interrupt`] cancels from any non-terminal state without
/// consulting the widget. Events after a terminal state are ignored.
#[derive(Debug)]
pub struct Interaction<W> {
    widget: W,
    state: WidgetState,
}

impl<W: Widget> Interaction<W> {
    pub fn new(widget: W) -> Self {
        Self {
            widget,
            state: WidgetState::Idle,
        }
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn into_widget(self) -> W {
        self.widget
    }

    pub fn focus(&mut self) {
        if self.state == WidgetState::Idle {
            self.state = WidgetState::Focused;
        }
    }

    pub fn handle(&mut self, event: &Event) -> Action<W::Value> {
        if self.state.is_terminal() {
            return Action::Continue;
        }
        self.focus();
        let action = match event {
            Event::Input(InputEvent::Interrupt) => Action::Cancel,
            _ => self.widget.handle_event(event),
        };
        match action {
            Action::Confirm(_) => self.state = WidgetState::Confirmed,
            Action::Cancel => self.state = WidgetState::Cancelled,
            Action::Continue => {}
        }
        action
    }
}

impl<W: Widget> Component for Interaction<W> {
    fn render(&mut self, width: usize, theme: &Theme) -> Vec<RichText> {
        self.widget.render(width, theme)
    }

    fn cursor_pos(&self) -> Option<CursorPos> {
        match self.state {
            WidgetState::Idle | WidgetState::Focused => self.widget.cursor_pos(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Component, Interaction, Widget, WidgetState};
    use crate::core::event::Event;
    use crate::core::input::{InputEvent, Key};
    use crate::core::text::rich::RichText;
    use crate::core::theme::Theme;

    /// Confirms with the number of keys seen on Enter; never cancels by itself.
    #[derive(Default)]
    struct Counter {
        keys: usize,
    }

    impl Component for Counter {
        fn render(&mut self, _width: usize, _theme: &Theme) -> Vec<RichText> {
            vec![RichText::plain(self.keys.to_string())]
        }
    }

    impl Widget for Counter {
        type Value = usize;

        fn handle_event(&mut self, event: &Event) -> Action<usize> {
            match event {
                Event::Input(InputEvent::Key(key)) if key.key == Key::Enter => {
                    Action::Confirm(self.keys)
                }
                Event::Input(InputEvent::Key(_)) => {
                    self.keys += 1;
                    Action::Continue
                }
                _ => Action::Continue,
            }
        }
    }

    fn key(k: Key) -> Event {
        Event::Input(InputEvent::key(k))
    }

    #[test]
    fn state_machine_reaches_confirmed() {
        let mut interaction = Interaction::new(Counter::default());
        assert_eq!(interaction.state(), WidgetState::Idle);
        assert_eq!(interaction.handle(&key(Key::Char('a'))), Action::Continue);
        assert_eq!(interaction.state(), WidgetState::Focused);
        assert_eq!(interaction.handle(&key(Key::Enter)), Action::Confirm(1));
        assert_eq!(interaction.state(), WidgetState::Confirmed);
        assert_eq!(interaction.handle(&key(Key::Enter)), Action::Continue);
    }

    #[test]
    fn interrupt_always_cancels() {
        let mut interaction = Interaction::new(Counter::default());
        assert_eq!(
            interaction.handle(&Event::Input(InputEvent::Interrupt)),
            Action::Cancel
        );
        assert_eq!(interaction.state(), WidgetState::Cancelled);
        assert_eq!(interaction.widget().keys, 0);
    }

    #[test]
    fn action_map() {
        assert_eq!(Action::Confirm(2).map(|v| v * 2), Action::Confirm(4));
        assert_eq!(Action::<u8>::Cancel.map(|v| v), Action::Cancel);
        assert!(!Action::<u8>::Continue.is_done());
    }
}
