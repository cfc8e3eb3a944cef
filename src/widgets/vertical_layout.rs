//! VerticalLayout: static components stacked around one interactive child.

use crate::core::component::{Action, Component, Widget};
use crate::core::cursor::CursorPos;
use crate::core::event::Event;
use crate::core::text::rich::RichText;
use crate::core::theme::Theme;

/// Renders `above`, then the child, then `below`; events go to the child only.
pub struct VerticalLayout<W> {
    above: Vec<Box<dyn Component>>,
    child: W,
    below: Vec<Box<dyn Component>>,
    child_row: usize,
}

impl<W: Widget> VerticalLayout<W> {
    pub fn new(child: W) -> Self {
        Self {
            above: Vec::new(),
            child,
            below: Vec::new(),
            child_row: 0,
        }
    }

    pub fn above(mut self, component: impl Component + 'static) -> Self {
        self.above.push(Box::new(component));
        self
    }

    pub fn below(mut self, component: impl Component + 'static) -> Self {
        self.below.push(Box::new(component));
        self
    }

    pub fn child(&self) -> &W {
        &self.child
    }

    pub fn child_mut(&mut self) -> &mut W {
        &mut self.child
    }

    pub fn into_child(self) -> W {
        self.child
    }
}

impl<W: Widget> Component for VerticalLayout<W> {
    fn render(&mut self, width: usize, theme: &Theme) -> Vec<RichText> {
        let mut lines = Vec::new();
        for component in self.above.iter_mut() {
            lines.extend(component.render(width, theme));
        }
        self.child_row = lines.len();
        lines.extend(self.child.render(width, theme));
        for component in self.below.iter_mut() {
            lines.extend(component.render(width, theme));
        }
        lines
    }

    fn cursor_pos(&self) -> Option<CursorPos> {
        self.child
            .cursor_pos()
            .map(|pos| pos.shifted_down(self.child_row))
    }
}

impl<W: Widget> Widget for VerticalLayout<W> {
    type Value = W::Value;

    fn handle_event(&mut self, event: &Event) -> Action<W::Value> {
        self.child.handle_event(event)
    }
}
