//! Paragraph: static wrapped text.

use crate::core::component::Component;
use crate::core::text::rich::RichText;
use crate::core::text::wrap::WrapOptions;
use crate::core::theme::Theme;

/// Wrapped text with an optional themed decoration in front of the first line.
///
/// Continuation lines are indented to line up with the text after the decoration.
#[derive(Debug, Clone)]
pub struct Paragraph {
    text: RichText,
    style_path: Option<String>,
    decoration: Option<String>,
    cached: Option<(usize, Vec<RichText>)>,
}

impl Paragraph {
    pub fn new(text: impl Into<RichText>) -> Self {
        Self {
            text: text.into(),
            style_path: None,
            decoration: None,
            cached: None,
        }
    }

    /// Theme path merged under the text's own styles, e.g. `msg/text:heading`.
    pub fn style_path(mut self, path: impl Into<String>) -> Self {
        self.style_path = Some(path.into());
        self
    }

    /// Theme decoration name, e.g. `question`; styled with `msg/decoration:<name>`.
    pub fn decoration(mut self, name: impl Into<String>) -> Self {
        self.decoration = Some(name.into());
        self
    }

    pub fn set_text(&mut self, text: impl Into<RichText>) {
        self.text = text.into();
        self.cached = None;
    }

    pub fn text(&self) -> &RichText {
        &self.text
    }
}

impl Component for Paragraph {
    fn render(&mut self, width: usize, theme: &Theme) -> Vec<RichText> {
        if let Some((cached_width, lines)) = &self.cached {
            if *cached_width == width {
                return lines.clone();
            }
        }

        let text = match &self.style_path {
            Some(path) => self.text.with_base_style(theme.resolve(path)),
            None => self.text.clone(),
        };
        let mut options = WrapOptions::new(width);
        if let Some(name) = &self.decoration {
            let symbol = theme.decoration(name);
            let style = theme.resolve(&format!("msg/decoration:{name}"));
            let indent = " ".repeat(RichText::plain(symbol).width());
            options = options
                .indent(RichText::styled(symbol, style))
                .continuation_indent(indent);
        }
        let lines = text.wrap(&options);
        self.cached = Some((width, lines.clone()));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::Paragraph;
    use crate::core::capabilities::TerminalCapabilities;
    use crate::core::component::Component;
    use crate::core::style::Attr;
    use crate::core::theme::Theme;

    #[test]
    fn wraps_with_decoration_indent() {
        let theme = Theme::for_capabilities(&TerminalCapabilities::plain());
        let mut paragraph = Paragraph::new("one two three four").decoration("heading");
        let lines: Vec<String> = paragraph
            .render(11, &theme)
            .iter()
            .map(|l| l.plain_text())
            .collect();
        assert_eq!(lines, vec!["# one two", "  three", "  four"]);
    }

    #[test]
    fn style_path_applies_and_cache_follows_width() {
        let theme = Theme::for_capabilities(&TerminalCapabilities::plain());
        let mut paragraph = Paragraph::new("hello world").style_path("msg/text:heading");
        let lines = paragraph.render(80, &theme);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].spans()[0].style().has(Attr::Bold));
        assert_eq!(paragraph.render(5, &theme).len(), 2);
    }
}
