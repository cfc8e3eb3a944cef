//! Converts [`RichText`] into bytes for a device with given capabilities.
//!
//! Colors are degraded to the device's tier; with [`ColorTier::None`] no escape
//! sequence of any kind is emitted. Control characters are painted as spaces so
//! text can never move the cursor behind the renderer's back.

use crate::core::capabilities::{ColorTier, TerminalCapabilities};
use crate::core::style::Style;
use crate::core::text::rich::RichText;

const RESET: &str = "\x1b[0m";
const LINK_CLOSE: &str = "\x1b]8;;\x1b\\";

/// Paints one line. Newlines are painted as spaces; split with [`RichText::lines`] first.
///
/// Only `color_tier` and `hyperlinks` decide what is emitted; `is_tty` is not
/// consulted. Detection already maps a non-tty to [`ColorTier::None`] unless
/// color was forced, and a forced tier is painted on a pipe too.
pub fn paint_line(text: &RichText, caps: &TerminalCapabilities) -> String {
    let tier = caps.color_tier;
    let mut out = String::new();
    let mut current = Style::new();
    let mut open_link: Option<&str> = None;

    for span in text.spans() {
        if tier != ColorTier::None && span.style() != current {
            if span.style().is_plain() {
                out.push_str(RESET);
            } else {
                out.push_str(&span.style().to_sgr(tier));
            }
            current = span.style();
        }

        let link = if caps.hyperlinks { span.link() } else { None };
        if link != open_link {
            if open_link.is_some() {
                out.push_str(LINK_CLOSE);
            }
            if let Some(url) = link {
                out.push_str("\x1b]8;;");
                out.push_str(url);
                out.push_str("\x1b\\");
            }
            open_link = link;
        }

        for ch in span.text().chars() {
            out.push(if ch.is_control() { ' ' } else { ch });
        }
    }

    if open_link.is_some() {
        out.push_str(LINK_CLOSE);
    }
    if !current.is_plain() {
        out.push_str(RESET);
    }
    out
}

/// Paints multi-line text with `\r\n` separators.
pub fn paint(text: &RichText, caps: &TerminalCapabilities) -> String {
    text.lines()
        .iter()
        .map(|line| paint_line(line, caps))
        .collect::<Vec<_>>()
        .join("\r\n")
}

#[cfg(test)]
mod tests {
    use super::{paint, paint_line};
    use crate::config::EnvSnapshot;
    use crate::core::capabilities::{ColorOverride, ColorTier, TerminalCapabilities};
    use crate::core::style::{Color, Style};
    use crate::core::text::rich::RichText;

    fn caps(tier: ColorTier) -> TerminalCapabilities {
        TerminalCapabilities {
            color_tier: tier,
            unicode: true,
            hyperlinks: false,
            is_tty: true,
        }
    }

    #[test]
    fn non_tty_paint_has_no_escapes() {
        let env = EnvSnapshot::from_pairs([("TERM", "xterm-256color"), ("COLORTERM", "truecolor")]);
        let detected = TerminalCapabilities::detect_with(&env, false, ColorOverride::Auto);
        let text = RichText::styled("warn", Style::new().fg(Color::Rgb(255, 0, 0)).bold())
            + RichText::link("docs", Style::new().underline(), "https://example.com");
        let painted = paint_line(&text, &detected);
        assert_eq!(painted, "warndocs");
        assert!(!painted.contains('\x1b'));
    }

    #[test]
    fn forced_color_is_painted_on_a_pipe() {
        let env = EnvSnapshot::from_pairs([("FORCE_COLOR", "1")]);
        let forced = TerminalCapabilities::detect_with(&env, false, ColorOverride::Auto);
        assert!(!forced.is_tty);
        let text = RichText::styled("ok", Style::new().fg(Color::Ansi(2)));
        assert_eq!(paint_line(&text, &forced), "\x1b[0;32mok\x1b[0m");
    }

    #[test]
    fn style_changes_emit_minimal_sgr() {
        let red = Style::new().fg(Color::Ansi(1));
        let text = RichText::plain("a") + RichText::styled("bc", red) + RichText::plain("d");
        assert_eq!(
            paint_line(&text, &caps(ColorTier::Ansi16)),
            "a\x1b[0;31mbc\x1b[0md"
        );
    }

    #[test]
    fn truecolor_is_degraded_to_tier() {
        let text = RichText::styled("x", Style::new().fg(Color::Rgb(255, 0, 0)));
        assert_eq!(
            paint_line(&text, &caps(ColorTier::Ansi256)),
            "\x1b[0;38;5;196mx\x1b[0m"
        );
    }

    #[test]
    fn control_characters_are_neutralized() {
        let text = RichText::plain("a\x1b[2Jb\tc");
        assert_eq!(paint_line(&text, &caps(ColorTier::None)), "a [2Jb c");
    }

    #[test]
    fn hyperlinks_only_when_supported() {
        let text = RichText::link("docs", Style::new(), "https://example.com");
        let mut with_links = caps(ColorTier::None);
        with_links.hyperlinks = true;
        assert_eq!(
            paint_line(&text, &with_links),
            "\x1b]8;;https://example.com\x1b\\docs\x1b]8;;\x1b\\"
        );
    }

    #[test]
    fn multi_line_paint_uses_crlf() {
        assert_eq!(
            paint(&RichText::plain("a\nb"), &caps(ColorTier::None)),
            "a\r\nb"
        );
    }
}
