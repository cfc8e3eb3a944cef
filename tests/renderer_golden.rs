mod fixture;

use std::sync::Arc;

use tape_term::core::style::{Color, Style};
use tape_term::render::frame::Frame;
use tape_term::{
    paint, ColorTier, MemoryTerminal, RenderContext, RenderError, RichText, TerminalCapabilities,
    Theme,
};

fn caps(tier: ColorTier, is_tty: bool) -> TerminalCapabilities {
    TerminalCapabilities {
        color_tier: tier,
        unicode: true,
        hyperlinks: false,
        is_tty,
    }
}

fn tty_context() -> RenderContext<MemoryTerminal> {
    RenderContext::new(
        MemoryTerminal::new(20, 5),
        caps(ColorTier::Ansi16, true),
        Arc::new(Theme::empty()),
    )
}

fn frame(lines: &[&str]) -> Frame {
    Frame::new(lines.iter().map(|line| RichText::plain(*line)).collect())
}

#[test]
fn golden_paint_degrades_per_tier() {
    let expected = fixture::read_lines_unescaped("paint_tiers.txt");
    let text = RichText::styled("warn", Style::new().bold().fg(Color::Rgb(255, 136, 0)));
    let painted: Vec<String> = [
        ColorTier::TrueColor,
        ColorTier::Ansi256,
        ColorTier::Ansi16,
        ColorTier::None,
    ]
    .into_iter()
    .map(|tier| paint(&text, &caps(tier, true)))
    .collect();
    assert_eq!(painted, expected);
}

#[test]
fn golden_redraw_rewrites_changed_rows_only() {
    let expected = fixture::read_lines_unescaped("redraw_sequence.txt");
    let mut ctx = tty_context();
    let mut steps = Vec::new();

    ctx.redraw(frame(&["one", "two"])).unwrap();
    steps.push(ctx.terminal_mut().take_output());
    ctx.redraw(frame(&["one", "TWO"])).unwrap();
    steps.push(ctx.terminal_mut().take_output());
    ctx.finish().unwrap();
    steps.push(ctx.terminal_mut().take_output());

    assert_eq!(steps, expected);
}

#[test]
fn golden_print_above_live_frame() {
    let expected = fixture::read_unescaped("print_above.txt");
    let mut ctx = tty_context();
    ctx.redraw(frame(&["live"])).unwrap();
    ctx.terminal_mut().take_output();

    ctx.print_above(&RichText::plain("log")).unwrap();
    assert_eq!(ctx.terminal().output(), expected);
}

#[test]
fn pipe_gets_only_the_final_frame() {
    let mut ctx = RenderContext::new(
        MemoryTerminal::pipe(),
        TerminalCapabilities::plain(),
        Arc::new(Theme::empty()),
    );
    ctx.redraw(frame(&["working 1"])).unwrap();
    ctx.redraw(frame(&["working 2"])).unwrap();
    assert_eq!(ctx.terminal().output(), "");
    ctx.finish().unwrap();
    assert_eq!(ctx.terminal().output(), "working 2\n");
}

#[test]
fn broken_pipe_is_reported_once() {
    let mut ctx = tty_context();
    ctx.terminal_mut().fail_writes();
    assert!(matches!(
        ctx.println(&RichText::plain("a")),
        Err(RenderError::Write(_))
    ));
    assert!(ctx.println(&RichText::plain("b")).is_ok());
    assert!(ctx.redraw(frame(&["c"])).is_ok());
    assert!(ctx.has_failed());
}

#[test]
fn styled_text_on_a_pipe_has_no_escapes() {
    let text = RichText::styled("plain", Style::new().underline().fg(Color::Indexed(200)))
        + RichText::link("site", Style::new(), "https://example.com");
    let painted = paint(&text, &TerminalCapabilities::plain());
    assert_eq!(painted, "plainsite");
}
