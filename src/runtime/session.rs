//! Session: one render context, one event loop and the process cleanup hooks.

use std::sync::Arc;

use crate::config::{EnvConfig, EnvSnapshot};
use crate::core::capabilities::{ColorOverride, TerminalCapabilities};
use crate::core::terminal::Terminal;
use crate::core::text::rich::RichText;
use crate::core::theme::Theme;
use crate::error::RenderError;
use crate::render::{RenderContext, SuspendGuard};
use crate::widgets::progress_task::{ProgressHandle, ProgressTask};

use super::event_loop::{EventLoop, Outcome};
use crate::core::component::Widget;

#[cfg(unix)]
use crate::core::event::Event;
#[cfg(unix)]
use crate::core::input::InputEvent;
#[cfg(unix)]
use crate::platform::process_terminal::{
    install_panic_hook, install_signal_handlers, PanicHookGuard, ProcessTerminal,
    SignalHookGuard,
};

#[cfg(unix)]
#[derive(Default)]
struct CleanupHooks {
    _panic: Option<PanicHookGuard>,
    _signals: Option<SignalHookGuard>,
}

pub struct Session<T: Terminal> {
    ctx: RenderContext<T>,
    event_loop: EventLoop,
    #[cfg(unix)]
    _hooks: CleanupHooks,
}

#[cfg(unix)]
impl Session<ProcessTerminal> {
    /// Session on the process's stdin/stdout.
    ///
    /// Installs a panic hook that restores cooked mode, and turns SIGINT into
    /// an interrupt event while a widget is active. Other signals, or SIGINT
    /// outside a widget, restore the terminal and exit with `128 + signal`.
    pub fn stdio(color: ColorOverride) -> Result<Self, RenderError> {
        let env = EnvSnapshot::capture();
        let config = EnvConfig::from_snapshot(&env);
        let mut terminal = ProcessTerminal::new();
        let caps = TerminalCapabilities::detect_with(&env, terminal.is_tty(), color);
        let theme = load_theme(&config, &caps);
        let event_loop = EventLoop::new();

        let mut hooks = CleanupHooks::default();
        if caps.is_tty {
            let restore = terminal.restore_handle();
            let panic_restore = restore.clone();
            hooks._panic = Some(install_panic_hook(move || panic_restore.restore()));

            let sender = event_loop.sender();
            match install_signal_handlers(move |signal| {
                if signal == libc::SIGINT && restore.is_raw() {
                    let _ = sender.send(Event::Input(InputEvent::Interrupt));
                    return;
                }
                restore.restore();
                std::process::exit(128 + signal);
            }) {
                Ok(guard) => hooks._signals = Some(guard),
                Err(err) => tracing::warn!(%err, "signal handlers unavailable"),
            }

            terminal
                .start_input(event_loop.sender())
                .map_err(RenderError::RawMode)?;
        }
        tracing::debug!(?caps, "session started");

        Ok(Self {
            ctx: RenderContext::new(terminal, caps, Arc::new(theme)),
            event_loop,
            _hooks: hooks,
        })
    }
}

/// Theme for `caps`, with overrides from `TAPE_TERM_THEME` when it loads cleanly.
pub fn load_theme(config: &EnvConfig, caps: &TerminalCapabilities) -> Theme {
    let mut theme = Theme::for_capabilities(caps);
    if let Some(path) = config.theme_path.as_deref() {
        let mut candidate = theme.clone();
        match candidate.load_overrides(path) {
            Ok(()) => theme = candidate,
            Err(err) => tracing::warn!(%err, "ignoring theme overrides"),
        }
    }
    theme
}

impl<T: Terminal> Session<T> {
    pub fn with_terminal(terminal: T, caps: TerminalCapabilities, theme: Theme) -> Self {
        Self {
            ctx: RenderContext::new(terminal, caps, Arc::new(theme)),
            event_loop: EventLoop::new(),
            #[cfg(unix)]
            _hooks: CleanupHooks::default(),
        }
    }

    pub fn context(&self) -> &RenderContext<T> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut RenderContext<T> {
        &mut self.ctx
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn capabilities(&self) -> &TerminalCapabilities {
        self.ctx.capabilities()
    }

    pub fn theme(&self) -> &Arc<Theme> {
        self.ctx.theme()
    }

    /// Swaps the theme; the next redraw repaints everything with it.
    pub fn set_theme(&mut self, theme: Theme) {
        self.ctx.set_theme(Arc::new(theme));
    }

    pub fn progress_handle(&self) -> ProgressHandle {
        self.event_loop.progress_handle()
    }

    /// Runs `widget` to completion.
    pub fn ask<W: Widget>(&mut self, widget: W) -> Result<Outcome<W::Value>, RenderError> {
        self.event_loop.run(&mut self.ctx, widget)
    }

    pub fn run_task<F, R>(
        &mut self,
        task: ProgressTask,
        work: F,
    ) -> Result<Outcome<Result<R, String>>, RenderError>
    where
        F: FnOnce(ProgressHandle) -> Result<R, String> + Send + 'static,
        R: Send + 'static,
    {
        self.event_loop.run_task(&mut self.ctx, task, work)
    }

    pub fn print(&mut self, text: &RichText) -> Result<(), RenderError> {
        self.ctx.println(text)
    }

    /// Decorated one-line message; `kind` is `heading`, `question`, `warning`, `error`, `success` or `hint`.
    pub fn message(&mut self, kind: &str, text: &str) -> Result<(), RenderError> {
        let theme = Arc::clone(self.ctx.theme());
        let line = RichText::styled(
            theme.decoration(kind),
            theme.resolve(&format!("msg/decoration:{kind}")),
        )
        .push(text, theme.resolve(&format!("msg/text:{kind}")));
        self.ctx.println(&line)
    }

    /// Hands the terminal to a foreground subprocess until the guard drops.
    pub fn suspend(&mut self) -> Result<SuspendGuard<'_, T>, RenderError> {
        self.ctx.suspend()
    }

    pub fn into_context(self) -> RenderContext<T> {
        self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::{load_theme, Session};
    use crate::config::{EnvConfig, EnvSnapshot};
    use crate::core::capabilities::{ColorTier, TerminalCapabilities};
    use crate::core::event::Event;
    use crate::core::input::{InputEvent, Key};
    use crate::core::style::{Color, Style};
    use crate::core::text::rich::RichText;
    use crate::core::theme::Theme;
    use crate::platform::memory_terminal::MemoryTerminal;
    use crate::widgets::{MultiSelect, ProgressTask};
    use std::io::Write;

    fn tty_session() -> Session<MemoryTerminal> {
        let caps = TerminalCapabilities {
            color_tier: ColorTier::Ansi16,
            unicode: true,
            hyperlinks: false,
            is_tty: true,
        };
        Session::with_terminal(MemoryTerminal::new(40, 10), caps, Theme::for_capabilities(&caps))
    }

    #[test]
    fn ask_runs_widget_with_queued_input() {
        let mut session = tty_session();
        let sender = session.event_loop().sender();
        for key in [Key::Char(' '), Key::Down, Key::Char(' '), Key::Enter] {
            sender.send(Event::Input(InputEvent::key(key))).unwrap();
        }
        let outcome = session.ask(MultiSelect::new(["a", "b", "c"])).unwrap();
        assert_eq!(outcome.into_option(), Some(vec![0, 1]));
    }

    #[test]
    fn run_task_reports_worker_result() {
        let mut session = tty_session();
        let outcome = session
            .run_task(ProgressTask::new("sum"), |handle| {
                handle.message("adding");
                Ok(2 + 2)
            })
            .unwrap();
        assert_eq!(outcome.into_option(), Some(Ok(4)));
    }

    #[test]
    fn print_on_pipe_has_no_escapes() {
        let mut session = Session::with_terminal(
            MemoryTerminal::pipe(),
            TerminalCapabilities::plain(),
            Theme::empty(),
        );
        session
            .print(&RichText::styled("plain", Style::new().fg(Color::Ansi(1))))
            .unwrap();
        assert_eq!(session.context().terminal().output(), "plain\r\n");
    }

    #[test]
    fn message_uses_kind_decoration() {
        let mut session = Session::with_terminal(
            MemoryTerminal::pipe(),
            TerminalCapabilities::plain(),
            Theme::for_capabilities(&TerminalCapabilities::plain()),
        );
        session.message("heading", "Setup").unwrap();
        assert_eq!(session.context().terminal().output(), "# Setup\r\n");
    }

    #[test]
    fn bad_theme_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let env = EnvSnapshot::from_pairs([("TAPE_TERM_THEME", file.path().to_str().unwrap())]);
        let config = EnvConfig::from_snapshot(&env);
        let caps = TerminalCapabilities::plain();
        let theme = load_theme(&config, &caps);
        assert_eq!(
            theme.resolve("msg/text:error"),
            Theme::for_capabilities(&caps).resolve("msg/text:error")
        );
    }
}
