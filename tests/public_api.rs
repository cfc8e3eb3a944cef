#![allow(unused_imports)]

use tape_term::app::{Builtin, ColorChoice, CompletionShell};
use tape_term::complete::{
    complete, complete_or_report, encode_tree, format_candidates, Arity, Candidate, CommandTree,
    Completer, CompletionHost, CompletionTable, DirEntry, GitModes, OptionSpec, PositionalSpec,
    SystemHost,
};
use tape_term::render::{DiffRenderer, Frame};
use tape_term::{
    command_tree, handle_builtin_flags, init_logging, paint, visible_width, Action, Attr, Choice,
    ChoiceList, Color, ColorOverride, ColorTier, Component, CompletionError, CustomRegistry,
    EnvConfig, EnvSnapshot, Event, EventLoop, InputEvent, Interaction, Key, KeyEvent, LogTarget,
    MemoryTerminal, MultiSelect, Outcome, Paragraph, ProgressHandle, ProgressTask,
    ProgressUpdate, RenderContext, RenderError, RichText, Session, Style, StyledSpan,
    SuspendGuard, TaskId, Terminal, TerminalArgs, TerminalCapabilities, TextInput, Theme, ThemeEntry,
    ThemeError, ThemeSlot, ThemeWarning, VerticalLayout, Widget, WidgetState, WrapOptions,
};

#[cfg(unix)]
use tape_term::ProcessTerminal;

#[test]
fn public_api_exports_compile() {}
