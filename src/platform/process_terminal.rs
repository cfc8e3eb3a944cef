//! Terminal backed by the process's stdin/stdout file descriptors.

use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::core::event::Event;
use crate::core::input::InputEvent;
use crate::core::terminal::Terminal;
use crate::platform::input_decoder::InputDecoder;

#[cfg(unix)]
use libc::{self, c_int};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// Poll interval of the input thread while nothing is pending.
const INPUT_POLL_MS: i32 = 50;

/// Disables bracketed paste and shows the cursor.
const RESET_SEQUENCE: &str = "\x1b[?2004l\x1b[?25h";

#[cfg(unix)]
fn wait_writable(fd: c_int) -> io::Result<()> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result == 0 {
            continue;
        }
        if (fds.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }
        if (fds.revents & (libc::POLLERR | libc::POLLHUP)) != 0 {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }

        return Err(io::Error::other(format!(
            "poll(POLLOUT) returned revents=0x{:x}",
            fds.revents
        )));
    }
}

#[cfg(unix)]
fn write_all_fd_with<FWrite, FWait>(
    fd: c_int,
    bytes: &[u8],
    mut write_once: FWrite,
    mut wait_writable: FWait,
) -> io::Result<()>
where
    FWrite: FnMut(c_int, &[u8]) -> io::Result<usize>,
    FWait: FnMut(c_int) -> io::Result<()>,
{
    let mut written = 0;
    while written < bytes.len() {
        match write_once(fd, &bytes[written..]) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
            }
            Ok(count) => {
                let remaining = bytes.len() - written;
                if count > remaining {
                    return Err(io::Error::other("write returned more bytes than requested"));
                }
                written += count;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => wait_writable(fd)?,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn write_once(fd: c_int, buf: &[u8]) -> io::Result<usize> {
    let result = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(result as usize)
    }
}

/// Writes everything or returns the error; `EPIPE` surfaces as `BrokenPipe`.
#[cfg(unix)]
fn write_fd(fd: c_int, data: &str) -> io::Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    write_all_fd_with(fd, data.as_bytes(), write_once, wait_writable)
}

/// Never blocks: gives up as soon as the descriptor would block.
#[cfg(unix)]
fn write_best_effort(fd: c_int, data: &str) {
    let _ = write_all_fd_with(fd, data.as_bytes(), write_once, |_| {
        Err(io::Error::from(io::ErrorKind::WouldBlock))
    });
}

#[cfg(unix)]
fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

#[cfg(unix)]
fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    result > 0 && (fds.revents & (libc::POLLIN | libc::POLLHUP)) != 0
}

#[cfg(unix)]
fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Mode state shared with the input thread and the panic/signal cleanup.
#[cfg(unix)]
struct ModeState {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original: Mutex<Option<libc::termios>>,
    raw: AtomicBool,
}

#[cfg(unix)]
impl ModeState {
    fn original(&self) -> Option<libc::termios> {
        match self.original.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Cloneable handle that puts the terminal back into cooked mode from any thread.
#[cfg(unix)]
#[derive(Clone)]
pub struct RestoreHandle {
    state: Arc<ModeState>,
}

#[cfg(unix)]
impl RestoreHandle {
    pub fn is_raw(&self) -> bool {
        self.state.raw.load(Ordering::SeqCst)
    }

    /// Best effort: never panics and never blocks on output.
    pub fn restore(&self) {
        if !self.state.raw.swap(false, Ordering::SeqCst) {
            return;
        }
        write_best_effort(self.state.stdout_fd, RESET_SEQUENCE);
        write_best_effort(self.state.stdout_fd, "\r\n");
        if let Some(original) = self.state.original() {
            let _ = set_termios(self.state.stdin_fd, &original);
        }
    }
}

#[cfg(unix)]
pub struct ProcessTerminal {
    state: Arc<ModeState>,
    input_thread: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
    resize_signal_handle: Option<signal_hook::iterator::Handle>,
    resize_thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self::with_fds(libc::STDIN_FILENO, libc::STDOUT_FILENO)
    }

    fn with_fds(stdin_fd: c_int, stdout_fd: c_int) -> Self {
        Self {
            state: Arc::new(ModeState {
                stdin_fd,
                stdout_fd,
                original: Mutex::new(None),
                raw: AtomicBool::new(false),
            }),
            input_thread: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            resize_signal_handle: None,
            resize_thread: None,
        }
    }

    pub fn restore_handle(&self) -> RestoreHandle {
        RestoreHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Starts the stdin reader and the SIGWINCH forwarder.
    ///
    /// Input is only consumed while the terminal is raw; bytes typed in cooked
    /// mode stay in the kernel buffer for whoever reads stdin next.
    pub fn start_input(&mut self, sender: Sender<Event>) -> io::Result<()> {
        if self.input_thread.is_some() {
            return Ok(());
        }
        self.stop_flag.store(false, Ordering::SeqCst);
        self.start_resize_thread(sender.clone())?;
        self.start_input_thread(sender);
        Ok(())
    }

    pub fn stop_input(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.input_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.resize_signal_handle.take() {
            handle.close();
        }
        if let Some(thread) = self.resize_thread.take() {
            let _ = thread.join();
        }
    }

    fn start_input_thread(&mut self, sender: Sender<Event>) {
        let state = Arc::clone(&self.state);
        let stop_flag = Arc::clone(&self.stop_flag);

        self.input_thread = Some(thread::spawn(move || {
            let mut buffer = [0u8; 4096];
            let mut decoder = InputDecoder::default();

            while !stop_flag.load(Ordering::SeqCst) {
                let now = Instant::now();
                let timeout_ms = decoder.next_timeout_ms(now, INPUT_POLL_MS);
                if !state.raw.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(timeout_ms.max(1) as u64));
                    continue;
                }
                let events = if poll_readable(state.stdin_fd, timeout_ms) {
                    let read_len = unsafe {
                        libc::read(state.stdin_fd, buffer.as_mut_ptr() as *mut _, buffer.len())
                    };
                    if read_len == 0 {
                        tracing::debug!("stdin closed");
                        let _ = sender.send(Event::Input(InputEvent::Interrupt));
                        break;
                    }
                    if read_len < 0 {
                        continue;
                    }
                    decoder.process(&buffer[..read_len as usize])
                } else {
                    decoder.flush_due(Instant::now())
                };

                for event in events {
                    if sender.send(Event::Input(event)).is_err() {
                        return;
                    }
                }
            }
        }));
    }

    fn start_resize_thread(&mut self, sender: Sender<Event>) -> io::Result<()> {
        let mut signals = Signals::new([libc::SIGWINCH])?;
        let handle = signals.handle();
        let stdout_fd = self.state.stdout_fd;

        let thread = thread::spawn(move || {
            for _ in signals.forever() {
                let (columns, rows) = read_winsize(stdout_fd).unwrap_or((80, 24));
                if sender
                    .send(Event::Input(InputEvent::Resize { columns, rows }))
                    .is_err()
                {
                    break;
                }
            }
        });

        self.resize_signal_handle = Some(handle);
        self.resize_thread = Some(thread);
        Ok(())
    }
}

#[cfg(unix)]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Drop for ProcessTerminal {
    fn drop(&mut self) {
        self.stop_input();
        if self.state.raw.load(Ordering::SeqCst) {
            let _ = self.leave_raw_mode();
        }
    }
}

#[cfg(unix)]
impl Terminal for ProcessTerminal {
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        let original = match self.state.original() {
            Some(original) => original,
            None => {
                let original = get_termios(self.state.stdin_fd)?;
                if let Ok(mut slot) = self.state.original.lock() {
                    *slot = Some(original);
                }
                original
            }
        };
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.state.stdin_fd, &raw)?;
        self.state.raw.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        self.state.raw.store(false, Ordering::SeqCst);
        match self.state.original() {
            Some(original) => set_termios(self.state.stdin_fd, &original),
            None => Ok(()),
        }
    }

    fn write(&mut self, data: &str) -> io::Result<()> {
        write_fd(self.state.stdout_fd, data)
    }

    fn columns(&self) -> u16 {
        read_winsize(self.state.stdout_fd)
            .map(|(cols, _)| cols)
            .unwrap_or(80)
    }

    fn rows(&self) -> u16 {
        read_winsize(self.state.stdout_fd)
            .map(|(_, rows)| rows)
            .unwrap_or(24)
    }

    fn is_tty(&self) -> bool {
        unsafe {
            libc::isatty(self.state.stdin_fd) == 1 && libc::isatty(self.state.stdout_fd) == 1
        }
    }
}

/// Signal handler guard for cleanup hooks.
#[cfg(unix)]
pub struct SignalHookGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl Drop for SignalHookGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Runs `on_signal` with the signal number for every SIGINT/SIGTERM/SIGHUP.
#[cfg(unix)]
pub fn install_signal_handlers<F>(on_signal: F) -> io::Result<SignalHookGuard>
where
    F: Fn(c_int) + Send + Sync + 'static,
{
    let mut signals = Signals::new([libc::SIGINT, libc::SIGTERM, libc::SIGHUP])?;
    let handle = signals.handle();

    let thread = thread::spawn(move || {
        for signal in signals.forever() {
            on_signal(signal);
        }
    });

    Ok(SignalHookGuard {
        handle,
        thread: Some(thread),
    })
}

type Cleanup = Arc<dyn Fn() + Send + Sync + 'static>;

struct PanicRegistry {
    next_id: u64,
    cleanups: Vec<(u64, Cleanup)>,
    hook_installed: bool,
}

static PANIC_REGISTRY: Mutex<PanicRegistry> = Mutex::new(PanicRegistry {
    next_id: 0,
    cleanups: Vec::new(),
    hook_installed: false,
});

fn registry() -> std::sync::MutexGuard<'static, PanicRegistry> {
    match PANIC_REGISTRY.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn run_panic_cleanups() {
    let cleanups: Vec<Cleanup> = registry()
        .cleanups
        .iter()
        .map(|(_, cleanup)| Arc::clone(cleanup))
        .collect();
    for cleanup in cleanups {
        cleanup();
    }
}

/// Keeps a panic cleanup registered; dropping it unregisters the cleanup.
#[derive(Debug)]
pub struct PanicHookGuard {
    id: u64,
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        registry().cleanups.retain(|(id, _)| *id != self.id);
    }
}

/// Runs `cleanup` before the previously installed panic hook on every panic.
///
/// The wrapping hook is installed once per process; later hooks installed by
/// the application are left in place.
pub fn install_panic_hook<F>(cleanup: F) -> PanicHookGuard
where
    F: Fn() + Send + Sync + 'static,
{
    let mut registry = registry();
    if !registry.hook_installed {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            run_panic_cleanups();
            previous(info);
        }));
        registry.hook_installed = true;
    }
    let id = registry.next_id;
    registry.next_id += 1;
    registry.cleanups.push((id, Arc::new(cleanup)));
    PanicHookGuard { id }
}
