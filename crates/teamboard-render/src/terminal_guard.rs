#![forbid(unsafe_code)]

//! RAII terminal state guard.
//!
//! The dashboard prints below the shell prompt, so it never switches to the
//! alternate screen. The only state it changes is cursor visibility and,
//! when key dispatch is enabled, raw mode and the kitty keyboard flags.
//! [`TerminalGuard`] restores all of it on drop, and a process-wide panic
//! hook restores it if the program panics while a guard is alive.

use std::io::{self, Write};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::ansi;

/// What the guard changes on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardOptions {
    /// Enter raw mode (needed to read individual key events).
    pub raw_mode: bool,
    /// Hide the cursor while the dashboard is shown.
    pub hide_cursor: bool,
    /// Ask for disambiguated key reports (kitty keyboard protocol), so that
    /// Ctrl+Shift chords arrive with both modifiers.
    pub kitty_keyboard: bool,
}

impl GuardOptions {
    /// Raw mode with kitty keyboard reporting, for reading key chords.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            raw_mode: true,
            kitty_keyboard: true,
            ..Self::default()
        }
    }
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            raw_mode: false,
            hide_cursor: true,
            kitty_keyboard: false,
        }
    }
}

/// Set while some guard has state to restore; read by the panic hook.
static ACTIVE: AtomicBool = AtomicBool::new(false);
/// Set while kitty keyboard flags are pushed.
static KITTY: AtomicBool = AtomicBool::new(false);

/// Terminal state guard. Restores the terminal when dropped.
#[derive(Debug)]
pub struct TerminalGuard {
    options: GuardOptions,
    restored: bool,
}

impl TerminalGuard {
    /// Apply `options` to the controlling terminal.
    pub fn enter(options: GuardOptions) -> io::Result<Self> {
        install_panic_hook();
        let guard = Self {
            options,
            restored: false,
        };
        if options.raw_mode {
            crossterm::terminal::enable_raw_mode()?;
        }
        ACTIVE.store(true, Ordering::SeqCst);
        let mut stdout = io::stdout();
        if options.kitty_keyboard {
            ansi::kitty_keyboard_push(&mut stdout)?;
            KITTY.store(true, Ordering::SeqCst);
        }
        if options.hide_cursor {
            ansi::cursor_hide(&mut stdout)?;
        }
        stdout.flush()?;
        debug!(
            event = "terminal.enter",
            raw_mode = options.raw_mode,
            hide_cursor = options.hide_cursor,
            kitty_keyboard = options.kitty_keyboard
        );
        Ok(guard)
    }

    /// Options this guard was entered with.
    #[must_use]
    pub const fn options(&self) -> GuardOptions {
        self.options
    }

    /// Restore the terminal now instead of on drop.
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        ACTIVE.store(false, Ordering::SeqCst);
        let mut stdout = io::stdout();
        if self.options.hide_cursor {
            ansi::cursor_show(&mut stdout)?;
        }
        if KITTY.swap(false, Ordering::SeqCst) {
            ansi::kitty_keyboard_pop(&mut stdout)?;
        }
        if self.options.raw_mode {
            crossterm::terminal::disable_raw_mode()?;
        }
        stdout.flush()?;
        debug!(event = "terminal.restore");
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(event = "terminal.restore_failed", error = %err);
        }
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if ACTIVE.swap(false, Ordering::SeqCst) {
                best_effort_cleanup();
            }
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    if KITTY.swap(false, Ordering::SeqCst) {
        let _ = ansi::kitty_keyboard_pop(&mut stdout);
    }
    let _ = ansi::cursor_show(&mut stdout);
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}
