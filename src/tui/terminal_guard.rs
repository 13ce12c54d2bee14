//! RAII terminal lifecycle guard.
//!
//! [`TerminalGuard`] enters raw mode, the alternate screen, and hides the
//! cursor on construction; [`Drop`] restores everything — on normal exit,
//! early error returns, and panics. A custom panic hook restores the
//! terminal *before* the default hook prints, so backtraces land on a
//! readable screen.

use std::io::{self, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};

use crate::core::errors::{QtopError, Result};

/// Whether raw mode is currently active. Checked so restoration is
/// idempotent between the panic hook, early errors, and `Drop`.
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// RAII guard over raw mode + alternate screen + cursor visibility.
pub struct TerminalGuard {
    hook_installed: bool,
}

impl TerminalGuard {
    /// Enter raw mode and the alternate screen, hide the cursor, clear
    /// once, and install a panic-safe cleanup hook.
    ///
    /// The one clear here is the only full-screen clear the dashboard
    /// ever issues; steady-state redraws overwrite lines in place.
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode().map_err(|e| QtopError::terminal("enabling raw mode", e))?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);

        if let Err(e) = execute!(
            io::stdout(),
            EnterAlternateScreen,
            Hide,
            Clear(ClearType::All)
        ) {
            restore_terminal_best_effort();
            return Err(QtopError::terminal("entering alternate screen", e));
        }

        let prev = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_terminal_best_effort();
            prev(info);
        }));

        Ok(Self {
            hook_installed: true,
        })
    }

    /// Current terminal dimensions (columns, rows).
    pub fn size() -> Result<(u16, u16)> {
        terminal::size().map_err(|e| QtopError::terminal("querying terminal size", e))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.hook_installed {
            // The previous hook was moved into our closure; resetting to
            // the default is the best that can be done, and the guard's
            // lifetime brackets all dashboard usage anyway.
            let _ = panic::take_hook();
        }
        restore_terminal_best_effort();
    }
}

/// Best-effort restoration. Safe to call multiple times; the atomic flag
/// keeps it to one real restore.
fn restore_terminal_best_effort() {
    if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, Show);
        let _ = terminal::disable_raw_mode();
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test so nothing races on the process-wide flag.
    #[test]
    fn restore_is_idempotent_and_clears_the_flag() {
        restore_terminal_best_effort();
        restore_terminal_best_effort();
        assert!(!RAW_MODE_ACTIVE.load(Ordering::SeqCst));
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);
        restore_terminal_best_effort();
        assert!(!RAW_MODE_ACTIVE.load(Ordering::SeqCst));
    }
}
