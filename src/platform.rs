//! Platform capability detection

#[cfg(unix)]
use nix::libc;

/// Size used when the real terminal cannot be queried
pub const FALLBACK_SIZE: (usize, usize) = (80, 24);

/// Whether stdout is attached to a terminal
pub fn stdout_is_tty() -> bool {
    #[cfg(unix)]
    {
        nix::unistd::isatty(libc::STDOUT_FILENO).unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        use crossterm::tty::IsTty;
        std::io::stdout().is_tty()
    }
}

/// Whether stdout is a terminal that interprets escape sequences natively
pub fn supports_escape_sequences() -> bool {
    #[cfg(unix)]
    {
        let is_tty = stdout_is_tty();
        let term = std::env::var("TERM").unwrap_or_default();
        let supported = is_tty && !term.is_empty() && term != "dumb";
        if is_tty && !supported {
            tracing::warn!(term = %term, "terminal does not advertise escape sequence support");
        }
        supported
    }

    // Consoles there are driven through crossterm
    #[cfg(not(unix))]
    {
        false
    }
}

/// Size of the terminal attached to stdout as (columns, rows)
pub fn terminal_size() -> Option<(usize, usize)> {
    #[cfg(unix)]
    {
        let mut ws = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        // SAFETY: TIOCGWINSZ only writes a winsize into the struct we own
        let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
        if result < 0 || ws.ws_col == 0 || ws.ws_row == 0 {
            return None;
        }
        Some((ws.ws_col as usize, ws.ws_row as usize))
    }

    #[cfg(not(unix))]
    {
        crossterm::terminal::size()
            .ok()
            .filter(|&(cols, rows)| cols > 0 && rows > 0)
            .map(|(cols, rows)| (cols as usize, rows as usize))
    }
}

/// Terminal size, or [`FALLBACK_SIZE`] when it cannot be queried
pub fn terminal_size_or_default() -> (usize, usize) {
    terminal_size().unwrap_or(FALLBACK_SIZE)
}
