//! Logging with colored module prefixes.
//!
//! Messages go to stderr so that command output on stdout stays parseable.
//!
//! # Example
//!
//! ```ignore
//! log!("index"; "loaded {} posts", count);
//! log!("watch"; "error: {err}");
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
    tty::IsTty,
};
use std::{
    io::{Write, stderr},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use), `None` when stderr is
/// redirected.
static TERMINAL_WIDTH: OnceLock<Option<u16>> = OnceLock::new();

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Total prefix length for a module name: `[module] `.
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails on a terminal.
fn get_terminal_width() -> Option<u16> {
    *TERMINAL_WIDTH.get_or_init(|| {
        stderr()
            .is_tty()
            .then(|| size().map(|(w, _)| w).unwrap_or(120))
    })
}

/// Room left for the message after the prefix. `None` means no limit.
fn message_budget(width: Option<u16>, module_len: usize) -> Option<usize> {
    width.map(|w| (w as usize).saturating_sub(calc_prefix_len(module_len)))
}

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::utils::log::log($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix.
///
/// Long messages are truncated to the terminal width; redirected output is
/// written in full.
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    let width = get_terminal_width();

    let mut stderr = stderr().lock();
    if width.is_some() {
        execute!(stderr, Clear(ClearType::UntilNewLine)).ok();
    }

    let message = match message_budget(width, module.len()) {
        Some(max_msg_len) => truncate_str(message, max_msg_len),
        None => message,
    };

    writeln!(stderr, "{prefix} {message}").ok();
    stderr.flush().ok();
}

#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "index" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within max_len bytes, on a char boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_prefix_len() {
        // "watch" -> "[watch] " = 5 + 2 + 1
        assert_eq!(calc_prefix_len(5), 8);
        assert_eq!(calc_prefix_len(0), 3);
    }

    #[test]
    fn test_message_budget() {
        // "[watch] " takes 8 of 20 columns
        assert_eq!(message_budget(Some(20), 5), Some(12));
        assert_eq!(message_budget(Some(4), 5), Some(0));
        // redirected: never truncate
        assert_eq!(message_budget(None, 5), None);
    }

    #[test]
    fn test_truncate_str_fits() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_str_cuts() {
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn test_truncate_str_unicode_boundary() {
        // "你" is 3 bytes, cutting at 4 must back off to 3
        assert_eq!(truncate_str("你好", 4), "你");
        assert_eq!(truncate_str("a你b", 3), "a");
    }
}
