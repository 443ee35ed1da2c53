// Path: crates/test_utils/src/caller.rs
//! Call-site capture for log records.
//!
//! Every public logging entry point of the context is `#[track_caller]`, so
//! `Location::caller()` already skips the wrapper's own frames and points at
//! the test author's call site no matter how many logging methods nest. The
//! function name is then looked up in a std backtrace by matching that
//! file and line.

use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;

/// Where a log call was made.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerFrame {
    pub file: &'static str,
    pub line: u32,
    pub function: String,
}

impl CallerFrame {
    /// Captures the location of the outermost `#[track_caller]` caller.
    #[track_caller]
    pub fn capture() -> Self {
        let location = Location::caller();
        let function = resolve_function(location.file(), location.line())
            .unwrap_or_else(|| "unknown".to_string());
        Self {
            file: location.file(),
            line: location.line(),
            function,
        }
    }

    /// `file:line`, the value of the `file_line` field.
    pub fn file_line(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

impl fmt::Display for CallerFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.file, self.line, self.function)
    }
}

// Backtrace frames render as
//    7: pylons_cli::testing::account::get_account_addr
//              at ./src/testing/account.rs:31:5
// std does not guarantee this format. If it changes, nothing matches and
// the frame reports `unknown`; file and line still come from `Location`.
fn resolve_function(file: &str, line: u32) -> Option<String> {
    let trace = Backtrace::force_capture().to_string();
    let line_marker = format!(":{}:", line);
    let mut current: Option<&str> = None;

    for raw in trace.lines() {
        let text = raw.trim_start();
        if let Some(path) = text.strip_prefix("at ") {
            if let Some(function) = current {
                if path.contains(&line_marker) && same_source(path, file) {
                    return Some(strip_symbol_hash(function).to_string());
                }
            }
        } else if let Some((index, function)) = text.split_once(": ") {
            if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
                current = Some(function);
            }
        }
    }
    None
}

fn same_source(frame_path: &str, file: &str) -> bool {
    let frame_file = frame_path
        .rsplitn(3, ':')
        .nth(2)
        .unwrap_or(frame_path)
        .trim_start_matches("./");
    let file = file.trim_start_matches("./");
    frame_file.ends_with(file) || file.ends_with(frame_file)
}

fn strip_symbol_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit()) => {
            head
        }
        _ => symbol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn nested_twice() -> CallerFrame {
        nested_once()
    }

    #[track_caller]
    fn nested_once() -> CallerFrame {
        CallerFrame::capture()
    }

    #[test]
    fn test_capture_reports_call_site() {
        let expected_line = line!() + 1;
        let frame = CallerFrame::capture();
        assert_eq!(frame.file, file!());
        assert_eq!(frame.line, expected_line);
    }

    #[test]
    fn test_capture_skips_track_caller_frames() {
        let expected_line = line!() + 1;
        let frame = nested_twice();
        assert_eq!(frame.file_line(), format!("{}:{}", file!(), expected_line));
    }

    #[test]
    fn test_function_name_resolves_or_is_unknown() {
        let frame = CallerFrame::capture();
        // Debug builds carry line tables; stripped builds fall back.
        assert!(
            frame.function.contains("test_function_name_resolves_or_is_unknown")
                || frame.function == "unknown",
            "unexpected function {}",
            frame.function
        );
    }

    #[test]
    fn test_unmatched_frame_is_none() {
        // No frame sits on line 0, so resolution has to give up cleanly.
        assert_eq!(resolve_function(file!(), 0), None);
        assert_eq!(resolve_function("src/no_such_file.rs", line!()), None);
    }

    #[test]
    fn test_same_source_matches_relative_paths() {
        assert!(same_source(
            "./src/caller.rs:10:5",
            "crates/test_utils/src/caller.rs"
        ));
        assert!(same_source(
            "/root/crate/crates/test_utils/src/caller.rs:10:5",
            "crates/test_utils/src/caller.rs"
        ));
        assert!(!same_source("./src/context.rs:10:5", "src/caller.rs"));
    }

    #[test]
    fn test_strip_symbol_hash() {
        assert_eq!(
            strip_symbol_hash("pylons_cli::run::h0123456789abcdef"),
            "pylons_cli::run"
        );
        assert_eq!(strip_symbol_hash("pylons_cli::helper"), "pylons_cli::helper");
    }
}
