use nu_ansi_term::Style;

use crate::color::{self, MaybePaint};

pub const DEFAULT_EXIT_CODE: i32 = 1;

/// Exit code for invalid command-line usage
pub const USAGE_EXIT_CODE: i32 = 2;

fn format_diagnostic(label: &str, indicator: Style, text_style: Style, text: &str) -> String {
    format!(
        "{} {}",
        indicator.maybe_paint(label),
        text_style.maybe_paint(text)
    )
}

pub(crate) fn error_internal(text: &str) {
    eprintln!(
        "{}",
        format_diagnostic("error:", *color::ERROR_INDICATOR, *color::ERROR_TEXT, text)
    );
}

pub(crate) fn warn_internal(text: &str) {
    eprintln!(
        "{}",
        format_diagnostic("warning:", *color::WARNING_INDICATOR, *color::WARNING_TEXT, text)
    );
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::warn_internal(&formatted);
    })
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::error_internal(&formatted);
    })
}

#[macro_export]
macro_rules! die {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::error_internal(&formatted);
        ::std::process::exit($crate::utils::errors::DEFAULT_EXIT_CODE);
    })
}
