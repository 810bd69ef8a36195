use std::io::{self, IsTerminal};

use crate::RequestedColorMode;

pub(crate) mod chat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub(crate) enum ColorMode {
    On,
    Off,
}

impl ColorMode {
    /// Returns whether ANSI color should be used, inspecting the process
    /// environment when the user left it up to us.
    pub(crate) fn resolve_auto(cm: RequestedColorMode) -> ColorMode {
        ColorMode::resolve(
            cm,
            std::env::var_os("NO_COLOR").is_some(),
            io::stdout().is_terminal(),
        )
    }

    /// A stated preference, through the command line, is honored. Otherwise
    /// color is disabled by "NO_COLOR" and enabled only when the output is a
    /// terminal.
    fn resolve(cm: RequestedColorMode, no_color: bool, out_terminal: bool) -> ColorMode {
        match cm {
            RequestedColorMode::Auto if no_color || !out_terminal => ColorMode::Off,
            RequestedColorMode::Auto | RequestedColorMode::On => ColorMode::On,
            RequestedColorMode::Off => ColorMode::Off,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_color_mode() {
        use RequestedColorMode::*;

        assert_eq!(ColorMode::resolve(Auto, false, true), ColorMode::On);
        assert_eq!(ColorMode::resolve(Auto, true, true), ColorMode::Off);
        assert_eq!(ColorMode::resolve(Auto, false, false), ColorMode::Off);
        assert_eq!(ColorMode::resolve(On, true, false), ColorMode::On);
        assert_eq!(ColorMode::resolve(Off, false, true), ColorMode::Off);
    }
}
