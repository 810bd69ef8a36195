use crate::color;

/// Shows commands apart from chat text
#[derive(Default)]
pub(crate) struct Highlighter;

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> reedline::StyledText {
        let style = if line.trim_start().starts_with('/') {
            *color::COMMAND_TEXT
        } else {
            *color::USER_TEXT
        };

        reedline::StyledText {
            buffer: vec![(style, line.to_string())],
        }
    }
}
