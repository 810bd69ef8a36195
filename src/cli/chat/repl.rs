use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultCompleter, EditCommand, EditMode, Emacs, KeyCode, KeyModifiers,
    MenuBuilder, Reedline, ReedlineEvent, ReedlineMenu, Signal, Vi,
};

use crate::config;
use crate::error;
use nu_ansi_term::{Color, Style};

use super::highlighter::Highlighter;
use super::prompt::{completion_marker, Prompt};
use super::COMMANDS;

fn completion_binding() -> ReedlineEvent {
    ReedlineEvent::UntilFound(vec![
        ReedlineEvent::Menu("completion_menu".to_string()),
        ReedlineEvent::MenuNext,
    ])
}

fn edit_mode(keybindings: config::Keybindings) -> Box<dyn EditMode> {
    match keybindings {
        config::Keybindings::Vi => {
            let mut insert_bindings = default_vi_insert_keybindings();

            insert_bindings.add_binding(KeyModifiers::NONE, KeyCode::Tab, completion_binding());

            Box::new(Vi::new(insert_bindings, default_vi_normal_keybindings()))
        }
        config::Keybindings::Emacs => {
            let mut keybindings = default_emacs_keybindings();

            keybindings.add_binding(KeyModifiers::NONE, KeyCode::Tab, completion_binding());

            keybindings.add_binding(
                KeyModifiers::CONTROL,
                KeyCode::Char('j'),
                ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
            );

            Box::new(Emacs::new(keybindings))
        }
    }
}

/// The interactive line editor
pub(crate) struct Repl {
    line_editor: Reedline,
    prompt: Prompt,
}

impl Repl {
    pub(crate) fn new(keybindings: config::Keybindings) -> Repl {
        let prompt = Prompt::default();

        let mut completer = Box::new(DefaultCompleter::with_inclusions(&['/']));

        completer.insert(COMMANDS.iter().map(|command| command.to_string()).collect());

        // Use the interactive menu to select options from the completer
        let completion_menu = Box::new(
            ColumnarMenu::default()
                .with_name("completion_menu")
                .with_marker(&completion_marker().to_string())
                .with_text_style(Style::new().fg(Color::Default))
                .with_selected_text_style(Style::new().fg(Color::Blue).on(Color::DarkGray))
                .with_selected_match_text_style(
                    Style::new().fg(Color::Blue).bold().on(Color::DarkGray),
                ),
        );

        let line_editor = Reedline::create()
            .with_completer(completer)
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_edit_mode(edit_mode(keybindings))
            .with_highlighter(Box::new(Highlighter::default()));

        Repl {
            line_editor,
            prompt,
        }
    }

    /// Reads the next line. Ctrl-C discards the line being edited, Ctrl-D
    /// ends the input.
    pub(crate) fn read_line(&mut self) -> Option<String> {
        loop {
            match self.line_editor.read_line(&self.prompt) {
                Ok(Signal::Success(line)) => return Some(line),
                Ok(Signal::CtrlC) => continue,
                Ok(_) => return None,
                Err(err) => {
                    error!("failed to read from the terminal: {}", err);
                    return None;
                }
            }
        }
    }
}
