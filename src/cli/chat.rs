mod highlighter;
mod prompt;
mod repl;

use std::io::{self, IsTerminal, Lines, StdinLock};

use tokio::{select, signal};

use self::repl::Repl;
use crate::args::DEFAULT_SYSTEM_PROMPT;
use crate::config;
use crate::session::Session;
use crate::{error, warn};
use prompt::{model_prompt, notice};

/// The commands understood by the chat loop
pub(crate) const COMMANDS: [&str; 4] = ["/exit", "/quit", "/clear", "/history"];

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command {
    /// End the chat
    Exit,
    /// Forget the conversation, keeping the system prompt
    Clear,
    /// Report the size of the conversation
    History,
    Unknown(String),
}

/// A line of user input
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Input {
    Empty,
    Command(Command),
    Text(String),
}

impl Input {
    pub(crate) fn parse(line: &str) -> Input {
        let line = line.trim();

        if line.is_empty() {
            return Input::Empty;
        }

        if !line.starts_with('/') {
            return Input::Text(line.to_string());
        }

        let command = match line {
            "/exit" | "/quit" => Command::Exit,
            "/clear" => Command::Clear,
            "/history" => Command::History,
            other => Command::Unknown(other.to_string()),
        };

        Input::Command(command)
    }
}

/// Where user input comes from. A line editor is only used on a terminal.
enum LineSource {
    Interactive(Box<Repl>),
    Piped(Lines<StdinLock<'static>>),
}

impl LineSource {
    fn next_line(&mut self) -> Option<String> {
        match self {
            LineSource::Interactive(repl) => repl.read_line(),
            LineSource::Piped(lines) => match lines.next()? {
                Ok(line) => Some(line),
                Err(err) => {
                    error!("failed to read standard input: {}", err);
                    None
                }
            },
        }
    }
}

fn print_banner(session: &Session) {
    let config = session.config();

    println!(
        "{} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    if config.system_prompt == DEFAULT_SYSTEM_PROMPT {
        println!("{}", notice("No system prompt was given, using the default."));
    }

    println!("system prompt: {}", config.system_prompt);
    println!("model: {}", config.model);
    println!("temperature: {}", config.temperature);
    println!(
        "{}",
        notice("Type a message, /clear to forget the conversation or /exit to quit.")
    );
    println!();
}

fn describe_history(session: &Session) -> String {
    let messages = session.history().len();
    let turns = (messages - 1) / 2;

    format!(
        "[{} messages retained: the system prompt and {} turns]",
        messages, turns
    )
}

async fn run_turn(session: &mut Session, text: &str, interactive: bool) {
    let result = select! {
        result = session.submit(text) => result,
        _ = signal::ctrl_c() => {
            warn!("the request was abandoned, the message was not added to the conversation");
            return;
        }
    };

    match result {
        Ok(reply) if interactive => {
            println!("{}{}", model_prompt(&session.config().model), reply);
            println!();
        }
        Ok(reply) => println!("{}", reply),
        Err(err) if err.is_retryable() => {
            error!("{}, sending the message again may succeed", err)
        }
        Err(err) => error!("{}", err),
    }
}

/// Runs the chat loop until the input ends or the user exits. The session
/// is terminated on the way out.
pub(crate) async fn chat_cmd(keybindings: config::Keybindings, mut session: Session) {
    let interactive = io::stdin().is_terminal();

    let mut source = if interactive {
        LineSource::Interactive(Box::new(Repl::new(keybindings)))
    } else {
        LineSource::Piped(io::stdin().lines())
    };

    if interactive {
        print_banner(&session);
    }

    while let Some(line) = source.next_line() {
        match Input::parse(&line) {
            Input::Empty => continue,
            Input::Command(Command::Exit) => break,
            Input::Command(Command::Clear) => {
                session.reset();
                println!("{}", notice("[conversation cleared]"));
            }
            Input::Command(Command::History) => {
                println!("{}", notice(&describe_history(&session)));
            }
            Input::Command(Command::Unknown(command)) => {
                warn!(
                    "unknown command {}, available commands: {}",
                    command,
                    COMMANDS.join(", ")
                );
            }
            Input::Text(text) => run_turn(&mut session, &text, interactive).await,
        }
    }

    tracing::debug!(messages = session.history().len(), "chat ended");

    session.terminate();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::SessionConfig;
    use crate::providers::{ChatProvider, ChatRequest, Completion, Error};
    use async_trait::async_trait;

    struct EchoProvider;

    #[async_trait]
    impl ChatProvider for EchoProvider {
        async fn complete(&self, request: &ChatRequest<'_>) -> Result<Completion, Error> {
            let last = request.messages.last().unwrap();

            let body = serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": last.content}}]
            });

            Completion::from_body(body.to_string())
        }
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(Input::parse("   "), Input::Empty);
        assert_eq!(Input::parse(" hello "), Input::Text("hello".to_string()));
        assert_eq!(Input::parse("/exit"), Input::Command(Command::Exit));
        assert_eq!(Input::parse("/quit"), Input::Command(Command::Exit));
        assert_eq!(Input::parse(" /clear"), Input::Command(Command::Clear));
        assert_eq!(Input::parse("/history"), Input::Command(Command::History));
        assert_eq!(
            Input::parse("/help me"),
            Input::Command(Command::Unknown("/help me".to_string()))
        );
    }

    #[test]
    fn test_every_command_is_recognized() {
        for command in COMMANDS {
            assert!(!matches!(
                Input::parse(command),
                Input::Command(Command::Unknown(_)) | Input::Text(_)
            ));
        }
    }

    #[tokio::test]
    async fn test_describe_history() {
        let config = SessionConfig {
            system_prompt: "Echo".to_string(),
            temperature: 0.0,
            model: "echo".to_string(),
        };

        let mut session = Session::new(config, Box::new(EchoProvider));

        assert_eq!(
            describe_history(&session),
            "[1 messages retained: the system prompt and 0 turns]"
        );

        assert_eq!(session.submit("ping").await.unwrap(), "ping");

        assert_eq!(
            describe_history(&session),
            "[3 messages retained: the system prompt and 1 turns]"
        );
    }
}
