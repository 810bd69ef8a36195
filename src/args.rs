//! Resolution of the session options given on the command line.
//!
//! The session arguments take the shape
//! ```text
//! [-t <temperature> | --temperature <temperature> | --temperature=<temperature>]
//! [-m <model> | --model <model> | --model=<model>]
//! [prompt words...]
//! ```
//! Flags and prompt words may be interleaved. Anything that is not one of the
//! flags above is a word of the system prompt, including unknown flags.

pub(crate) const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that replies in English.";

pub(crate) const DEFAULT_TEMPERATURE: f64 = 0.7;

const MIN_TEMPERATURE: f64 = 0.0;
const MAX_TEMPERATURE: f64 = 2.0;

#[derive(thiserror::Error, Debug, PartialEq)]
pub(crate) enum Error {
    /// A flag was given in its separated form as the last token
    #[error("missing value for flag {flag}")]
    MissingValue { flag: String },

    /// The temperature could not be parsed as a number
    #[error("invalid temperature \"{value}\"")]
    InvalidTemperature { value: String },

    #[error("temperature must be in the range 0.0 to 2.0, got {value}")]
    TemperatureOutOfRange { value: f64 },

    #[error("invalid model: the model name is blank")]
    InvalidModel,
}

/// The resolved options of a conversation session
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SessionConfig {
    pub system_prompt: String,
    pub temperature: f64,
    pub model: String,
}

#[derive(Debug, Clone, Copy)]
enum Flag {
    Temperature,
    Model,
}

impl Flag {
    /// Matches the `--flag=value` form
    fn inline(token: &str) -> Option<(Flag, &str)> {
        if let Some(value) = token.strip_prefix("--temperature=") {
            Some((Flag::Temperature, value))
        } else {
            token
                .strip_prefix("--model=")
                .map(|value| (Flag::Model, value))
        }
    }

    /// Matches the `-f value` and `--flag value` forms
    fn separated(token: &str) -> Option<Flag> {
        match token {
            "-t" | "--temperature" => Some(Flag::Temperature),
            "-m" | "--model" => Some(Flag::Model),
            _ => None,
        }
    }
}

fn parse_temperature(value: &str) -> Result<f64, Error> {
    value.parse::<f64>().map_err(|_| Error::InvalidTemperature {
        value: value.to_string(),
    })
}

fn parse_model(value: &str) -> Result<String, Error> {
    let model = value.trim();

    if model.is_empty() {
        Err(Error::InvalidModel)
    } else {
        Ok(model.to_string())
    }
}

/// Resolves the session configuration from the argument tokens. `default_model`
/// is used unless a model flag is present.
pub(crate) fn resolve<S: AsRef<str>>(
    tokens: &[S],
    default_model: &str,
) -> Result<SessionConfig, Error> {
    let mut temperature = DEFAULT_TEMPERATURE;
    let mut model = default_model.to_string();
    let mut prompt_parts: Vec<&str> = Vec::new();

    let mut tokens = tokens.iter().map(AsRef::as_ref);

    while let Some(token) = tokens.next() {
        let (flag, value) = if let Some(inline) = Flag::inline(token) {
            inline
        } else if let Some(flag) = Flag::separated(token) {
            let value = tokens.next().ok_or_else(|| Error::MissingValue {
                flag: token.to_string(),
            })?;

            (flag, value)
        } else {
            prompt_parts.push(token);
            continue;
        };

        match flag {
            Flag::Temperature => temperature = parse_temperature(value)?,
            Flag::Model => model = parse_model(value)?,
        }
    }

    // NaN fails the containment check as well
    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        return Err(Error::TemperatureOutOfRange { value: temperature });
    }

    let system_prompt = if prompt_parts.is_empty() {
        DEFAULT_SYSTEM_PROMPT.to_string()
    } else {
        prompt_parts.join(" ")
    };

    Ok(SessionConfig {
        system_prompt,
        temperature,
        model,
    })
}

/// Usage text shown alongside argument errors
pub(crate) fn usage() -> String {
    format!(
        "\
Usage:
  xtalk [--color <auto|on|off>] [--config <path>] [options] [system prompt...]

Options:
  -m, --model <name>          Model to chat with (defaults to the configured model)
  --model=<name>              Alternative form
  -t, --temperature <value>   Sampling temperature, {MIN_TEMPERATURE:.1} to {MAX_TEMPERATURE:.1} (default {DEFAULT_TEMPERATURE})
  --temperature=<value>       Alternative form

Examples:
  xtalk -m gpt-4o -t 0.5 You are a terse assistant
  xtalk --model=gpt-4-turbo --temperature=1.2 Answer creatively"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "gpt-4o-mini";

    fn resolve_tokens(tokens: &[&str]) -> Result<SessionConfig, Error> {
        resolve(tokens, MODEL)
    }

    #[test]
    fn test_defaults() {
        let config = resolve_tokens(&[]).unwrap();

        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.model, MODEL);
    }

    #[test]
    fn test_flags_and_prompt_words() {
        let config = resolve_tokens(&["-t", "0.5", "Be", "terse"]).unwrap();

        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.system_prompt, "Be terse");
        assert_eq!(config.model, MODEL);
    }

    #[test]
    fn test_all_flag_forms() {
        for tokens in [
            ["-t", "1.5", "-m", "gpt-4o"].as_slice(),
            ["--temperature", "1.5", "--model", "gpt-4o"].as_slice(),
            ["--temperature=1.5", "--model=gpt-4o"].as_slice(),
        ] {
            let config = resolve_tokens(tokens).unwrap();

            assert_eq!(config.temperature, 1.5);
            assert_eq!(config.model, "gpt-4o");
            assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        }
    }

    #[test]
    fn test_temperatures_in_range() {
        for value in ["0", "0.0", "0.25", "1", "1.999", "2.0"] {
            let config = resolve_tokens(&["-t", value]).unwrap();

            assert_eq!(config.temperature, value.parse::<f64>().unwrap());
        }
    }

    #[test]
    fn test_temperatures_out_of_range() {
        assert_eq!(
            resolve_tokens(&["-t", "2.5"]),
            Err(Error::TemperatureOutOfRange { value: 2.5 })
        );
        assert_eq!(
            resolve_tokens(&["--temperature=-0.1"]),
            Err(Error::TemperatureOutOfRange { value: -0.1 })
        );
        assert!(matches!(
            resolve_tokens(&["-t", "NaN"]),
            Err(Error::TemperatureOutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_temperature() {
        assert_eq!(
            resolve_tokens(&["-t", "warm"]),
            Err(Error::InvalidTemperature {
                value: "warm".to_string()
            })
        );
    }

    #[test]
    fn test_missing_values() {
        for flag in ["-t", "--temperature", "-m", "--model"] {
            assert_eq!(
                resolve_tokens(&["Be", "terse", flag]),
                Err(Error::MissingValue {
                    flag: flag.to_string()
                })
            );
        }
    }

    #[test]
    fn test_blank_model() {
        assert_eq!(resolve_tokens(&["-m", "  "]), Err(Error::InvalidModel));
        assert_eq!(resolve_tokens(&["--model="]), Err(Error::InvalidModel));
    }

    #[test]
    fn test_unknown_flags_are_prompt_words() {
        let config = resolve_tokens(&["--verbose", "Speak", "-x", "plainly"]).unwrap();

        assert_eq!(config.system_prompt, "--verbose Speak -x plainly");
    }

    #[test]
    fn test_last_flag_wins() {
        let config = resolve_tokens(&["-t", "3.0", "Hi", "--temperature=0.2"]).unwrap();

        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.system_prompt, "Hi");
    }
}
