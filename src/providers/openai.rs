//! An umbrella module for the OpenAI-compatible provider

mod api;
mod provider;

pub(crate) use self::provider::OpenAIProvider;
