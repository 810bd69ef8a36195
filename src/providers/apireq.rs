//! A utility module with helpers for making API requests.

mod error;

pub(crate) use error::Error as ReqwestError;
pub(crate) use error::ErrorKind as ReqwestErrorKind;
pub(crate) use reqwest::Url;

/// Joins `path` onto `api_base`, keeping every segment of the base. The
/// plain [`Url::join`] would replace the last segment of a base such as
/// `https://api.openai.com/v1`.
pub(crate) fn endpoint_url(api_base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = api_base.clone();

    if !base.path().ends_with('/') {
        let path_with_slash = format!("{}/", base.path());
        base.set_path(&path_with_slash);
    }

    base.join(path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_keeps_base_path() {
        let base = Url::parse("https://api.openai.com/v1").unwrap();

        assert_eq!(
            endpoint_url(&base, "chat/completions").unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );

        let base = Url::parse("https://proxy.example/openai/v1/").unwrap();

        assert_eq!(
            endpoint_url(&base, "/chat/completions").unwrap().as_str(),
            "https://proxy.example/openai/v1/chat/completions"
        );

        let base = Url::parse("http://127.0.0.1:8080").unwrap();

        assert_eq!(
            endpoint_url(&base, "chat/completions").unwrap().as_str(),
            "http://127.0.0.1:8080/chat/completions"
        );
    }
}
