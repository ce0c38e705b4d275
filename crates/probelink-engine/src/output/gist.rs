use std::collections::HashMap;

use serde::Serialize;
use url::Url;

use crate::config::DEFAULT_USER_AGENT;
use crate::error::{EngineError, Result};

const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Serialize)]
struct GistFile<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    files: HashMap<&'a str, GistFile<'a>>,
}

/// Resolves a gist id from a raw id, a `user/id` path, or a full
/// `gist.github.com` URL (with or without scheme, `.git` suffix stripped).
pub fn parse_gist_id(address: &str) -> Result<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Other("gist address is empty".to_owned()));
    }

    if trimmed.contains("gist.github.com") {
        let candidate = ensure_scheme(trimmed);
        let parsed = Url::parse(&candidate)
            .map_err(|e| EngineError::Other(format!("parse gist address {address:?} failed: {e}")))?;
        let path = parsed.path().trim_matches('/');
        if path.is_empty() {
            return Err(EngineError::Other(format!("gist address {address:?} missing gist id")));
        }

        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() == 1 {
            if !is_likely_gist_id(parts[0]) {
                return Err(EngineError::Other(format!("gist address {address:?} missing gist id")));
            }
            return Ok(parts[0].trim_end_matches(".git").to_owned());
        }

        let id = parts.last().unwrap().trim_end_matches(".git");
        if id.is_empty() {
            return Err(EngineError::Other(format!("gist address {address:?} missing gist id")));
        }
        return Ok(id.to_owned());
    }

    if trimmed.contains('/') {
        let id = last_path_segment(trimmed);
        if id.is_empty() {
            return Err(EngineError::Other(format!("gist address {address:?} missing gist id")));
        }
        return Ok(id);
    }

    Ok(trimmed.to_owned())
}

fn ensure_scheme(candidate: &str) -> String {
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        candidate.to_owned()
    } else {
        format!("https://{candidate}")
    }
}

fn last_path_segment(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    trimmed
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim_end_matches(".git")
        .to_owned()
}

fn is_likely_gist_id(value: &str) -> bool {
    value.len() >= 8 && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// PATCHes a gist's file content. Requires a non-empty token and filename.
pub async fn update_gist_file(
    client: &reqwest::Client,
    api_base: Option<&str>,
    token: &str,
    address: &str,
    filename: &str,
    content: &str,
) -> Result<()> {
    if token.is_empty() {
        return Err(EngineError::Other("gist token is empty".to_owned()));
    }
    if filename.is_empty() {
        return Err(EngineError::Other("gist filename is empty".to_owned()));
    }

    let gist_id = parse_gist_id(address)?;
    let base = api_base.unwrap_or(DEFAULT_API_BASE).trim_end_matches('/');

    let mut files = HashMap::new();
    files.insert(filename, GistFile { content });
    let payload = UpdateRequest { files };

    let response = client
        .patch(format!("{base}/gists/{gist_id}"))
        .header(reqwest::header::AUTHORIZATION, format!("token {token}"))
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .header(reqwest::header::USER_AGENT, DEFAULT_USER_AGENT)
        .json(&payload)
        .send()
        .await
        .map_err(EngineError::Network)?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(EngineError::Publish(format!("update gist {gist_id} failed: status {status}, body: {body}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_raw_id() {
        assert_eq!(parse_gist_id("abc12345").unwrap(), "abc12345");
    }

    #[test]
    fn parses_user_slash_id() {
        assert_eq!(parse_gist_id("user/abc12345").unwrap(), "abc12345");
    }

    #[test]
    fn parses_full_url() {
        assert_eq!(
            parse_gist_id("https://gist.github.com/user/abc12345").unwrap(),
            "abc12345"
        );
    }

    #[test]
    fn parses_schemeless_host_with_git_suffix() {
        assert_eq!(
            parse_gist_id("gist.github.com/user/abc12345.git").unwrap(),
            "abc12345"
        );
    }

    #[test]
    fn bare_user_segment_fails_the_gist_id_heuristic() {
        assert!(parse_gist_id("https://gist.github.com/user/").is_err());
    }

    #[test]
    fn empty_address_is_an_error() {
        assert!(parse_gist_id("").is_err());
    }
}
