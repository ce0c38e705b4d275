use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::DEFAULT_USER_AGENT;
use crate::error::{EngineError, Result};

const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Deserialize)]
struct RepoContentResponse {
    sha: String,
}

#[derive(Serialize)]
struct RepoUpdateRequest<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// Resolves `owner`/`repo` from a bare `owner/repo` address or a
/// `github.com/owner/repo[.git]` URL (with or without scheme).
pub fn parse_repo_address(address: &str) -> Result<(String, String)> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Other("repo address is empty".to_owned()));
    }

    if trimmed.contains("github.com") {
        let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_owned()
        } else {
            format!("https://{trimmed}")
        };
        let parsed = Url::parse(&candidate)
            .map_err(|e| EngineError::Other(format!("parse repo address {address:?} failed: {e}")))?;
        return parse_repo_path(parsed.path(), address);
    }

    parse_repo_path(trimmed, address)
}

fn parse_repo_path(path: &str, address: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
    if parts.len() < 2 {
        return Err(EngineError::Other(format!("repo address {address:?} missing owner/repo")));
    }

    let owner = parts[0].trim().to_owned();
    let repo = parts[1].trim().trim_end_matches(".git").to_owned();
    if owner.is_empty() || repo.is_empty() {
        return Err(EngineError::Other(format!("repo address {address:?} missing owner/repo")));
    }

    Ok((owner, repo))
}

/// Percent-encodes a single path segment the way Go's `url.PathEscape`
/// does: everything outside `A-Za-z0-9-_.~` is escaped, with `%20` (not
/// `+`) for spaces, since this is a path component, not a form field.
fn path_escape(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn encode_repo_path(file_path: &str) -> String {
    file_path
        .trim_matches('/')
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(path_escape)
        .collect::<Vec<_>>()
        .join("/")
}

async fn get_repo_file_sha(
    client: &reqwest::Client,
    api_base: &str,
    token: &str,
    owner: &str,
    repo: &str,
    file_path: &str,
    branch: &str,
) -> Result<Option<String>> {
    let mut endpoint = format!("{api_base}/repos/{owner}/{repo}/contents/{}", encode_repo_path(file_path));
    if !branch.is_empty() {
        endpoint.push_str("?ref=");
        endpoint.push_str(&path_escape(branch));
    }

    let response = client
        .get(&endpoint)
        .header(reqwest::header::AUTHORIZATION, format!("token {token}"))
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .header(reqwest::header::USER_AGENT, DEFAULT_USER_AGENT)
        .send()
        .await
        .map_err(EngineError::Network)?;

    if response.status().as_u16() == 404 {
        return Ok(None);
    }
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(EngineError::Publish(format!(
            "get repo file {owner}/{repo}/{file_path} sha failed: status {status}, body: {body}"
        )));
    }

    let parsed: RepoContentResponse = response.json().await.map_err(EngineError::Network)?;
    if parsed.sha.is_empty() {
        return Err(EngineError::Publish(format!(
            "get repo file {owner}/{repo}/{file_path} sha failed: response missing sha"
        )));
    }

    Ok(Some(parsed.sha))
}

/// Two-step publish: fetch the current file SHA (404 means "create new"),
/// then PUT the new content.
pub async fn update_repo_file(
    client: &reqwest::Client,
    api_base: Option<&str>,
    token: &str,
    address: &str,
    file_path: &str,
    branch: &str,
    content: &str,
) -> Result<()> {
    if token.is_empty() {
        return Err(EngineError::Other("repo token is empty".to_owned()));
    }

    let trimmed_path = file_path.trim_start_matches('/').trim();
    if trimmed_path.is_empty() {
        return Err(EngineError::Other("repo file path is empty".to_owned()));
    }

    let (owner, repo) = parse_repo_address(address)?;
    let base = api_base.unwrap_or(DEFAULT_API_BASE).trim_end_matches('/');
    let trimmed_branch = branch.trim();

    let sha = get_repo_file_sha(client, base, token, &owner, &repo, trimmed_path, trimmed_branch).await?;

    let payload = RepoUpdateRequest {
        message: format!("update {trimmed_path} via probelink"),
        content: BASE64.encode(content.as_bytes()),
        sha: sha.as_deref(),
        branch: if trimmed_branch.is_empty() { None } else { Some(trimmed_branch) },
    };

    let endpoint = format!("{base}/repos/{owner}/{repo}/contents/{}", encode_repo_path(trimmed_path));
    let response = client
        .put(&endpoint)
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
        return Err(EngineError::Publish(format!(
            "update repo file {owner}/{repo}/{trimmed_path} failed: status {status}, body: {body}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_slash_repo() {
        assert_eq!(
            parse_repo_address("faceair/clash-speedtest").unwrap(),
            ("faceair".to_owned(), "clash-speedtest".to_owned())
        );
    }

    #[test]
    fn parses_full_github_url_with_git_suffix() {
        assert_eq!(
            parse_repo_address("https://github.com/faceair/clash-speedtest.git").unwrap(),
            ("faceair".to_owned(), "clash-speedtest".to_owned())
        );
    }

    #[test]
    fn bare_owner_with_no_slash_is_an_error() {
        assert!(parse_repo_address("faceair").is_err());
    }
}
