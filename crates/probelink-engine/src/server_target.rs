use url::Url;

use crate::config::SpeedMode;
use crate::error::{EngineError, Result};

/// What kind of speed-test origin a `server_url` points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTarget {
    /// Supports the `/__down` and `/__up` speed-test contract.
    DownloadServer { base_url: String },
    /// A single resource URL; upload is unavailable against it.
    DirectDownload { download_url: String },
}

/// Classifies `input` and, if `mode` is [`SpeedMode::Full`] but the target
/// turns out to be a direct download, downgrades it to
/// [`SpeedMode::Download`] since there is no `/__up` endpoint to use.
pub fn resolve(input: &str, mode: SpeedMode) -> Result<(ServerTarget, SpeedMode)> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidServerUrl {
            input: input.to_owned(),
            reason: "server url is empty".to_owned(),
        });
    }

    let parsed = Url::parse(trimmed).map_err(|e| EngineError::InvalidServerUrl {
        input: input.to_owned(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(EngineError::InvalidServerUrl {
                input: input.to_owned(),
                reason: format!("unsupported scheme {other:?}"),
            });
        }
    }

    if parsed.host_str().is_none() {
        return Err(EngineError::InvalidServerUrl {
            input: input.to_owned(),
            reason: "missing host".to_owned(),
        });
    }

    let path_is_empty = parsed.path().trim_matches('/').is_empty();
    let query_is_empty = parsed.query().is_none();
    let fragment_is_empty = parsed.fragment().is_none();

    let target = if path_is_empty && query_is_empty && fragment_is_empty {
        ServerTarget::DownloadServer {
            base_url: trimmed.trim_end_matches('/').to_owned(),
        }
    } else {
        ServerTarget::DirectDownload {
            download_url: trimmed.to_owned(),
        }
    };

    let resolved_mode = match (&target, mode) {
        (ServerTarget::DirectDownload { .. }, SpeedMode::Full) => SpeedMode::Download,
        _ => mode,
    };

    Ok((target, resolved_mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_as_download_server() {
        let (target, _) = resolve("https://example.com/", SpeedMode::Fast).unwrap();
        assert_eq!(
            target,
            ServerTarget::DownloadServer {
                base_url: "https://example.com".to_owned()
            }
        );
    }

    #[test]
    fn query_only_is_direct_download() {
        let (target, _) = resolve("https://example.com?bytes=1024", SpeedMode::Fast).unwrap();
        assert_eq!(
            target,
            ServerTarget::DirectDownload {
                download_url: "https://example.com?bytes=1024".to_owned()
            }
        );
    }

    #[test]
    fn unsupported_scheme_is_an_error() {
        assert!(resolve("ftp://example.com", SpeedMode::Fast).is_err());
    }

    #[test]
    fn direct_download_downgrades_full_mode() {
        let (target, mode) = resolve("https://example.com/down?bytes=1", SpeedMode::Full).unwrap();
        assert!(matches!(target, ServerTarget::DirectDownload { .. }));
        assert_eq!(mode, SpeedMode::Download);
    }

    #[test]
    fn download_server_keeps_full_mode() {
        let (target, mode) = resolve("https://example.com", SpeedMode::Full).unwrap();
        assert!(matches!(target, ServerTarget::DownloadServer { .. }));
        assert_eq!(mode, SpeedMode::Full);
    }
}
