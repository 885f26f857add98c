//! Upstream base URL handling.

use axum::http::uri::PathAndQuery;
use url::Url;

use crate::error::ProxyError;

/// The single upstream every request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    base: Url,
}

impl UpstreamTarget {
    /// Parse an upstream base URL. Only `http` and `https` are accepted.
    pub fn parse(raw: &str) -> Result<Self, ProxyError> {
        let base = Url::parse(raw).map_err(|e| ProxyError::InvalidUpstream(format!("{raw}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ProxyError::InvalidUpstream(format!(
                "{raw}: unsupported scheme '{}'",
                base.scheme()
            )));
        }
        Ok(Self { base })
    }

    /// Build the upstream URL for an inbound path and query.
    ///
    /// The base path is prefixed to the request path with exactly one slash
    /// between them; base and request queries are joined with `&`.
    pub fn join(&self, path_and_query: Option<&PathAndQuery>) -> Url {
        let request_path = path_and_query.map_or("/", PathAndQuery::path);
        let request_query = path_and_query.and_then(PathAndQuery::query);

        let mut url = self.base.clone();
        url.set_path(&join_paths(self.base.path(), request_path));

        let query = match (self.base.query(), request_query) {
            (Some(base), Some(req)) if !base.is_empty() && !req.is_empty() => {
                Some(format!("{base}&{req}"))
            }
            (Some(base), _) if !base.is_empty() => Some(base.to_string()),
            (_, Some(req)) if !req.is_empty() => Some(req.to_string()),
            _ => None,
        };
        url.set_query(query.as_deref());
        url
    }
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}
