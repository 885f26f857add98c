//! File-backed grammar provider.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Grammar, GrammarOrigin};
use crate::ports::{GrammarProvider, InterceptEvent, InterceptEventSink};

/// Environment variable naming the grammar file.
pub const GRAMMAR_PATH_ENV: &str = "GRAMMAR_FILE_PATH";

/// Grammar file used when neither a flag nor the environment names one.
pub const DEFAULT_GRAMMAR_PATH: &str = "/app/cline.gbnf";

/// Pick the grammar file path: explicit value, then environment, then default.
///
/// Empty values count as unset.
pub fn resolve_grammar_path(explicit: Option<&Path>, env_value: Option<&str>) -> PathBuf {
    if let Some(path) = explicit
        && !path.as_os_str().is_empty()
    {
        return path.to_path_buf();
    }
    if let Some(value) = env_value
        && !value.is_empty()
    {
        return PathBuf::from(value);
    }
    PathBuf::from(DEFAULT_GRAMMAR_PATH)
}

/// Reads the grammar from a file on every call.
///
/// There is no caching, so edits to the file apply to the next request.
/// A missing or unreadable file yields [`Grammar::fallback`] and a
/// [`InterceptEvent::GrammarFallback`] event.
pub struct FileGrammarProvider {
    path: PathBuf,
    events: Arc<dyn InterceptEventSink>,
}

impl FileGrammarProvider {
    pub fn new(path: impl Into<PathBuf>, events: Arc<dyn InterceptEventSink>) -> Self {
        Self {
            path: path.into(),
            events,
        }
    }
}

#[async_trait]
impl GrammarProvider for FileGrammarProvider {
    async fn load(&self) -> Grammar {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Grammar::new(
                String::from_utf8_lossy(&bytes).into_owned(),
                GrammarOrigin::File,
            ),
            Err(e) => {
                self.events.emit(InterceptEvent::GrammarFallback {
                    path: self.path.clone(),
                    reason: e.to_string(),
                });
                Grammar::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FALLBACK_GRAMMAR;
    use crate::testing::RecordingEventSink;

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let path = resolve_grammar_path(Some(Path::new("/etc/flag.gbnf")), Some("/env.gbnf"));
        assert_eq!(path, PathBuf::from("/etc/flag.gbnf"));
    }

    #[test]
    fn test_resolve_falls_back_to_env_then_default() {
        assert_eq!(
            resolve_grammar_path(None, Some("/env.gbnf")),
            PathBuf::from("/env.gbnf")
        );
        assert_eq!(
            resolve_grammar_path(Some(Path::new("")), Some("")),
            PathBuf::from(DEFAULT_GRAMMAR_PATH)
        );
        assert_eq!(
            resolve_grammar_path(None, None),
            PathBuf::from(DEFAULT_GRAMMAR_PATH)
        );
    }

    #[tokio::test]
    async fn test_load_returns_file_contents_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.gbnf");
        std::fs::write(&path, "root ::= \"X\"\n").unwrap();

        let sink = Arc::new(RecordingEventSink::new());
        let provider = FileGrammarProvider::new(&path, sink.clone());
        let grammar = provider.load().await;

        assert_eq!(grammar.as_str(), "root ::= \"X\"\n");
        assert_eq!(grammar.origin(), GrammarOrigin::File);
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_uses_fallback_and_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.gbnf");

        let sink = Arc::new(RecordingEventSink::new());
        let provider = FileGrammarProvider::new(&path, sink.clone());
        let grammar = provider.load().await;

        assert_eq!(grammar.as_str(), FALLBACK_GRAMMAR);
        assert_eq!(grammar.origin(), GrammarOrigin::Fallback);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            InterceptEvent::GrammarFallback { path: p, .. } if *p == path
        ));
    }

    #[tokio::test]
    async fn test_file_changes_apply_without_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.gbnf");
        let provider = FileGrammarProvider::new(&path, Arc::new(RecordingEventSink::new()));

        std::fs::write(&path, "root ::= \"A\"").unwrap();
        assert_eq!(provider.load().await.as_str(), "root ::= \"A\"");

        std::fs::write(&path, "root ::= \"B\"").unwrap();
        assert_eq!(provider.load().await.as_str(), "root ::= \"B\"");

        std::fs::remove_file(&path).unwrap();
        assert_eq!(provider.load().await.origin(), GrammarOrigin::Fallback);
    }
}
