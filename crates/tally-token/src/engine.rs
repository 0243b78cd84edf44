//! Token measurement engine.
//!
//! Binds one [`Tokenizer`] for its whole lifetime and attaches artifact
//! metadata to raw counts.

use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::backend::{Cl100kTokenizer, Tokenizer};
use crate::error::{TokenError, TokenResult};
use crate::model::{ArtifactCost, ArtifactKind};

#[derive(Clone, Default)]
pub struct Engine {
    tokenizer: Option<Arc<dyn Tokenizer>>,
}

impl Engine {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            tokenizer: Some(tokenizer),
        }
    }

    /// Engine backed by the cl100k_base tokenizer.
    pub fn cl100k() -> TokenResult<Self> {
        Ok(Self::new(Arc::new(Cl100kTokenizer::new()?)))
    }

    pub fn tokenizer_name(&self) -> Option<&str> {
        self.tokenizer.as_deref().map(|t| t.name())
    }

    /// Count tokens in `text`.
    pub async fn measure_text(&self, cancel: &CancellationToken, text: String) -> TokenResult<usize> {
        self.count(cancel, text).await.map(|(cost, _)| cost)
    }

    /// Measure one artifact, keeping its content alongside the count.
    pub async fn measure_artifact(
        &self,
        cancel: &CancellationToken,
        path: &Path,
        kind: ArtifactKind,
        content: String,
    ) -> TokenResult<ArtifactCost> {
        let (cost, raw_content) = self
            .count(cancel, content)
            .await
            .map_err(|e| TokenError::measurement(path, e))?;

        Ok(ArtifactCost {
            path: path.to_path_buf(),
            kind,
            cost,
            raw_content,
        })
    }

    /// Run the tokenizer on the blocking pool, racing it against `cancel`.
    ///
    /// A cancelled count is abandoned; its thread finishes on its own.
    async fn count(&self, cancel: &CancellationToken, text: String) -> TokenResult<(usize, String)> {
        let tokenizer = self
            .tokenizer
            .clone()
            .ok_or_else(|| TokenError::Configuration("no token calculator configured".into()))?;

        if cancel.is_cancelled() {
            return Err(TokenError::Cancelled);
        }
        if text.is_empty() {
            return Ok((0, text));
        }

        let task = tokio::task::spawn_blocking(move || {
            tokenizer.count_tokens(&text).map(|cost| (cost, text))
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TokenError::Cancelled),
            joined = task => joined.map_err(|e| TokenError::Worker(e.to_string()))?,
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tokenizer", &self.tokenizer_name())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Counts characters. Keeps tests independent of a real vocabulary.
    pub struct CharCount;

    impl Tokenizer for CharCount {
        fn name(&self) -> &str {
            "char-count"
        }

        fn count_tokens(&self, text: &str) -> TokenResult<usize> {
            Ok(text.chars().count())
        }
    }

    /// Fails on any text containing the marker.
    pub struct FailOn(pub &'static str);

    impl Tokenizer for FailOn {
        fn name(&self) -> &str {
            "fail-on"
        }

        fn count_tokens(&self, text: &str) -> TokenResult<usize> {
            if text.contains(self.0) {
                return Err(TokenError::Backend(format!("refusing '{}'", self.0)));
            }
            Ok(text.chars().count())
        }
    }

    /// Blocks on text containing `HOLD` until opened; counts characters.
    ///
    /// Waits are capped so a forgotten gate never wedges the runtime.
    #[derive(Clone)]
    pub struct Gate {
        state: Arc<(std::sync::Mutex<bool>, std::sync::Condvar)>,
    }

    impl Gate {
        pub fn closed() -> Self {
            Self {
                state: Arc::new((std::sync::Mutex::new(false), std::sync::Condvar::new())),
            }
        }

        pub fn open(&self) {
            let (lock, cvar) = &*self.state;
            *lock.lock().unwrap() = true;
            cvar.notify_all();
        }
    }

    impl Tokenizer for Gate {
        fn name(&self) -> &str {
            "gate"
        }

        fn count_tokens(&self, text: &str) -> TokenResult<usize> {
            if text.contains("HOLD") {
                let (lock, cvar) = &*self.state;
                let guard = lock.lock().unwrap();
                let _unused = cvar
                    .wait_timeout_while(guard, std::time::Duration::from_secs(5), |open| !*open)
                    .unwrap();
            }
            Ok(text.chars().count())
        }
    }

    pub fn char_engine() -> Engine {
        Engine::new(Arc::new(CharCount))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_engine() {
        let err = Engine::default()
            .measure_text(&CancellationToken::new(), "text".into())
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_measure_text_delegates() {
        let engine = char_engine();
        let cancel = CancellationToken::new();
        assert_eq!(engine.measure_text(&cancel, String::new()).await.unwrap(), 0);
        assert_eq!(engine.measure_text(&cancel, "abc".into()).await.unwrap(), 3);
        assert_eq!(engine.tokenizer_name(), Some("char-count"));
    }

    #[tokio::test]
    async fn test_measure_text_after_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = char_engine().measure_text(&cancel, "abc".into()).await.unwrap_err();
        assert!(matches!(err, TokenError::Cancelled));
    }

    #[tokio::test]
    async fn test_measure_artifact() {
        let cost = char_engine()
            .measure_artifact(
                &CancellationToken::new(),
                Path::new("/fw/tasks/a.md"),
                ArtifactKind::Task,
                "abcd".into(),
            )
            .await
            .unwrap();
        assert_eq!(cost.cost, 4);
        assert_eq!(cost.kind, ArtifactKind::Task);
        assert_eq!(cost.raw_content, "abcd");
    }

    #[tokio::test]
    async fn test_measure_artifact_wraps_backend_error_with_path() {
        let engine = Engine::new(Arc::new(FailOn("BOOM")));
        let err = engine
            .measure_artifact(
                &CancellationToken::new(),
                Path::new("/fw/tasks/bad.md"),
                ArtifactKind::Task,
                "BOOM".into(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Measurement { ref path, .. } if path == Path::new("/fw/tasks/bad.md")));
        assert!(err.to_string().contains("failed to encode text"));
    }

    #[tokio::test]
    async fn test_slow_backend_yields_to_cancellation() {
        let gate = Gate::closed();
        let engine = Engine::new(Arc::new(gate.clone()));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            engine.measure_text(&cancel, "HOLD".into()),
        )
        .await
        .expect("measurement should stop once cancelled");
        gate.open();

        assert!(matches!(outcome, Err(TokenError::Cancelled)));
    }
}
