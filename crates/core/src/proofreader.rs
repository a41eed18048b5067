// crates/core/src/proofreader.rs
//! Check orchestration: one active stream at a time, user actions
//! interleaved with deltas.

use std::sync::Arc;

use futures_util::StreamExt;
use proofread_types::ProofreadingConfig;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::llm::factory::create_provider;
use crate::llm::provider::LlmProvider;
use crate::llm::types::{ChatCompletionRequest, LlmError};
use crate::session::{ProofreadSession, UserAction};
use crate::transport::{self, DeltaStream, StreamEvent};

/// Owns the provider and the cancellation handle of the running check.
pub struct Proofreader {
    provider: Arc<dyn LlmProvider>,
    active: Option<CancellationToken>,
}

impl Proofreader {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            active: None,
        }
    }

    pub fn from_config(config: &ProofreadingConfig) -> Result<Self, LlmError> {
        Ok(Self::new(create_provider(config)?))
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Start checking `session`. A check still in flight is cancelled first.
    pub fn start_check(&mut self, session: ProofreadSession, request: ChatCompletionRequest) -> CheckRun {
        self.abort();
        let cancel = CancellationToken::new();
        self.active = Some(cancel.clone());
        tracing::debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            input_chars = session.text().chars().count(),
            "starting check"
        );
        let stream = transport::open(self.provider.clone(), request, cancel.clone());
        CheckRun {
            session,
            stream,
            cancel,
        }
    }

    /// Cancel the running check, if any. Safe to call at any time.
    pub fn abort(&mut self) {
        if let Some(token) = self.active.take() {
            token.cancel();
        }
    }

    /// True while the most recent check's stream is still being consumed.
    pub fn is_checking(&self) -> bool {
        self.active.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

/// A started check. Drive it with [`CheckRun::run`].
pub struct CheckRun {
    session: ProofreadSession,
    stream: DeltaStream,
    cancel: CancellationToken,
}

impl CheckRun {
    /// Handle that aborts this check when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Consume the stream until it ends, applying user actions between
    /// deltas. `on_update` sees the session after every change.
    pub async fn run<F>(mut self, mut actions: mpsc::Receiver<UserAction>, mut on_update: F) -> ProofreadSession
    where
        F: FnMut(&ProofreadSession),
    {
        self.session.begin();
        on_update(&self.session);

        let mut actions_open = true;
        loop {
            tokio::select! {
                biased;
                action = actions.recv(), if actions_open => match action {
                    Some(action) => {
                        self.session.apply(action);
                        on_update(&self.session);
                    }
                    None => actions_open = false,
                },
                event = self.stream.next() => {
                    match event {
                        Some(Ok(StreamEvent::Delta(buffer))) => {
                            self.session.ingest(&buffer);
                        }
                        Some(Ok(StreamEvent::Finished(outcome))) => {
                            // Failure is recorded on the session.
                            let _ = self.session.complete(outcome);
                        }
                        Some(Err(e)) => self.session.fail(e),
                        None => self
                            .session
                            .fail(LlmError::Network("stream closed without completing".into())),
                    }
                    on_update(&self.session);
                    if self.session.phase().is_finished() {
                        break;
                    }
                }
            }
        }
        // The stream is done either way; releases the proofreader's handle.
        self.cancel.cancel();
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use pretty_assertions::assert_eq;
    use proofread_types::SessionPhase;

    fn issue(original: &str, suggestion: &str) -> String {
        format!(r#"{{"original":"{original}","suggestion":"{suggestion}","reason":"r","category":"错别字"}}"#)
    }

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest::proofreading("test", "sys", "text")
    }

    #[tokio::test]
    async fn test_abort_after_two_of_five_issues() {
        let objects: Vec<String> = ["甲", "乙", "丙", "丁", "戊"].iter().map(|c| issue(c, "X")).collect();
        let fragments: Vec<String> = std::iter::once(r#"{"issues":["#.to_string())
            .chain(objects.iter().enumerate().map(|(i, o)| if i == 4 { format!("{o}]}}") } else { format!("{o},") }))
            .collect();
        let provider = ScriptedProvider::fragments(fragments.iter().map(String::as_str));

        let mut proofreader = Proofreader::new(Arc::new(provider));
        let run = proofreader.start_check(ProofreadSession::new("甲乙丙丁戊"), request());
        let cancel = run.cancel_token();
        let (_tx, rx) = mpsc::channel(8);

        let session = run
            .run(rx, move |s| {
                if s.board().issues().len() == 2 {
                    cancel.cancel();
                }
            })
            .await;

        assert_eq!(session.phase(), SessionPhase::Aborted);
        assert_eq!(session.board().issues().len(), 2);
        assert!(session.error().is_none());
        assert_eq!(session.summary().unresolved, 2);
    }

    #[tokio::test]
    async fn test_actions_applied_between_deltas() {
        let fragments = [
            r#"{"issues":["#.to_string(),
            format!("{},", issue("aaa", "a")),
            format!("{}]}}", issue("ccc", "C")),
        ];
        let provider = ScriptedProvider::fragments(fragments.iter().map(String::as_str));
        let mut proofreader = Proofreader::new(Arc::new(provider));
        let run = proofreader.start_check(ProofreadSession::new("aaa bbb ccc"), request());

        let (tx, rx) = mpsc::channel(8);
        let mut sent = false;
        let session = run
            .run(rx, move |s| {
                if !sent && s.board().issue(1).is_some() {
                    sent = true;
                    tx.try_send(UserAction::Accept(1)).unwrap();
                }
            })
            .await;

        assert_eq!(session.phase(), SessionPhase::Complete);
        assert_eq!(session.text(), "a bbb ccc");
        let c = session.board().issue(2).unwrap();
        assert_eq!((c.start, c.end), (6, 9));
    }

    #[tokio::test]
    async fn test_new_check_cancels_previous() {
        let provider = ScriptedProvider {
            hang_after: true,
            ..ScriptedProvider::new(Vec::<String>::new())
        };
        let mut proofreader = Proofreader::new(Arc::new(provider));
        let first = proofreader.start_check(ProofreadSession::new("a"), request());
        assert!(proofreader.is_checking());

        let second = proofreader.start_check(ProofreadSession::new("b"), request());
        assert!(first.cancel_token().is_cancelled());
        assert!(!second.cancel_token().is_cancelled());

        let (_tx, rx) = mpsc::channel(1);
        let session = first.run(rx, |_| {}).await;
        assert_eq!(session.phase(), SessionPhase::Aborted);

        proofreader.abort();
        assert!(!proofreader.is_checking());
        let (_tx, rx) = mpsc::channel(1);
        assert_eq!(second.run(rx, |_| {}).await.phase(), SessionPhase::Aborted);
    }

    #[tokio::test]
    async fn test_completed_run_is_no_longer_checking() {
        let provider = ScriptedProvider::fragments([r#"{"issues":[]}"#]);
        let mut proofreader = Proofreader::new(Arc::new(provider));
        let run = proofreader.start_check(ProofreadSession::new("abc"), request());
        assert!(proofreader.is_checking());

        let (_tx, rx) = mpsc::channel(1);
        let session = run.run(rx, |_| {}).await;
        assert_eq!(session.phase(), SessionPhase::Complete);
        assert!(!proofreader.is_checking());

        // aborting after completion is harmless
        proofreader.abort();
        assert!(!proofreader.is_checking());
    }

    #[tokio::test]
    async fn test_transport_error_marks_errored() {
        let provider = ScriptedProvider {
            status: Some(401),
            ..ScriptedProvider::new(Vec::<String>::new())
        };
        let mut proofreader = Proofreader::new(Arc::new(provider));
        let run = proofreader.start_check(ProofreadSession::new("abc"), request());
        let (_tx, rx) = mpsc::channel(1);
        let session = run.run(rx, |_| {}).await;
        assert_eq!(session.phase(), SessionPhase::Errored);
        assert!(matches!(session.error(), Some(LlmError::Transport { status: 401, .. })));
    }

    #[test]
    fn test_from_config_requires_key() {
        let err = Proofreader::from_config(&ProofreadingConfig::default()).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(_)));
    }
}
