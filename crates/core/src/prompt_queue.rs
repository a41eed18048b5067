// crates/core/src/prompt_queue.rs
//! FIFO queue of text prompts awaiting a user answer.
//!
//! A requester enqueues a prompt and awaits the answer; the UI shows the
//! front request via [`PromptQueue::current`] and resolves it with
//! [`PromptQueue::respond`]. Only the front request is visible.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::{oneshot, Notify};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub id: u64,
    pub message: String,
    pub default_value: Option<String>,
}

struct Pending {
    request: PromptRequest,
    reply: oneshot::Sender<Option<String>>,
}

#[derive(Default)]
pub struct PromptQueue {
    queue: Mutex<VecDeque<Pending>>,
    next_id: AtomicU64,
    arrived: Notify,
}

impl PromptQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Pending>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue a prompt. The returned future resolves with the answer, or
    /// `None` when the prompt is dismissed or the queue is dropped.
    pub fn request(
        &self,
        message: &str,
        default_value: Option<String>,
    ) -> impl Future<Output = Option<String>> + Send + 'static {
        let (reply, answer) = oneshot::channel();
        let request = PromptRequest {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.to_string(),
            default_value,
        };
        self.queue().push_back(Pending { request, reply });
        self.arrived.notify_waiters();
        async move { answer.await.ok().flatten() }
    }

    /// The visible request, if any.
    pub fn current(&self) -> Option<PromptRequest> {
        self.queue().front().map(|p| p.request.clone())
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    /// Resolve the front request and advance. Returns false when the queue
    /// was empty.
    pub fn respond(&self, answer: Option<String>) -> bool {
        let Some(front) = self.queue().pop_front() else {
            return false;
        };
        if front.reply.send(answer).is_err() {
            tracing::debug!(prompt_id = front.request.id, "prompt answered after requester went away");
        }
        true
    }

    /// Wait until a request is visible and return it.
    pub async fn next_request(&self) -> PromptRequest {
        loop {
            let arrived = self.arrived.notified();
            if let Some(request) = self.current() {
                return request;
            }
            arrived.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fifo_one_visible_at_a_time() {
        let queue = PromptQueue::new();
        let first = queue.request("组名？", None);
        let second = queue.request("新组名？", Some("默认".into()));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.current().unwrap().message, "组名？");

        assert!(queue.respond(Some("产品".into())));
        assert_eq!(
            queue.current().unwrap().default_value.as_deref(),
            Some("默认")
        );
        assert!(queue.respond(None));
        assert!(!queue.respond(None));

        assert_eq!(first.await, Some("产品".to_string()));
        assert_eq!(second.await, None);
    }

    #[tokio::test]
    async fn test_ui_drains_concurrent_requests() {
        let queue = Arc::new(PromptQueue::new());

        let ui = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                for _ in 0..3 {
                    let req = queue.next_request().await;
                    queue.respond(Some(format!("answer-{}", req.message)));
                }
            })
        };

        let answers = futures_util::future::join_all(
            ["a", "b", "c"].map(|m| queue.request(m, None)),
        )
        .await;
        ui.await.unwrap();
        assert_eq!(
            answers,
            vec![
                Some("answer-a".to_string()),
                Some("answer-b".to_string()),
                Some("answer-c".to_string())
            ]
        );
    }

    #[test]
    fn test_answer_pending_until_respond() {
        let queue = PromptQueue::new();
        let mut answer = tokio_test::task::spawn(queue.request("q", None));
        tokio_test::assert_pending!(answer.poll());

        assert!(queue.respond(Some("a".into())));
        assert!(answer.is_woken());
        tokio_test::assert_ready_eq!(answer.poll(), Some("a".to_string()));
    }

    #[tokio::test]
    async fn test_dropped_requester_does_not_block_queue() {
        let queue = PromptQueue::new();
        drop(queue.request("gone", None));
        let kept = queue.request("kept", None);
        assert!(queue.respond(Some("x".into())));
        assert!(queue.respond(Some("y".into())));
        assert_eq!(kept.await, Some("y".to_string()));
    }
}
