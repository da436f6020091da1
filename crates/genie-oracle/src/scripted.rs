//! A scripted [`Oracle`] for tests.
//!
//! Replies are queued per request kind and handed out in order. A reply
//! can also be *gated*: the call stays pending until the test releases it,
//! which is how concurrent completions are driven in a chosen order.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use genie_types::{AuraState, Classification, Fusion, OracleRequest};
use tokio::sync::oneshot;

use crate::client::Oracle;
use crate::error::OracleError;

/// One queued reply.
enum Reply<T> {
    Ready(Result<T, OracleError>),
    Gated(oneshot::Receiver<Result<T, OracleError>>),
}

/// Handle that releases a gated reply.
pub type Gate<T> = oneshot::Sender<Result<T, OracleError>>;

#[derive(Default)]
struct Script {
    classify: VecDeque<Reply<Classification>>,
    fuse: VecDeque<Reply<Fusion>>,
    materialize: VecDeque<Reply<AuraState>>,
    calls: Vec<OracleRequest>,
}

/// An [`Oracle`] that answers from a script.
///
/// An empty queue answers with [`OracleError::Unreachable`].
#[derive(Default)]
pub struct ScriptedOracle {
    script: Mutex<Script>,
}

impl ScriptedOracle {
    /// Create an oracle with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next `classify` call.
    pub fn push_classify(&self, reply: Result<Classification, OracleError>) {
        self.with_script(|s| s.classify.push_back(Reply::Ready(reply)));
    }

    /// Queue the answer for the next `fuse` call.
    pub fn push_fuse(&self, reply: Result<Fusion, OracleError>) {
        self.with_script(|s| s.fuse.push_back(Reply::Ready(reply)));
    }

    /// Queue the answer for the next `materialize` call.
    pub fn push_materialize(&self, reply: Result<AuraState, OracleError>) {
        self.with_script(|s| s.materialize.push_back(Reply::Ready(reply)));
    }

    /// Queue a `classify` answer that is held until the gate is used.
    pub fn gate_classify(&self) -> Gate<Classification> {
        let (tx, rx) = oneshot::channel();
        self.with_script(|s| s.classify.push_back(Reply::Gated(rx)));
        tx
    }

    /// Queue a `fuse` answer that is held until the gate is used.
    pub fn gate_fuse(&self) -> Gate<Fusion> {
        let (tx, rx) = oneshot::channel();
        self.with_script(|s| s.fuse.push_back(Reply::Gated(rx)));
        tx
    }

    /// Queue a `materialize` answer that is held until the gate is used.
    pub fn gate_materialize(&self) -> Gate<AuraState> {
        let (tx, rx) = oneshot::channel();
        self.with_script(|s| s.materialize.push_back(Reply::Gated(rx)));
        tx
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<OracleRequest> {
        self.with_script(|s| s.calls.clone())
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut script)
    }
}

/// Resolve a popped reply, waiting on its gate if it has one.
async fn resolve<T>(reply: Option<Reply<T>>, kind: &str) -> Result<T, OracleError> {
    match reply {
        Some(Reply::Ready(result)) => result,
        Some(Reply::Gated(rx)) => rx
            .await
            .unwrap_or_else(|_| Err(OracleError::Unreachable(format!("{kind} gate dropped")))),
        None => Err(OracleError::Unreachable(format!("no scripted {kind} reply"))),
    }
}

impl Oracle for ScriptedOracle {
    async fn classify(&self, word: &str) -> Result<Classification, OracleError> {
        let reply = self.with_script(|s| {
            s.calls.push(OracleRequest::Classify {
                word: word.to_owned(),
            });
            s.classify.pop_front()
        });
        resolve(reply, "classify").await
    }

    async fn fuse(&self, label_a: &str, label_b: &str) -> Result<Fusion, OracleError> {
        let reply = self.with_script(|s| {
            s.calls.push(OracleRequest::Fuse {
                label_a: label_a.to_owned(),
                label_b: label_b.to_owned(),
            });
            s.fuse.pop_front()
        });
        resolve(reply, "fuse").await
    }

    async fn materialize(&self, label: &str) -> Result<AuraState, OracleError> {
        let reply = self.with_script(|s| {
            s.calls.push(OracleRequest::Materialize {
                label: label.to_owned(),
            });
            s.materialize.pop_front()
        });
        resolve(reply, "materialize").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_come_out_in_order_and_calls_are_recorded() {
        let oracle = ScriptedOracle::new();
        oracle.push_classify(Ok(Classification::Rejected));
        oracle.push_classify(Err(OracleError::Unreachable("down".to_owned())));

        assert_eq!(oracle.classify("mesa").await, Ok(Classification::Rejected));
        assert!(oracle.classify("cadeira").await.is_err());
        assert_eq!(oracle.calls().len(), 2);
    }

    #[tokio::test]
    async fn empty_script_is_unreachable() {
        let oracle = ScriptedOracle::new();
        let result = oracle.materialize("Paz").await;
        assert!(matches!(result, Err(OracleError::Unreachable(_))));
    }

    #[tokio::test]
    async fn gated_reply_waits_for_release() {
        let oracle = std::sync::Arc::new(ScriptedOracle::new());
        let gate = oracle.gate_fuse();

        let pending = {
            let oracle = std::sync::Arc::clone(&oracle);
            tokio::spawn(async move { oracle.fuse("Raiva", "Medo").await })
        };
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        let fusion = Fusion {
            label: "Pânico".to_owned(),
            emoji: "😱".to_owned(),
            color_hex: "#550000".to_owned(),
        };
        assert!(gate.send(Ok(fusion.clone())).is_ok());
        let result = pending.await.ok();
        assert_eq!(result, Some(Ok(fusion)));
    }
}
