//! Gateway whose calls stay pending until the test releases them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::{oneshot, Notify};

use fixdesk_shared::{Envelope, RequestBody};

use crate::ports::{GatewayError, RequestGateway};

type Reply = Result<Envelope, GatewayError>;

struct Gate {
    path: String,
    reply: oneshot::Sender<Reply>,
}

/// Every call parks on a oneshot gate keyed by its path. Tests wait for
/// calls to arrive, then settle them in whatever order the scenario needs.
#[derive(Default)]
pub struct GatedGateway {
    gates: Mutex<Vec<Gate>>,
    arrivals: AtomicUsize,
    arrived: Notify,
}

impl GatedGateway {
    /// Resolve once at least `count` calls have arrived in total.
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.arrived.notified();
            if self.arrivals.load(Ordering::SeqCst) >= count {
                return;
            }
            notified.await;
        }
    }

    /// Settle the earliest pending call to `path`. False if none is pending.
    pub fn release_oldest(&self, path: &str, reply: Reply) -> bool {
        let index = self.gates().iter().position(|g| g.path == path);
        self.release(index, reply)
    }

    /// Settle the most recent pending call to `path`.
    pub fn release_latest(&self, path: &str, reply: Reply) -> bool {
        let index = self.gates().iter().rposition(|g| g.path == path);
        self.release(index, reply)
    }

    pub fn pending(&self) -> usize {
        self.gates().len()
    }

    fn gates(&self) -> MutexGuard<'_, Vec<Gate>> {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, index: Option<usize>, reply: Reply) -> bool {
        let Some(index) = index else {
            return false;
        };
        let gate = self.gates().remove(index);
        gate.reply.send(reply).is_ok()
    }

    async fn park(&self, path: &str) -> Reply {
        let (reply, settled) = oneshot::channel();
        self.gates().push(Gate {
            path: path.to_string(),
            reply,
        });
        self.arrivals.fetch_add(1, Ordering::SeqCst);
        self.arrived.notify_waiters();

        settled
            .await
            .unwrap_or_else(|_| Err(GatewayError::Transport("gate dropped".into())))
    }
}

#[async_trait]
impl RequestGateway for GatedGateway {
    async fn get(&self, path: &str) -> Result<Envelope, GatewayError> {
        self.park(path).await
    }

    async fn post(&self, path: &str, _body: RequestBody) -> Result<Envelope, GatewayError> {
        self.park(path).await
    }

    async fn put(&self, path: &str, _body: RequestBody) -> Result<Envelope, GatewayError> {
        self.park(path).await
    }

    async fn delete(&self, path: &str) -> Result<Envelope, GatewayError> {
        self.park(path).await
    }
}
