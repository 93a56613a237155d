//! The thread applying deferred mutations in admission order.
use crate::{map::Shared, mutation::Mutation};
use crossbeam::channel::{self, Receiver, SendError, Sender};
use std::{
    hash::{BuildHasher, Hash},
    io,
    sync::Arc,
    thread::{self, JoinHandle},
};

enum Message<K, V> {
    Apply(Mutation<K, V>),
    Shutdown,
}

/// Owns the apply thread of one map. Dropping it applies everything still queued and joins the
/// thread.
pub(crate) struct Worker<K, V, S> {
    sender: Sender<Message<K, V>>,
    handle: Option<JoinHandle<()>>,
    shared: Arc<Shared<K, V, S>>,
}

impl<K, V, S> Worker<K, V, S>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: BuildHasher + Send + Sync + 'static,
{
    pub fn spawn(name: String, shared: Arc<Shared<K, V, S>>) -> io::Result<Self> {
        let (sender, receiver) = channel::unbounded();
        let worker_shared = shared.clone();
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || run(&worker_shared, receiver))?;
        Ok(Worker {
            sender,
            handle: Some(handle),
            shared,
        })
    }

    /// Queues an admitted mutation. The channel is FIFO, so mutations apply in the order they
    /// were submitted.
    pub fn submit(&self, mutation: Mutation<K, V>) {
        if let Err(SendError(Message::Apply(mutation))) = self.sender.send(Message::Apply(mutation))
        {
            log::error!(
                "apply worker is gone, applying {} on the caller",
                mutation.name()
            );
            self.shared.apply(mutation);
        }
    }
}

fn run<K: Hash + Eq, V, S: BuildHasher>(shared: &Shared<K, V, S>, receiver: Receiver<Message<K, V>>) {
    log::debug!("apply worker started");
    for message in receiver {
        match message {
            Message::Apply(mutation) => shared.apply(mutation),
            Message::Shutdown => break,
        }
    }
    log::debug!("apply worker stopped");
}

impl<K, V, S> Drop for Worker<K, V, S> {
    fn drop(&mut self) {
        // Queued behind every admitted mutation.
        let _ = self.sender.send(Message::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("apply worker panicked");
            }
        }
    }
}
