//! Task supervision: a shared shutdown signal and a single join barrier.
//!
//! Every long- or short-lived task of the engine is spawned through a
//! `Supervisor`. `stop()` broadcasts shutdown; `wait_stopped()` resolves once
//! every spawned task has exited, including tasks spawned while waiting.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Receiver side of the shutdown broadcast.
///
/// Resolves immediately when shutdown was already signalled before the
/// receiver was created.
pub struct ShutdownSignal {
    rx: broadcast::Receiver<()>,
    running: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Wait for shutdown.
    pub async fn recv(&mut self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        // Closed or lagged both mean the sender is gone or has fired.
        let _ = self.rx.recv().await;
    }

    pub fn is_shutdown(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }
}

/// Owns every spawned engine task.
pub struct Supervisor {
    tasks: Mutex<JoinSet<()>>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            tasks: Mutex::new(JoinSet::new()),
            running: Arc::new(AtomicBool::new(true)),
            shutdown_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// A new receiver for the shutdown broadcast.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.shutdown_tx.subscribe(),
            running: Arc::clone(&self.running),
        }
    }

    /// Spawn `fut` under supervision. Must be called within a tokio runtime.
    ///
    /// Tasks spawned after `stop()` are still tracked; they observe the
    /// shutdown through their `ShutdownSignal` and exit on their own.
    /// Tasks that already finished are joined first.
    pub fn spawn<F>(&self, name: impl Into<String>, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let mut tasks = self.lock_tasks();
        reap_finished(&mut tasks);
        tasks.spawn(async move {
            debug!("Task {} started", name);
            fut.await;
            debug!("Task {} exited", name);
        });
    }

    /// Number of tasks still running.
    pub fn task_count(&self) -> usize {
        let mut tasks = self.lock_tasks();
        reap_finished(&mut tasks);
        tasks.len()
    }

    /// Signal shutdown to every task. Idempotent.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Shutdown signalled");
            let _ = self.shutdown_tx.send(());
        }
    }

    /// Block until every spawned task exited.
    ///
    /// Task panics are logged here, once, for all tasks.
    pub async fn wait_stopped(&self) {
        loop {
            let mut tasks = std::mem::take(&mut *self.lock_tasks());
            if tasks.is_empty() {
                return;
            }
            while let Some(result) = tasks.join_next().await {
                log_join_result(result);
            }
        }
    }

    /// `wait_stopped` bounded by `grace`; outstanding tasks are aborted when
    /// it elapses. Returns whether every task exited on its own.
    pub async fn wait_stopped_with_grace(&self, grace: Duration) -> bool {
        match tokio::time::timeout(grace, self.wait_stopped()).await {
            Ok(()) => true,
            Err(_) => {
                warn!("Tasks still running after {:?}, aborting", grace);
                // The set being drained by the timed-out future was dropped,
                // which aborts its tasks; abort whatever was spawned since.
                let mut tasks = std::mem::take(&mut *self.lock_tasks());
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                false
            }
        }
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        // A poisoned lock only means a panic happened while spawning; the
        // set itself is still usable.
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Join every task of `tasks` that already exited, without waiting.
fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        log_join_result(result);
    }
}

fn log_join_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!("Supervised task panicked: {}", e);
        } else if !e.is_cancelled() {
            warn!("Supervised task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_wait_stopped_joins_all_tasks() {
        let supervisor = Supervisor::new();
        let done = Arc::new(AtomicUsize::new(0));

        for i in 0..4 {
            let done = Arc::clone(&done);
            supervisor.spawn(format!("task-{}", i), async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        supervisor.wait_stopped().await;
        assert_eq!(done.load(Ordering::SeqCst), 4);
        assert_eq!(supervisor.task_count(), 0);
    }

    #[tokio::test]
    async fn test_finished_tasks_are_not_counted() {
        let supervisor = Supervisor::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        for i in 0..50 {
            let tx = tx.clone();
            supervisor.spawn(format!("short-{}", i), async move {
                let _ = tx.send(());
            });
        }
        for _ in 0..50 {
            rx.recv().await.unwrap();
        }

        // Each task has sent; give them a moment to actually return.
        tokio::time::timeout(Duration::from_secs(2), async {
            while supervisor.task_count() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("finished tasks are reaped");

        supervisor.spawn("panics", async { panic!("boom") });
        tokio::time::sleep(Duration::from_millis(20)).await;
        supervisor.spawn("after", async {});
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(supervisor.task_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_wakes_waiting_tasks() {
        let supervisor = Supervisor::new();
        let mut signal = supervisor.shutdown_signal();
        supervisor.spawn("waiter", async move {
            signal.recv().await;
        });

        supervisor.stop();
        let clean = supervisor
            .wait_stopped_with_grace(Duration::from_secs(1))
            .await;
        assert!(clean);
        assert!(!supervisor.is_running());
    }

    #[tokio::test]
    async fn test_signal_created_after_stop_resolves() {
        let supervisor = Supervisor::new();
        supervisor.stop();
        supervisor.stop();

        let mut signal = supervisor.shutdown_signal();
        assert!(signal.is_shutdown());
        tokio::time::timeout(Duration::from_millis(100), signal.recv())
            .await
            .expect("signal resolves after stop");
    }

    #[tokio::test]
    async fn test_grace_aborts_stuck_tasks() {
        let supervisor = Supervisor::new();
        supervisor.spawn("stuck", async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        supervisor.stop();
        let clean = supervisor
            .wait_stopped_with_grace(Duration::from_millis(50))
            .await;
        assert!(!clean);
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_break_barrier() {
        let supervisor = Supervisor::new();
        supervisor.spawn("boom", async {
            panic!("boom");
        });
        supervisor.spawn("fine", async {});

        supervisor.wait_stopped().await;
        assert_eq!(supervisor.task_count(), 0);
    }

    #[tokio::test]
    async fn test_tasks_spawned_while_waiting_are_joined() {
        let supervisor = Arc::new(Supervisor::new());
        let done = Arc::new(AtomicBool::new(false));

        let inner = Arc::clone(&supervisor);
        let flag = Arc::clone(&done);
        supervisor.spawn("parent", async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            inner.spawn("child", async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                flag.store(true, Ordering::SeqCst);
            });
        });

        supervisor.wait_stopped().await;
        assert!(done.load(Ordering::SeqCst));
    }
}
