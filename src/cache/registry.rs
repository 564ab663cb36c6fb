//! Per-key execution contexts
//!
//! Each resource id gets one [`ExecutionContext`]: a FIFO job queue drained
//! by a dedicated dispatcher task. The dispatcher takes a per-key read/write
//! lock guard for every job in submission order and only then spawns the job
//! on the shared runtime, holding the guard until the job finishes:
//!
//! | Job   | Guard     | Runs concurrently with                  |
//! |-------|-----------|-----------------------------------------|
//! | Read  | shared    | other reads on the same key, other keys |
//! | Write | exclusive | other keys only                         |
//!
//! Because guards are acquired in queue order, a write that was submitted
//! without being awaited is still ordered before everything submitted after
//! it on the same key.
//!
//! The [`KeyRegistry`] maps ids to contexts behind its own mutex, so two
//! callers racing on first use of an id always get the same context.

use super::resource::ResourceId;
use crate::error::{RescacheError, RescacheResult};
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, warn};

/// Kind of access a job needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Shared with other reads on the same key
    Read,
    /// Exclusive against every other job on the same key
    Write,
}

struct Job {
    access: Access,
    work: BoxFuture<'static, ()>,
    done: oneshot::Sender<()>,
}

/// Resolves once a submitted job has finished
///
/// Dropping it is fine: the job still runs.
#[derive(Debug)]
pub struct Completion(Option<oneshot::Receiver<()>>);

impl Completion {
    /// A completion that is already resolved
    pub fn ready() -> Self {
        Self(None)
    }

    /// Wait for the job to finish
    ///
    /// Also returns if the job panicked or the runtime shut down first.
    pub async fn wait(self) {
        if let Some(done) = self.0 {
            let _ = done.await;
        }
    }
}

/// Concurrency domain for one resource id
pub struct ExecutionContext {
    id: ResourceId,
    queue: mpsc::UnboundedSender<Job>,
}

impl ExecutionContext {
    fn spawn(id: ResourceId, runtime: &Handle) -> Self {
        let (queue, jobs) = mpsc::unbounded_channel();
        runtime.spawn(dispatch(id.clone(), jobs));
        Self { id, queue }
    }

    /// Resource id this context serializes
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Queue `work` behind every job already submitted to this context
    pub fn submit<F>(&self, access: Access, work: F) -> Completion
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (done, finished) = oneshot::channel();
        let job = Job {
            access,
            work: Box::pin(work),
            done,
        };

        if self.queue.send(job).is_err() {
            warn!(
                "Execution context for {} is closed, dropping {:?} job",
                self.id, access
            );
            return Completion::ready();
        }

        Completion(Some(finished))
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .finish()
    }
}

async fn dispatch(id: ResourceId, mut jobs: mpsc::UnboundedReceiver<Job>) {
    let lock = Arc::new(RwLock::new(()));

    while let Some(job) = jobs.recv().await {
        match job.access {
            Access::Read => {
                let guard = Arc::clone(&lock).read_owned().await;
                tokio::spawn(async move {
                    job.work.await;
                    drop(guard);
                    let _ = job.done.send(());
                });
            }
            Access::Write => {
                let guard = Arc::clone(&lock).write_owned().await;
                tokio::spawn(async move {
                    job.work.await;
                    drop(guard);
                    let _ = job.done.send(());
                });
            }
        }
    }

    debug!("Execution context for {} shut down", id);
}

/// Process-owned table of execution contexts, one per resource id
///
/// Contexts are created on first use and kept for the registry's lifetime.
pub struct KeyRegistry {
    runtime: Handle,
    contexts: Mutex<HashMap<ResourceId, Arc<ExecutionContext>>>,
}

impl KeyRegistry {
    /// Create a registry driven by the current tokio runtime
    pub fn new() -> RescacheResult<Self> {
        let runtime = Handle::try_current().map_err(|_| RescacheError::NoRuntime)?;
        Ok(Self::with_handle(runtime))
    }

    /// Create a registry driven by an explicit runtime
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// Get the context for `id`, creating and registering it on first use
    pub fn get_or_create(&self, id: &ResourceId) -> Arc<ExecutionContext> {
        // The map is never left half-updated, so a poisoned lock is still usable
        let mut contexts = self
            .contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(context) = contexts.get(id) {
            return Arc::clone(context);
        }

        debug!("Creating execution context for {}", id);
        let context = Arc::new(ExecutionContext::spawn(id.clone(), &self.runtime));
        contexts.insert(id.clone(), Arc::clone(&context));
        context
    }

    /// Number of registered contexts
    pub fn len(&self) -> usize {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no context has been created yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRegistry")
            .field("contexts", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Barrier;
    use tokio::time::timeout;

    const SHORT: Duration = Duration::from_millis(100);
    const LONG: Duration = Duration::from_secs(5);

    fn id(name: &str) -> ResourceId {
        ResourceId::new(name).unwrap()
    }

    /// Submit a write that holds its key until the returned sender fires
    fn blocking_write(context: &ExecutionContext) -> (oneshot::Sender<()>, Completion) {
        let (release, gate) = oneshot::channel::<()>();
        let completion = context.submit(Access::Write, async move {
            let _ = gate.await;
        });
        (release, completion)
    }

    #[test]
    fn new_outside_runtime_fails() {
        assert!(matches!(KeyRegistry::new(), Err(RescacheError::NoRuntime)));
    }

    #[tokio::test]
    async fn same_id_same_context() {
        let registry = KeyRegistry::new().unwrap();
        let a1 = registry.get_or_create(&id("a"));
        let a2 = registry.get_or_create(&id("a"));
        let b = registry.get_or_create(&id("b"));

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
        assert_eq!(registry.len(), 2);
        assert_eq!(a1.id(), &id("a"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_creates_one_context() {
        let registry = Arc::new(KeyRegistry::new().unwrap());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get_or_create(&id("shared")))
            })
            .collect();
        let contexts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 1);
        assert!(contexts.iter().all(|c| Arc::ptr_eq(c, &contexts[0])));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn reads_run_in_parallel() {
        let registry = KeyRegistry::new().unwrap();
        let context = registry.get_or_create(&id("movies"));
        let barrier = Arc::new(Barrier::new(2));

        // Each read waits for the other; this only finishes if both run at once
        let first = {
            let barrier = Arc::clone(&barrier);
            context.submit(Access::Read, async move {
                barrier.wait().await;
            })
        };
        let second = context.submit(Access::Read, async move {
            barrier.wait().await;
        });

        timeout(LONG, async {
            first.wait().await;
            second.wait().await;
        })
        .await
        .expect("parallel reads deadlocked");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn write_excludes_later_reads() {
        let registry = KeyRegistry::new().unwrap();
        let context = registry.get_or_create(&id("movies"));

        let (release, write) = blocking_write(&context);
        let read_ran = Arc::new(AtomicBool::new(false));
        let read = {
            let read_ran = Arc::clone(&read_ran);
            context.submit(Access::Read, async move {
                read_ran.store(true, Ordering::SeqCst);
            })
        };

        tokio::time::sleep(SHORT).await;
        assert!(!read_ran.load(Ordering::SeqCst));

        release.send(()).unwrap();
        timeout(LONG, write.wait()).await.unwrap();
        timeout(LONG, read.wait()).await.unwrap();
        assert!(read_ran.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn write_waits_for_earlier_reads() {
        let registry = KeyRegistry::new().unwrap();
        let context = registry.get_or_create(&id("movies"));

        let (release, gate) = oneshot::channel::<()>();
        let read = context.submit(Access::Read, async move {
            let _ = gate.await;
        });
        let wrote = Arc::new(AtomicBool::new(false));
        let write = {
            let wrote = Arc::clone(&wrote);
            context.submit(Access::Write, async move {
                wrote.store(true, Ordering::SeqCst);
            })
        };

        tokio::time::sleep(SHORT).await;
        assert!(!wrote.load(Ordering::SeqCst));

        release.send(()).unwrap();
        timeout(LONG, read.wait()).await.unwrap();
        timeout(LONG, write.wait()).await.unwrap();
        assert!(wrote.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fire_and_forget_writes_keep_submission_order() {
        let registry = KeyRegistry::new().unwrap();
        let context = registry.get_or_create(&id("movies"));
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..20u64 {
            let log = Arc::clone(&log);
            // Earlier jobs sleep longer; only queue order keeps them sorted
            let _ = context.submit(Access::Write, async move {
                tokio::time::sleep(Duration::from_millis(20 - i)).await;
                log.lock().unwrap().push(i);
            });
        }

        let read_log = Arc::clone(&log);
        let (seen_tx, seen_rx) = oneshot::channel();
        let _ = context.submit(Access::Read, async move {
            let _ = seen_tx.send(read_log.lock().unwrap().clone());
        });

        let seen = timeout(LONG, seen_rx).await.unwrap().unwrap();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn keys_are_independent() {
        let registry = KeyRegistry::new().unwrap();
        let a = registry.get_or_create(&id("a"));
        let b = registry.get_or_create(&id("b"));

        let (release, blocked) = blocking_write(&a);

        // Traffic on b completes while a is held exclusively
        timeout(LONG, b.submit(Access::Write, async {}).wait())
            .await
            .expect("write on b blocked by a");
        timeout(LONG, b.submit(Access::Read, async {}).wait())
            .await
            .expect("read on b blocked by a");

        // ...while a's own readers are still waiting
        let a_read = a.submit(Access::Read, async {});
        assert!(timeout(SHORT, a_read.wait()).await.is_err());

        release.send(()).unwrap();
        timeout(LONG, blocked.wait()).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_job_releases_key() {
        let registry = KeyRegistry::new().unwrap();
        let context = registry.get_or_create(&id("movies"));

        let failed = context.submit(Access::Write, async {
            panic!("job failure");
        });
        timeout(LONG, failed.wait()).await.unwrap();

        timeout(LONG, context.submit(Access::Read, async {}).wait())
            .await
            .expect("key stayed locked after panic");
    }

    #[tokio::test]
    async fn ready_completion_resolves() {
        timeout(LONG, Completion::ready().wait()).await.unwrap();
    }
}
