//! 工作池（WorkerPool）
//!
//! 总线自身不维护队列与线程，配置工作池后，执行器把“提供者求值 + 处理器调用”
//! 作为一个任务提交给池，并返回代表最终结果的 future。
//! 取消与超时语义完全由具体工作池决定。
//!
use crate::command::Reply;
use crate::error::{BusError, BusResult};
use bon::Builder;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

pub type Task = BoxFuture<'static, BusResult<Reply>>;

/// 提交一个任务，得到其结果的 future
pub trait WorkerPool: Send + Sync + 'static {
    fn submit(&self, task: Task) -> Task;
}

/// 工作池配置
#[derive(Builder, Clone, Copy, Debug)]
pub struct WorkerPoolConfig {
    /// 同时执行的任务上限，超出的任务排队等待；取值限制在 1 到 `Semaphore::MAX_PERMITS` 之间
    #[builder(default = 16)]
    pub max_concurrency: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self { max_concurrency: 16 }
    }
}

/// 基于 tokio 运行时的有界工作池
///
/// 任务在提交时即被 spawn 到给定运行时；通过信号量限制同时执行的数量。
/// 丢弃返回的 future 不会中止已提交的任务。
#[derive(Clone)]
pub struct TokioWorkerPool {
    handle: Handle,
    permits: Arc<Semaphore>,
    config: WorkerPoolConfig,
}

impl TokioWorkerPool {
    pub fn new(handle: Handle, config: WorkerPoolConfig) -> Self {
        Self {
            handle,
            permits: Arc::new(Semaphore::new(
                config.max_concurrency.clamp(1, Semaphore::MAX_PERMITS),
            )),
            config,
        }
    }

    /// 使用当前所在的 tokio 运行时
    pub fn try_current(config: WorkerPoolConfig) -> BusResult<Self> {
        let handle = Handle::try_current().map_err(|e| BusError::internal(e.to_string()))?;
        Ok(Self::new(handle, config))
    }

    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

impl WorkerPool for TokioWorkerPool {
    fn submit(&self, task: Task) -> Task {
        let permits = self.permits.clone();

        let join = self.handle.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| BusError::internal(e.to_string()))?;
            task.await
        });

        async move {
            match join.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    Err(BusError::internal(format!("worker task panicked: {e}")))
                }
                Err(e) => Err(BusError::internal(format!("worker task cancelled: {e}"))),
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn config_builder_defaults() {
        let config = WorkerPoolConfig::builder().build();
        assert_eq!(config.max_concurrency, 16);
        let config = WorkerPoolConfig::builder().max_concurrency(2).build();
        assert_eq!(config.max_concurrency, 2);
    }

    #[tokio::test]
    async fn oversized_concurrency_is_clamped() {
        let pool = TokioWorkerPool::try_current(WorkerPoolConfig {
            max_concurrency: usize::MAX,
        })
        .unwrap();
        assert_eq!(pool.config().max_concurrency, usize::MAX);
        assert_eq!(pool.available_permits(), Semaphore::MAX_PERMITS);

        let pool = TokioWorkerPool::try_current(WorkerPoolConfig { max_concurrency: 0 }).unwrap();
        assert_eq!(pool.available_permits(), 1);
    }

    #[test]
    fn try_current_outside_runtime_fails() {
        let err = TokioWorkerPool::try_current(WorkerPoolConfig::default()).err();
        assert!(matches!(err, Some(BusError::Internal(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_bounded() {
        let pool = TokioWorkerPool::try_current(WorkerPoolConfig { max_concurrency: 2 }).unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let pending: Vec<Task> = (0..8)
            .map(|_| {
                let running = running.clone();
                let peak = peak.clone();
                pool.submit(
                    async move {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, BusError>(Box::new(()) as Reply)
                    }
                    .boxed(),
                )
            })
            .collect();

        for task in pending {
            task.await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.available_permits(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_task_becomes_internal_error() {
        let pool = TokioWorkerPool::try_current(WorkerPoolConfig::default()).unwrap();
        let explode = true;
        let task: Task = async move {
            if explode {
                panic!("boom");
            }
            Ok::<_, BusError>(Box::new(()) as Reply)
        }
        .boxed();

        let err = pool.submit(task).await.err().unwrap();
        assert!(err.is_internal());
    }
}
