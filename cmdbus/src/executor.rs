use crate::command::{Envelope, Reply};
use crate::error::{BusError, BusResult};
use crate::handler::HandlerMapping;
use crate::middleware::DispatchFn;
use crate::worker_pool::WorkerPool;
use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use std::any::TypeId;
use std::sync::Arc;

/// 命令执行器：调用链最内层
/// - 按命令的 `TypeId` 查找处理器（只读，无锁）
/// - 未配置工作池时由调用方所在任务直接驱动；否则提交给工作池
pub(crate) struct CommandExecutor {
    handlers: HandlerMapping,
    pool: Option<Arc<dyn WorkerPool>>,
}

impl CommandExecutor {
    pub(crate) fn new(handlers: HandlerMapping, pool: Option<Arc<dyn WorkerPool>>) -> Self {
        Self { handlers, pool }
    }

    pub(crate) fn execute(&self, envelope: Envelope) -> BoxFuture<'static, BusResult<Reply>> {
        let Some(handler) = self.handlers.get(&envelope.command_type()).cloned() else {
            return future::ready(Err(BusError::HandlerNotFound(envelope.name()))).boxed();
        };

        tracing::trace!(
            command = handler.command_name(),
            pooled = self.pool.is_some(),
            "handler resolved"
        );

        let invocation = handler.invoke(envelope);
        match &self.pool {
            None => invocation,
            Some(pool) => pool.submit(invocation),
        }
    }

    pub(crate) fn handles(&self, command: &TypeId) -> bool {
        self.handlers.contains(command)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.handlers.command_names()
    }

    pub(crate) fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }

    pub(crate) fn into_dispatch(self: Arc<Self>) -> DispatchFn {
        Arc::new(move |envelope: Envelope| self.execute(envelope))
    }
}
