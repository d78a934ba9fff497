//! 总线构建器（CommandBusBuilder）
//!
//! 唯一可变的组件：只负责收集处理器、提供者、中间件与工作池。
//! 所有绑定、冲突检查与调用链组装都在 [`CommandBusBuilder::build`] 中一次完成，
//! 任何冲突都会使构建整体失败，不会返回半成品总线。
//!
use crate::command::Command;
use crate::command_bus::CommandBus;
use crate::error::BusResult;
use crate::executor::CommandExecutor;
use crate::handler::{CommandHandler, HandlerCandidate, HandlerMapping};
use crate::middleware::{Middleware, compose};
use crate::provider::{BoundProvider, ProviderMapping, ValueProvider};
use crate::worker_pool::WorkerPool;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CommandBusBuilder {
    handlers: Vec<HandlerCandidate>,
    providers: Vec<BoundProvider>,
    middleware: Vec<Arc<dyn Middleware>>,
    pool: Option<Arc<dyn WorkerPool>>,
}

impl CommandBusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册命令处理器；同一对象可为多个命令分别注册
    pub fn register_command_handler<C, H>(mut self, handler: Arc<H>) -> Self
    where
        C: Command,
        H: CommandHandler<C>,
    {
        self.handlers.push(HandlerCandidate::new::<C, H>(handler));
        self
    }

    /// 注册取值提供者；同一对象可为多个类型分别注册
    pub fn register_value_provider<T, P>(mut self, provider: Arc<P>) -> Self
    where
        T: Send + 'static,
        P: ValueProvider<T>,
    {
        self.providers.push(BoundProvider::new::<T, P>(provider));
        self
    }

    /// 追加中间件；先注册者位于调用链外层
    pub fn register_middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// 配置工作池，处理器调用将提交到池中执行
    pub fn with_worker_pool<W>(mut self, pool: W) -> Self
    where
        W: WorkerPool,
    {
        self.pool = Some(Arc::new(pool));
        self
    }

    /// 构建总线
    ///
    /// 依次：提供者映射 → 处理器映射 → 执行器 → 中间件链。
    /// 可多次调用，每次得到基于当前注册状态的独立总线。
    pub fn build(&self) -> BusResult<CommandBus> {
        let providers = ProviderMapping::build(&self.providers)?;
        let handlers = HandlerMapping::build(&self.handlers, &providers)?;

        tracing::info!(
            handlers = handlers.len(),
            providers = providers.len(),
            middleware = self.middleware.len(),
            pooled = self.pool.is_some(),
            "command bus built"
        );

        let executor = Arc::new(CommandExecutor::new(handlers, self.pool.clone()));
        let chain = compose(&self.middleware, executor.clone().into_dispatch());

        Ok(CommandBus::new(chain, executor))
    }
}
