use crate::command::{Command, Envelope, Reply};
use crate::error::{BusError, BusResult};
use crate::executor::CommandExecutor;
use crate::middleware::DispatchFn;
use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;

/// 命令总线（Command Bus）
///
/// - 由 [`CommandBusBuilder`](crate::builder::CommandBusBuilder) 构建，之后不可变；
/// - 内部是“中间件链 + 执行器”组合成的单个分发函数；
/// - 克隆成本低，可在多个任务/线程间并发分发。
#[derive(Clone)]
pub struct CommandBus {
    chain: DispatchFn,
    executor: Arc<CommandExecutor>,
}

impl CommandBus {
    pub(crate) fn new(chain: DispatchFn, executor: Arc<CommandExecutor>) -> Self {
        Self { chain, executor }
    }

    /// 分发命令到对应处理器，返回处理结果
    ///
    /// 处理器抛出的错误以 [`BusError::Handler`] 原样返回，可 downcast 回领域错误。
    pub async fn dispatch<C: Command>(&self, cmd: C) -> BusResult<C::Output> {
        let reply = self.dispatch_envelope(Envelope::new(cmd)).await?;

        match reply.downcast::<C::Output>() {
            Ok(output) => Ok(*output),
            Err(_) => Err(BusError::TypeMismatch {
                expected: type_name::<C::Output>(),
                found: C::NAME,
            }),
        }
    }

    /// 分发已类型擦除的命令（适配层使用）
    pub async fn dispatch_envelope(&self, envelope: Envelope) -> BusResult<Reply> {
        (self.chain)(envelope).await
    }

    /// 是否注册了该命令的处理器
    pub fn handles<C: Command>(&self) -> bool {
        self.executor.handles(&TypeId::of::<C>())
    }

    /// 获取已注册的命令名列表（只读视图）
    pub fn registered_commands(&self) -> Vec<&'static str> {
        self.executor.command_names()
    }
}

impl fmt::Debug for CommandBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBus")
            .field("commands", &self.registered_commands())
            .field("pooled", &self.executor.is_pooled())
            .finish_non_exhaustive()
    }
}
