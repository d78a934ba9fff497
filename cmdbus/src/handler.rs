//! 命令处理器（CommandHandler）与处理器注册表
//!
//! 处理器通过 [`CommandHandler::dependencies`] 按顺序声明所需的取值提供者，
//! 构建期逐一解析绑定；分发时按同样顺序调用提供者，组装为 [`Args`] 交给处理器。
//!
use crate::command::{Command, Envelope, Reply};
use crate::error::{ArgsError, BusError, BusResult};
use crate::provider::{BoundProvider, BoxAnySend, ProviderMapping, ValueDescriptor};
use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

type InvokeFn = Arc<dyn Fn(Envelope, Args) -> BoxFuture<'static, BusResult<Reply>> + Send + Sync>;

#[async_trait]
pub trait CommandHandler<C>: Send + Sync + 'static
where
    C: Command,
{
    /// 依赖声明，顺序即 `Args` 中的下标顺序
    fn dependencies(&self) -> Vec<ValueDescriptor> {
        Vec::new()
    }

    async fn handle(&self, cmd: C, args: Args) -> anyhow::Result<C::Output>;
}

/// 一次分发中由提供者产出的参数，按依赖声明顺序排列
#[derive(Default)]
pub struct Args {
    slots: Vec<Slot>,
}

struct Slot {
    descriptor: ValueDescriptor,
    value: Option<BoxAnySend>,
}

impl Args {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 取出第 `index` 个参数
    ///
    /// 下标越界、重复取出或类型不符均视为调用机制错误，而非业务失败。
    pub fn take<T: Send + 'static>(&mut self, index: usize) -> Result<T, ArgsError> {
        let len = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            ArgsError::new(BusError::internal(format!(
                "argument index {index} out of range, len={len}"
            )))
        })?;

        let value = slot.value.take().ok_or_else(|| {
            ArgsError::new(BusError::internal(format!(
                "argument {index} ({:?}) already taken",
                slot.descriptor
            )))
        })?;

        match value.downcast::<T>() {
            Ok(v) => Ok(*v),
            Err(v) => {
                slot.value = Some(v);
                Err(ArgsError::new(BusError::TypeMismatch {
                    expected: type_name::<T>(),
                    found: slot.descriptor.type_name(),
                }))
            }
        }
    }
}

/// 尚未绑定提供者的处理器（注册阶段）
#[derive(Clone)]
pub(crate) struct HandlerCandidate {
    command: TypeId,
    command_name: &'static str,
    implementation: &'static str,
    dependencies: Vec<ValueDescriptor>,
    invoke: InvokeFn,
}

impl HandlerCandidate {
    pub(crate) fn new<C, H>(handler: Arc<H>) -> Self
    where
        C: Command,
        H: CommandHandler<C>,
    {
        let dependencies = <H as CommandHandler<C>>::dependencies(&*handler);

        let invoke: InvokeFn = Arc::new(move |envelope: Envelope, args: Args| {
            let handler = handler.clone();

            async move {
                let cmd = envelope.into_command::<C>()?;
                let output = <H as CommandHandler<C>>::handle(&*handler, cmd, args).await?;
                Ok::<_, BusError>(Box::new(output) as Reply)
            }
            .boxed()
        });

        Self {
            command: TypeId::of::<C>(),
            command_name: C::NAME,
            implementation: type_name::<H>(),
            dependencies,
            invoke,
        }
    }
}

/// 已绑定提供者的处理器
pub(crate) struct BoundHandler {
    command_name: &'static str,
    implementation: &'static str,
    providers: Vec<BoundProvider>,
    invoke: InvokeFn,
}

impl BoundHandler {
    pub(crate) fn command_name(&self) -> &'static str {
        self.command_name
    }

    /// 每次调用都重新求值全部提供者，再交给处理器
    pub(crate) fn invoke(self: Arc<Self>, envelope: Envelope) -> BoxFuture<'static, BusResult<Reply>> {
        async move {
            let mut slots = Vec::with_capacity(self.providers.len());
            for provider in &self.providers {
                let value = provider.provide().await?;
                slots.push(Slot {
                    descriptor: provider.descriptor().clone(),
                    value: Some(value),
                });
            }

            (self.invoke)(envelope, Args { slots }).await
        }
        .boxed()
    }
}

/// 命令类型 → 处理器，一对一
#[derive(Default)]
pub(crate) struct HandlerMapping {
    by_command: HashMap<TypeId, Arc<BoundHandler>>,
}

impl HandlerMapping {
    pub(crate) fn build(
        candidates: &[HandlerCandidate],
        providers: &ProviderMapping,
    ) -> BusResult<Self> {
        let mut by_command: HashMap<TypeId, Arc<BoundHandler>> = HashMap::new();

        for candidate in candidates {
            if let Some(existing) = by_command.get(&candidate.command) {
                return Err(BusError::HandlerConflict {
                    command: candidate.command_name,
                    existing: existing.implementation,
                    attempted: candidate.implementation,
                });
            }

            let bound = candidate
                .dependencies
                .iter()
                .map(|dep| {
                    providers.resolve(dep).cloned().ok_or_else(|| {
                        BusError::UnresolvedDependency {
                            handler: candidate.implementation,
                            command: candidate.command_name,
                            value_type: dep.type_name(),
                            name: dep.name().to_owned(),
                        }
                    })
                })
                .collect::<BusResult<Vec<_>>>()?;

            tracing::debug!(
                command = candidate.command_name,
                handler = candidate.implementation,
                dependencies = ?candidate.dependencies,
                "command handler bound"
            );

            by_command.insert(
                candidate.command,
                Arc::new(BoundHandler {
                    command_name: candidate.command_name,
                    implementation: candidate.implementation,
                    providers: bound,
                    invoke: candidate.invoke.clone(),
                }),
            );
        }

        Ok(Self { by_command })
    }

    pub(crate) fn get(&self, command: &TypeId) -> Option<&Arc<BoundHandler>> {
        self.by_command.get(command)
    }

    pub(crate) fn contains(&self, command: &TypeId) -> bool {
        self.by_command.contains_key(command)
    }

    /// 已注册命令名（按名称排序）
    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_command.values().map(|h| h.command_name()).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn len(&self) -> usize {
        self.by_command.len()
    }
}
