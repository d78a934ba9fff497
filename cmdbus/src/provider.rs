//! 取值提供者（ValueProvider）
//!
//! 为处理器提供命令之外的辅助输入（仓储、时钟、配置等）：
//! - 以“产出类型 + 名称”唯一标识，同一类型可按名称注册多个；
//! - 每次分发按需重新调用，不跨分发缓存结果；
//! - 构建期生成两级映射 `类型 → (名称 → 提供者)`，之后只读。
//!
use crate::error::{BusError, BusResult};
use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::any::{Any, TypeId, type_name};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 未显式命名时使用的名称（提供者与依赖两侧一致）
pub const DEFAULT_VALUE_NAME: &str = "default";

pub(crate) type BoxAnySend = Box<dyn Any + Send>;

type ProvideFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<BoxAnySend>> + Send + Sync>;

/// 提供某一类型 `T` 的值
///
/// 同一对象可为多个类型分别实现，并按类型分别注册。
#[async_trait]
pub trait ValueProvider<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    /// 提供者名称，用于同类型多提供者之间的区分
    fn name(&self) -> &str {
        DEFAULT_VALUE_NAME
    }

    async fn provide(&self) -> anyhow::Result<T>;
}

/// 值描述：产出类型 + 名称
///
/// 处理器以此声明依赖，提供者以此登记自身。两者按类型与名称精确匹配，没有隐式回退。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ValueDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    name: Cow<'static, str>,
}

impl ValueDescriptor {
    /// 默认名称下的 `T`
    pub fn of<T: Send + 'static>() -> Self {
        Self::named::<T>(DEFAULT_VALUE_NAME)
    }

    pub fn named<T: Send + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name: name.into(),
        }
    }

    pub fn value_type(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ValueDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.type_name, self.name)
    }
}

/// 已绑定的提供者：实现对象 + 描述
#[derive(Clone)]
pub(crate) struct BoundProvider {
    descriptor: ValueDescriptor,
    implementation: &'static str,
    provide: ProvideFn,
}

impl BoundProvider {
    pub(crate) fn new<T, P>(provider: Arc<P>) -> Self
    where
        T: Send + 'static,
        P: ValueProvider<T>,
    {
        let descriptor =
            ValueDescriptor::named::<T>(<P as ValueProvider<T>>::name(&*provider).to_owned());

        let provide: ProvideFn = Arc::new(move || {
            let provider = provider.clone();

            async move {
                let value = <P as ValueProvider<T>>::provide(&*provider).await?;
                Ok::<_, anyhow::Error>(Box::new(value) as BoxAnySend)
            }
            .boxed()
        });

        Self {
            descriptor,
            implementation: type_name::<P>(),
            provide,
        }
    }

    pub(crate) fn descriptor(&self) -> &ValueDescriptor {
        &self.descriptor
    }

    pub(crate) fn implementation(&self) -> &'static str {
        self.implementation
    }

    pub(crate) fn provide(&self) -> BoxFuture<'static, anyhow::Result<BoxAnySend>> {
        (self.provide)()
    }
}

/// 两级映射：产出类型 → (名称 → 提供者)
#[derive(Default)]
pub(crate) struct ProviderMapping {
    by_type: HashMap<TypeId, HashMap<String, BoundProvider>>,
}

impl ProviderMapping {
    /// 按注册顺序建立映射，遇到重复的（类型，名称）立即失败
    pub(crate) fn build(candidates: &[BoundProvider]) -> BusResult<Self> {
        let mut by_type: HashMap<TypeId, HashMap<String, BoundProvider>> = HashMap::new();

        for candidate in candidates {
            let descriptor = candidate.descriptor();
            let by_name = by_type.entry(descriptor.value_type()).or_default();

            if let Some(existing) = by_name.get(descriptor.name()) {
                return Err(BusError::ProviderConflict {
                    value_type: descriptor.type_name(),
                    name: descriptor.name().to_owned(),
                    existing: existing.implementation(),
                    attempted: candidate.implementation(),
                });
            }

            tracing::debug!(
                value_type = descriptor.type_name(),
                name = descriptor.name(),
                provider = candidate.implementation(),
                "value provider bound"
            );
            by_name.insert(descriptor.name().to_owned(), candidate.clone());
        }

        Ok(Self { by_type })
    }

    pub(crate) fn resolve(&self, descriptor: &ValueDescriptor) -> Option<&BoundProvider> {
        self.by_type
            .get(&descriptor.value_type())
            .and_then(|by_name| by_name.get(descriptor.name()))
    }

    pub(crate) fn len(&self) -> usize {
        self.by_type.values().map(HashMap::len).sum()
    }
}

/// 以闭包形式实现的提供者
pub struct FnProvider<F> {
    name: String,
    f: F,
}

/// 由闭包构造提供者，闭包在每次分发时调用
///
/// ```rust
/// use cmdbus::provider::provider_fn;
///
/// let limit = provider_fn("page-limit", || Ok(50_usize));
/// # let _ = limit;
/// ```
pub fn provider_fn<T, F>(name: impl Into<String>, f: F) -> Arc<FnProvider<F>>
where
    T: Send + 'static,
    F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
{
    Arc::new(FnProvider {
        name: name.into(),
        f,
    })
}

#[async_trait]
impl<T, F> ValueProvider<T> for FnProvider<F>
where
    T: Send + 'static,
    F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn provide(&self) -> anyhow::Result<T> {
        (self.f)()
    }
}
