//! 命令总线统一错误定义
//!
//! 按发生阶段划分：
//! - 构建期（`build()`）：处理器/提供者注册冲突、依赖无法解析；
//! - 分发期：找不到处理器、处理器自身失败、调用机制内部错误。
//!
//! 处理器与提供者返回的 `anyhow::Error` 会原样保留在 [`BusError::Handler`] 中，
//! 调用方可以 downcast 回自己的领域错误类型。
//!
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BusError {
    // --- 构建期 ---
    #[error(
        "handler already registered: command={command}, existing={existing}, attempted={attempted}"
    )]
    HandlerConflict {
        command: &'static str,
        existing: &'static str,
        attempted: &'static str,
    },

    #[error(
        "value provider already registered: type={value_type}, name={name}, existing={existing}, attempted={attempted}"
    )]
    ProviderConflict {
        value_type: &'static str,
        name: String,
        existing: &'static str,
        attempted: &'static str,
    },

    #[error(
        "unresolved dependency: handler={handler}, command={command}, type={value_type}, name={name}"
    )]
    UnresolvedDependency {
        handler: &'static str,
        command: &'static str,
        value_type: &'static str,
        name: String,
    },

    // --- 分发期 ---
    #[error("handler not found: {0}")]
    HandlerNotFound(&'static str),

    #[error(transparent)]
    Handler(anyhow::Error),

    #[error("internal dispatch error: {0}")]
    Internal(String),

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// 统一 Result 类型别名
pub type BusResult<T> = Result<T, BusError>;

impl BusError {
    /// 是否为注册冲突（重复处理器或重复提供者）
    pub fn is_registration_conflict(&self) -> bool {
        matches!(
            self,
            BusError::HandlerConflict { .. } | BusError::ProviderConflict { .. }
        )
    }

    /// 是否为调用机制内部错误（与处理器业务失败区分）
    pub fn is_internal(&self) -> bool {
        matches!(self, BusError::Internal(_) | BusError::TypeMismatch { .. })
    }

    /// 取出处理器/提供者抛出的原始错误
    pub fn handler_error<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            BusError::Handler(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub(crate) fn internal(reason: impl Into<String>) -> Self {
        BusError::Internal(reason.into())
    }
}

/// 参数取值失败（下标越界、重复取出、类型不符）
///
/// 由 [`Args::take`](crate::handler::Args::take) 返回。经 `?` 穿过处理器的
/// `anyhow::Error` 后会在总线出口还原为内部的 [`BusError`]，
/// 与处理器自身（包括嵌套分发）返回的错误区分开。
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ArgsError(BusError);

impl ArgsError {
    pub(crate) fn new(err: BusError) -> Self {
        Self(err)
    }

    pub fn into_inner(self) -> BusError {
        self.0
    }
}

impl From<ArgsError> for BusError {
    fn from(err: ArgsError) -> Self {
        err.0
    }
}

// 只还原参数机制产生的错误；其余（包括嵌套分发返回的 BusError）一律视为业务失败原样透传。
impl From<anyhow::Error> for BusError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ArgsError>() {
            Ok(args_err) => args_err.into_inner(),
            Err(other) => BusError::Handler(other),
        }
    }
}
