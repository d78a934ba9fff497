use std::any::{Any, TypeId, type_name};
use std::fmt;

/// 命令（Command）
///
/// 表达“意图”的写操作请求，由总线按其具体类型路由到唯一的处理器。
/// - 总线只关心类型身份（`TypeId`），从不读取命令字段；
/// - 建议保持语义化的“动宾结构”命名，如 `CreateUser`、`CloseOrder`。
///
/// 关联项：
/// - `NAME`：命令的稳定名称，用于日志、追踪与错误信息。避免依赖 `type_name::<T>()`；
/// - `Output`：处理成功时返回给调用方的值，无返回值时使用 `()`。
pub trait Command: Send + Sync + 'static {
    /// 命令的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    /// 处理结果
    type Output: Send + 'static;
}

/// 类型擦除后的命令信封，在中间件链中流转
pub struct Envelope {
    type_id: TypeId,
    name: &'static str,
    payload: Box<dyn Any + Send>,
}

impl Envelope {
    pub fn new<C: Command>(cmd: C) -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: C::NAME,
            payload: Box::new(cmd),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn command_type(&self) -> TypeId {
        self.type_id
    }

    pub fn is<C: Command>(&self) -> bool {
        self.type_id == TypeId::of::<C>()
    }

    /// 只读访问命令本体；类型不符时返回 `None`
    pub fn downcast_ref<C: Command>(&self) -> Option<&C> {
        self.payload.downcast_ref::<C>()
    }

    pub(crate) fn into_command<C: Command>(self) -> Result<C, crate::error::BusError> {
        let found = self.name;
        self.payload
            .downcast::<C>()
            .map(|cmd| *cmd)
            .map_err(|_| crate::error::BusError::TypeMismatch {
                expected: type_name::<C>(),
                found,
            })
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// 处理器成功返回的类型擦除值
pub type Reply = Box<dyn Any + Send>;
