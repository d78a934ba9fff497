//! 进程内命令总线（cmdbus）
//!
//! 将命令按具体类型路由到唯一的处理器，并在分发前后套上有序的中间件链：
//! - `handler`：命令处理器及其依赖声明；
//! - `provider`：按“类型 + 名称”为处理器提供辅助输入的取值提供者；
//! - `middleware`：前置/后置处理的中间件与调用链组装；
//! - `worker_pool`：可选的工作池，把处理器调用移出调用方任务；
//! - `builder`：收集注册信息，在 `build()` 时一次性完成绑定与冲突检查。
//!
//! 典型用法：
//! ```rust
//! use async_trait::async_trait;
//! use cmdbus::{Args, Command, CommandBusBuilder, CommandHandler};
//! use std::sync::Arc;
//!
//! struct Ping;
//!
//! impl Command for Ping {
//!     const NAME: &'static str = "Ping";
//!     type Output = &'static str;
//! }
//!
//! struct PingHandler;
//!
//! #[async_trait]
//! impl CommandHandler<Ping> for PingHandler {
//!     async fn handle(&self, _cmd: Ping, _args: Args) -> anyhow::Result<&'static str> {
//!         Ok("pong")
//!     }
//! }
//!
//! # async fn run() -> Result<(), cmdbus::BusError> {
//! let bus = CommandBusBuilder::new()
//!     .register_command_handler::<Ping, _>(Arc::new(PingHandler))
//!     .build()?;
//! assert_eq!(bus.dispatch(Ping).await?, "pong");
//! # Ok(())
//! # }
//! ```
//!
pub mod builder;
pub mod command;
pub mod command_bus;
pub mod error;
mod executor;
pub mod handler;
pub mod middleware;
pub mod provider;
pub mod worker_pool;

pub use builder::CommandBusBuilder;
pub use command::{Command, Envelope, Reply};
pub use command_bus::CommandBus;
pub use error::{ArgsError, BusError, BusResult};
pub use handler::{Args, CommandHandler};
pub use middleware::{LoggingMiddleware, Middleware, Next};
pub use provider::{DEFAULT_VALUE_NAME, ValueDescriptor, ValueProvider, provider_fn};
pub use worker_pool::{TokioWorkerPool, WorkerPool, WorkerPoolConfig};
