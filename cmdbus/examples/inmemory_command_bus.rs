use async_trait::async_trait;
use cmdbus::{
    Args, BusError, CommandBusBuilder, CommandHandler, LoggingMiddleware, ValueDescriptor,
    provider_fn,
};
use cmdbus_macros::command;
use std::sync::Arc;

#[derive(Debug)]
#[command(name = "user.create", output = u32)]
struct CreateUser {
    name: String,
}

#[derive(Debug)]
#[command(name = "user.delete")]
struct DeleteUser {
    id: u32,
}

/// 新用户编号由 `next-id` 提供者生成
struct CreateUserHandler;

#[async_trait]
impl CommandHandler<CreateUser> for CreateUserHandler {
    fn dependencies(&self) -> Vec<ValueDescriptor> {
        vec![ValueDescriptor::named::<u32>("next-id")]
    }

    async fn handle(&self, cmd: CreateUser, mut args: Args) -> anyhow::Result<u32> {
        let id: u32 = args.take(0)?;
        println!("CreateUser: id={}, name={}", id, cmd.name);
        Ok(id)
    }
}

struct DeleteUserHandler;

#[async_trait]
impl CommandHandler<DeleteUser> for DeleteUserHandler {
    async fn handle(&self, cmd: DeleteUser, _args: Args) -> anyhow::Result<()> {
        println!("DeleteUser: id={}", cmd.id);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bus = CommandBusBuilder::new()
        .register_middleware(LoggingMiddleware)
        .register_value_provider::<u32, _>(provider_fn("next-id", || Ok(42_u32)))
        .register_command_handler::<CreateUser, _>(Arc::new(CreateUserHandler))
        .register_command_handler::<DeleteUser, _>(Arc::new(DeleteUserHandler))
        .build()?;

    let id = bus
        .dispatch(CreateUser {
            name: "Alice".into(),
        })
        .await?;
    bus.dispatch(DeleteUser { id }).await?;

    // 未注册的命令 -> 返回 HandlerNotFound 错误
    #[allow(dead_code)]
    #[derive(Debug)]
    #[command(name = "user.update")]
    struct UpdateUser {
        id: u32,
        name: String,
    }

    if let Err(BusError::HandlerNotFound(name)) = bus
        .dispatch(UpdateUser {
            id: 7,
            name: "Eve".into(),
        })
        .await
    {
        eprintln!("HandlerNotFound as expected for command: {}", name);
    }
    Ok(())
}
