use async_trait::async_trait;
use cmdbus::{
    Args, BusError, BusResult, CommandBusBuilder, CommandHandler, Envelope, LoggingMiddleware,
    Middleware, Next, Reply, TokioWorkerPool, ValueDescriptor, ValueProvider, WorkerPoolConfig,
    provider_fn,
};
use cmdbus_macros::command;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

const SESSION_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, thiserror::Error)]
enum UserError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("user already exists: {0}")]
    AlreadyExists(String),
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("wrong password")]
    WrongPassword,
}

#[derive(Debug, Clone)]
struct UserRecord {
    id: u64,
    // 演示用途，明文保存
    password: String,
}

/// 内存用户目录，作为默认名称的取值提供者注册
#[derive(Default, Clone)]
struct UserDirectory {
    inner: Arc<Mutex<HashMap<String, UserRecord>>>,
}

impl UserDirectory {
    fn insert(&self, username: &str, password: &str) -> Result<u64, UserError> {
        let mut users = self.inner.lock().unwrap();
        if users.contains_key(username) {
            return Err(UserError::AlreadyExists(username.to_string()));
        }
        let id = users.len() as u64 + 1;
        users.insert(
            username.to_string(),
            UserRecord {
                id,
                password: password.to_string(),
            },
        );
        Ok(id)
    }

    fn find(&self, username: &str) -> Option<UserRecord> {
        self.inner.lock().unwrap().get(username).cloned()
    }
}

#[async_trait]
impl ValueProvider<UserDirectory> for UserDirectory {
    async fn provide(&self) -> anyhow::Result<UserDirectory> {
        Ok(self.clone())
    }
}

#[command(name = "user.register", output = u64)]
struct RegisterUser {
    username: String,
    password: String,
}

#[command(name = "user.authenticate", output = Session)]
struct AuthenticateUser {
    username: String,
    password: String,
}

#[derive(Debug)]
struct Session {
    user_id: u64,
    issued_at: u64,
    expires_at: u64,
}

struct RegisterUserHandler;

#[async_trait]
impl CommandHandler<RegisterUser> for RegisterUserHandler {
    fn dependencies(&self) -> Vec<ValueDescriptor> {
        vec![ValueDescriptor::of::<UserDirectory>()]
    }

    async fn handle(&self, cmd: RegisterUser, mut args: Args) -> anyhow::Result<u64> {
        let users: UserDirectory = args.take(0)?;
        if cmd.username.trim().is_empty() {
            return Err(UserError::EmptyUsername.into());
        }
        Ok(users.insert(&cmd.username, &cmd.password)?)
    }
}

/// 时间戳来自同一类型、两个名称的时钟提供者
struct AuthenticateUserHandler;

#[async_trait]
impl CommandHandler<AuthenticateUser> for AuthenticateUserHandler {
    fn dependencies(&self) -> Vec<ValueDescriptor> {
        vec![
            ValueDescriptor::of::<UserDirectory>(),
            ValueDescriptor::named::<SystemTime>("issued-at"),
            ValueDescriptor::named::<SystemTime>("expires-at"),
        ]
    }

    async fn handle(&self, cmd: AuthenticateUser, mut args: Args) -> anyhow::Result<Session> {
        let users: UserDirectory = args.take(0)?;
        let issued_at: SystemTime = args.take(1)?;
        let expires_at: SystemTime = args.take(2)?;

        let record = users
            .find(&cmd.username)
            .ok_or_else(|| UserError::UnknownUser(cmd.username.clone()))?;
        if record.password != cmd.password {
            return Err(UserError::WrongPassword.into());
        }

        Ok(Session {
            user_id: record.id,
            issued_at: issued_at.duration_since(UNIX_EPOCH)?.as_secs(),
            expires_at: expires_at.duration_since(UNIX_EPOCH)?.as_secs(),
        })
    }
}

/// 统计每条命令的处理耗时
struct TimingMiddleware;

#[async_trait]
impl Middleware for TimingMiddleware {
    async fn execute(&self, envelope: Envelope, next: Next) -> BusResult<Reply> {
        let name = envelope.name();
        let started = Instant::now();
        let out = next.run(envelope).await;
        tracing::info!(
            command = name,
            ok = out.is_ok(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "command timed"
        );
        out
    }
}

fn worker_config() -> WorkerPoolConfig {
    let max_concurrency = std::env::var("CMDBUS_DEMO_WORKERS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_WORKERS);
    WorkerPoolConfig::builder()
        .max_concurrency(max_concurrency)
        .build()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cmdbus=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let users = Arc::new(UserDirectory::default());
    let bus = CommandBusBuilder::new()
        .register_middleware(TimingMiddleware)
        .register_middleware(LoggingMiddleware)
        .register_value_provider::<UserDirectory, _>(users)
        .register_value_provider::<SystemTime, _>(provider_fn("issued-at", || {
            Ok(SystemTime::now())
        }))
        .register_value_provider::<SystemTime, _>(provider_fn("expires-at", || {
            Ok(SystemTime::now() + SESSION_TTL)
        }))
        .register_command_handler::<RegisterUser, _>(Arc::new(RegisterUserHandler))
        .register_command_handler::<AuthenticateUser, _>(Arc::new(AuthenticateUserHandler))
        .with_worker_pool(TokioWorkerPool::try_current(worker_config())?)
        .build()?;
    println!("bus: {:?}", bus);

    // 注册
    let id = bus
        .dispatch(RegisterUser {
            username: "alice".into(),
            password: "s3cret".into(),
        })
        .await?;
    println!("registered: alice -> id={}", id);

    // 重复注册 -> 领域错误原样返回
    if let Err(err) = bus
        .dispatch(RegisterUser {
            username: "alice".into(),
            password: "other".into(),
        })
        .await
    {
        if let Some(UserError::AlreadyExists(name)) = err.handler_error::<UserError>() {
            println!("rejected duplicate: {}", name);
        }
    }

    // 登录
    let session = bus
        .dispatch(AuthenticateUser {
            username: "alice".into(),
            password: "s3cret".into(),
        })
        .await?;
    println!(
        "authenticated: user_id={}, issued_at={}, expires_at={}",
        session.user_id, session.issued_at, session.expires_at
    );

    // 密码错误
    match bus
        .dispatch(AuthenticateUser {
            username: "alice".into(),
            password: "guess".into(),
        })
        .await
    {
        Err(err @ BusError::Handler(_)) => println!("login failed: {}", err),
        other => println!("unexpected: {:?}", other.map(|s| s.user_id)),
    }

    Ok(())
}
