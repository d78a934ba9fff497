//! 中间件（Middleware）与调用链组装
//!
//! 中间件包裹一次分发，可在调用 `next` 前后做前置/后置处理，也可以直接短路。
//! 按注册顺序 M1、M2 组装后，一次分发的执行顺序固定为：
//!
//! ```text
//! M1.pre -> M2.pre -> handler -> M2.post -> M1.post
//! ```
//!
use crate::command::{Envelope, Reply};
use crate::error::BusResult;
use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

pub(crate) type DispatchFn =
    Arc<dyn Fn(Envelope) -> BoxFuture<'static, BusResult<Reply>> + Send + Sync>;

#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn execute(&self, envelope: Envelope, next: Next) -> BusResult<Reply>;
}

/// 调用链剩余部分；`run` 消耗自身，每次分发至多继续一次
pub struct Next {
    inner: DispatchFn,
}

impl Next {
    pub async fn run(self, envelope: Envelope) -> BusResult<Reply> {
        (self.inner)(envelope).await
    }
}

/// 以执行器为最内层，逆注册顺序折叠中间件。
/// 最后注册的最靠近执行器，最先注册的位于最外层。
pub(crate) fn compose(middleware: &[Arc<dyn Middleware>], executor: DispatchFn) -> DispatchFn {
    middleware.iter().rev().fold(executor, |inner, mw| {
        let mw = mw.clone();

        let wrapped: DispatchFn = Arc::new(move |envelope: Envelope| {
            let mw = mw.clone();
            let next = Next {
                inner: inner.clone(),
            };

            async move { mw.execute(envelope, next).await }.boxed()
        });
        wrapped
    })
}

/// 基于 `tracing` 的日志中间件
///
/// 为每次分发打开 `command` span，记录耗时；失败以 `warn` 级别记录后原样返回。
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn execute(&self, envelope: Envelope, next: Next) -> BusResult<Reply> {
        let command = envelope.name();
        let span = tracing::debug_span!("command", name = command);

        async move {
            let started = Instant::now();
            tracing::debug!("dispatching");

            let result = next.run(envelope).await;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            match &result {
                Ok(_) => tracing::debug!(elapsed_ms, "dispatched"),
                Err(err) => tracing::warn!(elapsed_ms, error = %err, "dispatch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}
