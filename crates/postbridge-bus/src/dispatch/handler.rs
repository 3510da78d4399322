use std::future::Future;

use async_trait::async_trait;

use postbridge_core::error::Result;
use postbridge_core::protocol::Envelope;

/// Subscriber for one or more message types.
///
/// Returning `Err` (or panicking) marks this invocation as failed; the
/// registry reports it to the peer and moves on to the next handler.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, env: &Envelope) -> Result<()>;
}

/// Adapter turning an async closure into a `Handler`.
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, env: &Envelope) -> Result<()> {
        (self.f)(env.clone()).await
    }
}
