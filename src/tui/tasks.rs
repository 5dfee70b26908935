//! One-shot background requests polled from the UI tick.

use futures::Future;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::api::{ApiError, ApiResult};

/// A spawned API call whose result is picked up without blocking the UI
#[derive(Debug)]
pub struct Pending<T> {
    receiver: oneshot::Receiver<ApiResult<T>>,
}

impl<T: Send + 'static> Pending<T> {
    pub fn spawn<F>(request: F) -> Self
    where
        F: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        tokio::spawn(async move {
            let _ = sender.send(request.await);
        });
        Self { receiver }
    }

    /// The result once the request has finished. A task that died without
    /// answering yields [`ApiError::Interrupted`].
    pub fn poll(&mut self) -> Option<ApiResult<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(ApiError::Interrupted)),
        }
    }

    /// Wait for the result
    pub async fn wait(self) -> ApiResult<T> {
        self.receiver.await.unwrap_or(Err(ApiError::Interrupted))
    }
}

/// Poll an optional pending request, clearing the slot once it completes
pub fn take_finished<T: Send + 'static>(slot: &mut Option<Pending<T>>) -> Option<ApiResult<T>> {
    let result = slot.as_mut()?.poll()?;
    *slot = None;
    Some(result)
}
