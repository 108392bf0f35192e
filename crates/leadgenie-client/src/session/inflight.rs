//! Single-flight execution of an async operation.

use std::future::Future;

use tokio::sync::{Mutex, watch};

use crate::{Error, Result};

type Outcome<V> = Option<Result<V>>;

/// Joins concurrent callers onto one running operation.
///
/// The first caller runs the operation; callers arriving while it is in
/// flight wait for and receive the same outcome. Errors are handed to
/// followers without their source chain.
pub(crate) struct InFlight<V> {
    slot: Mutex<Option<watch::Receiver<Outcome<V>>>>,
}

impl<V> Default for InFlight<V> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<V> InFlight<V>
where
    V: Clone + Send + Sync,
{
    /// Runs `operation`, or joins the run already in flight.
    pub async fn run<F, Fut>(&self, operation: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let mut slot = self.slot.lock().await;

        // A closed channel means the previous leader was cancelled.
        if let Some(receiver) = slot.as_ref()
            && receiver.has_changed().is_ok()
        {
            let receiver = receiver.clone();
            drop(slot);
            return Self::join(receiver).await;
        }

        let (sender, receiver) = watch::channel(None);
        *slot = Some(receiver.clone());
        drop(slot);

        let result = operation().await;
        let shared = match &result {
            Ok(value) => Ok(value.clone()),
            Err(error) => Err(error.detached()),
        };

        // Later callers start a fresh run; those already waiting get this one.
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|current| current.same_channel(&receiver)) {
            *slot = None;
        }
        sender.send_replace(Some(shared));
        drop(slot);

        result
    }

    /// Detaches the running operation, if any.
    ///
    /// Callers already waiting still receive its outcome. The next call
    /// starts a fresh run instead of joining it.
    pub async fn reset(&self) {
        self.slot.lock().await.take();
    }

    /// Returns `true` if an operation is currently running.
    pub async fn is_running(&self) -> bool {
        let slot = self.slot.lock().await;
        slot.as_ref()
            .is_some_and(|receiver| receiver.has_changed().is_ok())
    }

    async fn join(mut receiver: watch::Receiver<Outcome<V>>) -> Result<V> {
        let Ok(outcome) = receiver.wait_for(Option::is_some).await else {
            return Err(Error::stale().with_message("The operation was abandoned"));
        };

        match &*outcome {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(error)) => Err(error.detached()),
            None => Err(Error::stale()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use leadgenie_core::ErrorKind;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_run() {
        let flight = InFlight::<u32>::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let run = || {
            let calls = Arc::clone(&calls);
            flight.run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, Error>(7)
            })
        };

        let (a, b, c) = tokio::join!(run(), run(), run());
        assert_eq!((a.unwrap(), b.unwrap(), c.unwrap()), (7, 7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!flight.is_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_followers_receive_the_error() {
        let flight = InFlight::<u32>::default();

        let fail = || {
            flight.run(|| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err::<u32, _>(Error::unauthorized().with_message("Incorrect email or password"))
            })
        };

        let (a, b) = tokio::join!(fail(), fail());
        assert_eq!(a.unwrap_err().kind, ErrorKind::Unauthorized);
        let b = b.unwrap_err();
        assert_eq!(b.kind, ErrorKind::Unauthorized);
        assert_eq!(b.message.as_deref(), Some("Incorrect email or password"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_starts_a_fresh_run() {
        let flight = InFlight::<u32>::default();

        let first = flight.run(|| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, Error>(1)
        });
        let second = async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            flight.reset().await;
            assert!(!flight.is_running().await);

            flight
                .run(|| async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok::<_, Error>(2)
                })
                .await
        };
        let third = async {
            // Joins the run started after the reset.
            tokio::time::sleep(Duration::from_millis(40)).await;
            flight.run(|| async { Ok::<_, Error>(3) }).await
        };

        let (first, second, third) = tokio::join!(first, second, third);
        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 2);
        assert_eq!(third.unwrap(), 2);
        assert!(!flight.is_running().await);
    }

    #[tokio::test]
    async fn test_sequential_calls_run_again() {
        let flight = InFlight::<u32>::default();
        assert_eq!(flight.run(|| async { Ok::<_, Error>(1) }).await.unwrap(), 1);
        assert_eq!(flight.run(|| async { Ok::<_, Error>(2) }).await.unwrap(), 2);
    }
}
