use crate::prelude::*;
use std::{future::Future, time::Duration};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Outcome of one run of a repeating service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Done,
}

/// Runs `f` every `dur` until it reports `Tick::Done` or `token` is
/// cancelled. Failed runs are logged and the service keeps going.
pub fn start_service<T, F>(
    dur: Duration,
    name: String,
    immediate: bool,
    token: CancellationToken,
    mut f: T,
) -> JoinHandle<()>
where
    T: FnMut() -> F + Send + 'static,
    F: Future<Output = Result<Tick>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(dur);
        if !immediate {
            interval.tick().await;
        }
        debug!("Starting service {}", name);
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Service {} cancelled", name);
                    break;
                }
                _ = interval.tick() => {}
            }
            trace!("Running {}", name);
            match f().await {
                Ok(Tick::Continue) => continue,
                Ok(Tick::Done) => {
                    debug!("Service {} finished", name);
                    break;
                }
                Err(e) => error!("Task {} failure! {:?}", name, e),
            }
        }
    })
}
