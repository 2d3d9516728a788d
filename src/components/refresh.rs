use std::future::Future;

use crate::shared::error::EspResult;

/// What a refresh loop does after a result has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Wait,
    Stop,
}

/// Fetch, apply, sleep, repeat.
///
/// `fetch` returns `None` when there is nothing to ask for (no key), which
/// ends the loop, as does `apply` answering [`Next::Stop`]. The sleep starts
/// after each result, so requests never overlap.
pub async fn refresh_every<T, Fetch, FetchFut, Sleep, SleepFut>(
    mut fetch: Fetch,
    mut apply: impl FnMut(EspResult<T>) -> Next,
    mut sleep: Sleep,
) where
    Fetch: FnMut() -> Option<FetchFut>,
    FetchFut: Future<Output = EspResult<T>>,
    Sleep: FnMut() -> SleepFut,
    SleepFut: Future<Output = ()>,
{
    loop {
        let Some(request) = fetch() else {
            break;
        };
        if apply(request.await) == Next::Stop {
            break;
        }
        sleep().await;
    }
}
