use std::time::Duration;

use futures::future::join_all;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{ApiRequest, AuthHeaders, FetchError, Transport};

pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fetches every URL concurrently and returns the decoded documents in the
/// order they were requested. A URL that ultimately fails yields `None`; a
/// single failure never aborts the batch.
pub async fn fetch_all<T, R>(transport: &R, urls: &[String], headers: &AuthHeaders, max_attempts: u32) -> Vec<Option<T>>
where
    T: DeserializeOwned,
    R: Transport
{
    let requests = urls.iter().map(|url| async move {
        match fetch_with_retry(transport, url, headers, max_attempts).await {
            Ok(document) => Some(document),
            Err(e) => {
                warn!(url = %url, error = %e, "dropping document from batch");
                None
            }
        }
    });

    join_all(requests).await
}

/// Per-URL policy: 429 waits for the server's `Retry-After` (2s if absent)
/// and retries up to `max_attempts`; any other non-success status gives up
/// immediately.
pub async fn fetch_with_retry<T, R>(
    transport: &R,
    url: &str,
    headers: &AuthHeaders,
    max_attempts: u32
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    R: Transport
{
    for attempt in 1..=max_attempts {
        let response = transport.send(ApiRequest::get(url).auth(headers)).await?;

        match response.status {
            200 => return Ok(response.json()?),
            429 => {
                let delay = response.retry_after.unwrap_or(DEFAULT_RETRY_AFTER);
                debug!(url = %url, attempt, max_attempts, ?delay, "rate limited, retrying");
                sleep(delay).await;
            }
            status => return Err(FetchError::Absent { status })
        }
    }

    Err(FetchError::RateLimited {
        attempts: max_attempts
    })
}
