//! Generic traversal of server-paginated feeds.
//!
//! [`paginate`] turns "fetch a page, follow its next link" into a flat stream
//! of entries. The stream is lazy (nothing is fetched before the first poll),
//! keeps the service's order page by page and ends after the first page
//! without a next link. A failed fetch is yielded as the last item; no
//! further pages are requested after it.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::{debug, error};

use crate::contract::{Entry, FeedLocator, FeedSource};
use crate::error::AggregateError;

/// Stream every entry of the feed starting at `first`.
pub fn paginate<'a, S>(
    source: &'a S,
    first: FeedLocator,
) -> BoxStream<'a, Result<Entry, AggregateError>>
where
    S: FeedSource,
{
    stream::try_unfold(Some(first), move |locator| async move {
        let Some(locator) = locator else {
            return Ok(None);
        };

        debug!(%locator, "Fetching feed page");
        let page = match source.fetch_page(&locator).await {
            Ok(page) => page,
            Err(e) => {
                error!(%locator, error = %e, "Feed page fetch failed");
                return Err(AggregateError::FeedFetch { locator, source: e });
            }
        };
        debug!(
            %locator,
            entries = page.entries.len(),
            has_next = page.next.is_some(),
            "Fetched feed page"
        );

        Ok(Some((page.entries, page.next.map(FeedLocator::Next))))
    })
    .map_ok(|entries| stream::iter(entries.into_iter().map(Ok::<Entry, AggregateError>)))
    .try_flatten()
    .boxed()
}
