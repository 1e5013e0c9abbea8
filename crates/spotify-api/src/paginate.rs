//! Lazy offset pagination
//!
//! `SpotifyClient::paginate` turns a list endpoint into a stream of items.
//! Pages are requested on demand: the next page is fetched only after the
//! consumer has pulled every item of the current one, and dropping the
//! stream stops all further requests. The stream ends on the first empty
//! page or after `max_pages` pages, whichever comes first.

use std::collections::VecDeque;

use futures_util::Stream;
use futures_util::stream;
use serde_json::Value;
use tracing::debug;

use crate::client::{ResourceRequest, SpotifyClient};
use crate::error::{Error, Result};

/// Page size and bounds for `paginate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    /// Items per page, sent as `limit`
    pub limit: u32,
    /// Offset of the first page
    pub start: u32,
    /// Upper bound on pages fetched
    pub max_pages: u32,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            limit: 50,
            start: 0,
            max_pages: 20,
        }
    }
}

struct Cursor<'a, P, T> {
    client: &'a SpotifyClient,
    request: ResourceRequest,
    parser: P,
    options: PageOptions,
    offset: u32,
    pages: u32,
    buffered: VecDeque<T>,
    exhausted: bool,
}

impl<P, T> Cursor<'_, P, T> {
    fn page_request(&self) -> ResourceRequest {
        self.request
            .clone()
            .query("limit", self.options.limit.to_string())
            .query("offset", self.offset.to_string())
    }
}

impl SpotifyClient {
    /// Stream the items of a paginated endpoint.
    ///
    /// `limit` and `offset` are written into the request query for each
    /// page, replacing any caller-supplied values. Each page goes through
    /// `request` with the request's own retry budget. A failed page is
    /// yielded as an error and ends the stream.
    pub fn paginate<'a, T, P>(
        &'a self,
        request: ResourceRequest,
        options: PageOptions,
        parser: P,
    ) -> impl Stream<Item = Result<T>> + 'a
    where
        P: Fn(Value) -> Vec<T> + 'a,
        T: 'a,
    {
        let cursor = Cursor {
            client: self,
            request,
            parser,
            options,
            offset: options.start,
            pages: 0,
            buffered: VecDeque::new(),
            exhausted: false,
        };

        stream::try_unfold(cursor, |mut cursor| async move {
            loop {
                if let Some(item) = cursor.buffered.pop_front() {
                    return Ok::<_, Error>(Some((item, cursor)));
                }
                if cursor.exhausted || cursor.pages >= cursor.options.max_pages {
                    debug!(pages = cursor.pages, "pagination finished");
                    return Ok(None);
                }

                let page_request = cursor.page_request();
                let page = cursor
                    .client
                    .request(&page_request, &cursor.parser)
                    .await?;
                cursor.pages += 1;
                debug!(
                    page = cursor.pages,
                    offset = cursor.offset,
                    items = page.len(),
                    "fetched page"
                );

                if page.is_empty() {
                    cursor.exhausted = true;
                    continue;
                }
                cursor.offset = cursor.offset.saturating_add(cursor.options.limit);
                cursor.buffered.extend(page);
            }
        })
    }
}
