//! Conversation history paging
//!
//! The backend paginates history and hands back the URL of the next page in
//! `next`. These helpers walk the cursor chain so callers see one stream of
//! messages.

use crate::backend::{BackendApi, ChatMessage};
use crate::error::ApiError;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use tracing::debug;

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Every history message, oldest page first, fetching pages lazily
pub fn history_stream<'a>(
    api: &'a dyn BackendApi,
    token: &'a str,
) -> impl Stream<Item = Result<ChatMessage, ApiError>> + 'a {
    let pages = stream::try_unfold(Cursor::Start, move |cursor| async move {
        let cursor = match cursor {
            Cursor::Done => return Ok::<_, ApiError>(None),
            Cursor::Start => None,
            Cursor::Next(url) => Some(url),
        };

        let page = api.conversation_history(token, cursor).await?;
        debug!(
            "History page: {} messages, more={}",
            page.results.len(),
            page.next.is_some()
        );

        let next = match page.next {
            Some(url) => Cursor::Next(url),
            None => Cursor::Done,
        };
        Ok(Some((page.results, next)))
    });

    pages
        .map_ok(|results| stream::iter(results.into_iter().map(Ok)))
        .try_flatten()
}

/// Collect up to `limit` messages, stopping page fetches once enough are read
pub async fn collect_history(
    api: &dyn BackendApi,
    token: &str,
    limit: usize,
) -> Result<Vec<ChatMessage>, ApiError> {
    history_stream(api, token).take(limit).try_collect().await
}
