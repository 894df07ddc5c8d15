//! Read-only listings of buckets and objects as lazy, paginated streams.

use std::future::Future;

use futures::stream::{self, Stream, StreamExt};
use tracing::debug;

use crate::contract::{Bucket, ObjectEntry, ObjectStore, Page};
use crate::error::CatalogError;

pub struct BucketCatalog<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> BucketCatalog<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every bucket visible to the store's credentials.
    pub fn list_buckets(&self) -> impl Stream<Item = Result<Bucket, CatalogError>> + 'a {
        let store = self.store;
        paginate(move |token| async move {
            store
                .list_buckets(token)
                .await
                .map_err(|source| CatalogError::Buckets { source })
        })
    }

    /// Every object in `bucket`.
    pub fn list_objects(
        &self,
        bucket: &str,
    ) -> impl Stream<Item = Result<ObjectEntry, CatalogError>> + 'a {
        let store = self.store;
        let bucket = bucket.to_string();
        paginate(move |token| {
            let bucket = bucket.clone();
            async move {
                store
                    .list_objects(&bucket, token)
                    .await
                    .map_err(|source| CatalogError::Objects { bucket, source })
            }
        })
    }
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Turn a page fetcher into a flat item stream. Pages are requested only as
/// the consumer reaches them; the first error is yielded and ends the stream.
fn paginate<'a, T, F, Fut>(mut fetch: F) -> impl Stream<Item = Result<T, CatalogError>> + 'a
where
    T: 'a,
    F: FnMut(Option<String>) -> Fut + 'a,
    Fut: Future<Output = Result<Page<T>, CatalogError>> + 'a,
{
    stream::unfold(Cursor::Start, move |cursor| {
        let request = match cursor {
            Cursor::Start => Some(fetch(None)),
            Cursor::Next(token) => Some(fetch(Some(token))),
            Cursor::Done => None,
        };
        async move {
            match request?.await {
                Ok(page) => {
                    debug!(items = page.items.len(), more = page.next.is_some(), "Fetched listing page");
                    let cursor = match page.next {
                        Some(token) if !token.is_empty() => Cursor::Next(token),
                        _ => Cursor::Done,
                    };
                    let items: Vec<_> = page.items.into_iter().map(Ok).collect();
                    Some((items, cursor))
                }
                Err(e) => Some((vec![Err(e)], Cursor::Done)),
            }
        }
    })
    .flat_map(stream::iter)
}
