//! Batched page fetching for paginated API listings.
//!
//! Pages are requested `PAGES_PER_BATCH` at a time, concurrently. The batch
//! that sees the end of the listing is the last one issued; pages past the end
//! are fetched speculatively and contribute nothing.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use futures::future::join_all;

use crate::error::Result;

/// Number of consecutive pages requested concurrently per batch.
pub const PAGES_PER_BATCH: u32 = 8;

/// Outcome of fetching one page.
#[derive(Debug, Clone, PartialEq)]
pub enum Page<T> {
    /// The page existed. The payload may be empty after filtering; that is not end-of-data.
    Items(T),
    /// The listing has no entries at or beyond this page.
    End,
    /// The page could not be fetched within its retry budget. Contributes
    /// nothing and does not by itself end the listing.
    Failed,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Page<U> {
        match self {
            Page::Items(v) => Page::Items(f(v)),
            Page::End => Page::End,
            Page::Failed => Page::Failed,
        }
    }
}

/// Fetch pages `1, 2, ...` in batches of `batch_size` and merge the returned maps.
///
/// Stops after a batch in which any page returned [`Page::End`], or in which no
/// page returned [`Page::Items`] (so a run of failed pages cannot loop forever).
/// Errors returned by `fetch` are fatal and abort the whole listing.
pub async fn collect_pages<K, V, F, Fut>(batch_size: u32, mut fetch: F) -> Result<HashMap<K, V>>
where
    K: Eq + Hash,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<HashMap<K, V>>>>,
{
    let batch_size = batch_size.max(1);
    let mut merged = HashMap::new();
    let mut first = 1u32;
    loop {
        let pages = join_all((first..first + batch_size).map(&mut fetch)).await;
        let mut reached_end = false;
        let mut any_items = false;
        for (offset, page) in pages.into_iter().enumerate() {
            match page? {
                Page::Items(map) => {
                    any_items = true;
                    merged.extend(map);
                }
                Page::End => reached_end = true,
                Page::Failed => {
                    tracing::warn!(page = first + offset as u32, "page skipped after retries");
                }
            }
        }
        if reached_end || !any_items {
            return Ok(merged);
        }
        first += batch_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Serves `total` items as pages of `per_page`, recording every page number requested.
    struct Listing {
        total: u32,
        per_page: u32,
        requested: Mutex<Vec<u32>>,
    }

    impl Listing {
        fn new(total: u32, per_page: u32) -> Self {
            Self {
                total,
                per_page,
                requested: Mutex::new(Vec::new()),
            }
        }

        async fn page(&self, n: u32) -> Result<Page<HashMap<u32, u32>>> {
            self.requested.lock().unwrap().push(n);
            let start = (n - 1) * self.per_page;
            if start >= self.total {
                return Ok(Page::End);
            }
            let end = (start + self.per_page).min(self.total);
            Ok(Page::Items((start..end).map(|i| (i, i * 10)).collect()))
        }
    }

    #[tokio::test]
    async fn returns_every_item_and_bounded_extra_fetches() {
        for (total, per_page) in [(0, 10), (1, 10), (10, 10), (95, 10), (80, 10), (81, 10), (300, 7)] {
            let listing = Listing::new(total, per_page);
            let merged = collect_pages(PAGES_PER_BATCH, |n| listing.page(n)).await.unwrap();
            assert_eq!(merged.len(), total as usize);
            assert_eq!(merged.get(&0).copied(), (total > 0).then_some(0));

            let requested = listing.requested.lock().unwrap().clone();
            let non_empty = total.div_ceil(per_page) as usize;
            assert!(requested.len() >= non_empty);
            // A listing that ends exactly on a batch boundary costs one whole
            // extra batch to observe the end; see DESIGN.md "Pagination overshoot".
            assert!(
                requested.len() - non_empty <= PAGES_PER_BATCH as usize,
                "total={total}: {} fetches for {non_empty} pages",
                requested.len()
            );
        }
    }

    #[tokio::test]
    async fn exact_batch_boundary_needs_one_more_batch() {
        let listing = Listing::new(80, 10);
        collect_pages(PAGES_PER_BATCH, |n| listing.page(n)).await.unwrap();
        // Pages 1-8 are all full, so 9-16 must be probed to see the end.
        assert_eq!(listing.requested.lock().unwrap().len(), 16);
    }

    #[tokio::test]
    async fn failed_page_does_not_end_listing() {
        let calls = AtomicU32::new(0);
        let merged = collect_pages(4, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(match n {
                    2 => Page::Failed,
                    1 | 3..=6 => Page::Items(HashMap::from([(n, ())])),
                    _ => Page::End,
                })
            }
        })
        .await
        .unwrap();
        let mut keys: Vec<u32> = merged.into_keys().collect();
        keys.sort();
        assert_eq!(keys, vec![1, 3, 4, 5, 6]);
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn all_failed_batch_terminates() {
        let merged: HashMap<u32, ()> = collect_pages(PAGES_PER_BATCH, |_| async { Ok(Page::Failed) })
            .await
            .unwrap();
        assert!(merged.is_empty());
    }

    #[tokio::test]
    async fn empty_items_page_is_not_end() {
        let merged = collect_pages(2, |n| async move {
            Ok(match n {
                1 => Page::Items(HashMap::new()),
                2 | 3 => Page::Items(HashMap::from([(n, n)])),
                _ => Page::End,
            })
        })
        .await
        .unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[tokio::test]
    async fn fatal_error_aborts() {
        let res: Result<HashMap<u32, ()>> = collect_pages(PAGES_PER_BATCH, |n| async move {
            if n == 3 {
                Err(SyncError::Api("Invalid access token.".into()))
            } else {
                Ok(Page::Items(HashMap::new()))
            }
        })
        .await;
        assert!(matches!(res, Err(SyncError::Api(_))));
    }
}
