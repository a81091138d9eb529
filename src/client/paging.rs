//! Offset-based paging for list operations.

use crate::core::config::PagingConfig;
use crate::core::{MetricsAdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Caller-controlled paging for a list call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    /// Items to skip before the first page
    pub skip: Option<usize>,
    /// Upper bound on items per page
    pub max_page_size: Option<usize>,
    /// Token returned by a previous page; takes precedence over `skip`
    pub continuation_token: Option<String>,
}

impl ListOptions {
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = Some(size);
        self
    }

    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }
}

/// One page of a list result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present when more items follow
    pub continuation_token: Option<String>,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }
}

/// Parse a continuation token back into an offset
pub fn parse_continuation_token(token: &str) -> Result<usize> {
    token
        .parse::<usize>()
        .map_err(|_| MetricsAdvisorError::parse(format!("invalid continuation token '{}'", token)))
}

/// Cut one page out of an already ordered result set
pub fn paginate<T>(items: Vec<T>, options: &ListOptions, paging: &PagingConfig) -> Result<Page<T>> {
    let offset = match &options.continuation_token {
        Some(token) => parse_continuation_token(token)?,
        None => options.skip.unwrap_or(0),
    };

    let page_size = match options.max_page_size {
        Some(0) => {
            return Err(MetricsAdvisorError::invalid_argument(
                "max_page_size must be greater than 0",
            ))
        },
        Some(size) => size.min(paging.max_page_size),
        None => paging.default_page_size,
    };

    let total = items.len();
    let end = offset.saturating_add(page_size).min(total);
    let items: Vec<T> = items.into_iter().skip(offset).take(page_size).collect();
    let continuation_token = (end < total).then(|| end.to_string());

    Ok(Page {
        items,
        continuation_token,
    })
}

/// Follow continuation tokens until the listing is exhausted
pub async fn collect_all<T, F, Fut>(base: ListOptions, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(ListOptions) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut all = Vec::new();
    let mut options = base;

    loop {
        let page = fetch(options.clone()).await?;
        all.extend(page.items);
        match page.continuation_token {
            Some(token) => options.continuation_token = Some(token),
            None => return Ok(all),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paging() -> PagingConfig {
        PagingConfig {
            default_page_size: 3,
            max_page_size: 5,
        }
    }

    #[test]
    fn test_default_page_size() {
        let page = paginate((0..10).collect(), &ListOptions::default(), &paging()).unwrap();
        assert_eq!(page.items, vec![0, 1, 2]);
        assert_eq!(page.continuation_token.as_deref(), Some("3"));
    }

    #[test]
    fn test_page_size_is_clamped() {
        let options = ListOptions::default().with_max_page_size(50);
        let page = paginate((0..10).collect(), &options, &paging()).unwrap();
        assert_eq!(page.items.len(), 5);
    }

    #[test]
    fn test_skip_and_last_page() {
        let options = ListOptions::default().with_skip(8);
        let page = paginate((0..10).collect(), &options, &paging()).unwrap();
        assert_eq!(page.items, vec![8, 9]);
        assert!(!page.has_more());
    }

    #[test]
    fn test_skip_past_end() {
        let options = ListOptions::default().with_skip(20);
        let page: Page<i32> = paginate((0..10).collect(), &options, &paging()).unwrap();
        assert!(page.items.is_empty());
        assert!(page.continuation_token.is_none());
    }

    #[test]
    fn test_token_overrides_skip() {
        let options = ListOptions::default()
            .with_skip(1)
            .with_continuation_token("6");
        let page = paginate((0..10).collect(), &options, &paging()).unwrap();
        assert_eq!(page.items, vec![6, 7, 8]);
    }

    #[test]
    fn test_invalid_inputs() {
        let zero = ListOptions::default().with_max_page_size(0);
        assert!(paginate(vec![1], &zero, &paging()).is_err());

        let bad_token = ListOptions::default().with_continuation_token("abc");
        assert!(paginate(vec![1], &bad_token, &paging()).is_err());
    }

    #[tokio::test]
    async fn test_collect_all_follows_tokens() {
        let data: Vec<i32> = (0..11).collect();
        let all = collect_all(ListOptions::default(), |options| {
            let data = data.clone();
            async move { paginate(data, &options, &paging()) }
        })
        .await
        .unwrap();
        assert_eq!(all, data);
    }
}
