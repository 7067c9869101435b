//! Page-size / continuation-token precedence for list calls.
//!
//! Coda binds the page size to the request that produced a `nextPageToken`,
//! so a continuation call must not send `limit` again: doing so would change
//! the page size midway through a traversal.

use serde::Deserialize;

/// List arguments as supplied by a tool caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default, alias = "pageToken")]
    pub next_page_token: Option<String>,
}

/// What is actually sent upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedListParams {
    pub limit: Option<u32>,
    pub page_token: Option<String>,
}

/// A present continuation token wins and the limit is dropped; otherwise the
/// limit (possibly absent) is used and no token is sent.
pub fn resolve_list_params(limit: Option<u32>, page_token: Option<String>) -> ResolvedListParams {
    match page_token {
        Some(token) => ResolvedListParams {
            limit: None,
            page_token: Some(token),
        },
        None => ResolvedListParams {
            limit,
            page_token: None,
        },
    }
}

impl ListParams {
    pub fn resolve(&self) -> ResolvedListParams {
        resolve_list_params(self.limit, self.next_page_token.clone())
    }
}
