//! Link API response model
//!
//! Mirrors the subset of a MediaWiki `action=query&prop=links` response the
//! crawler reads. Every level is optional; a missing page or an empty result
//! simply contributes no links.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level API response
#[derive(Debug, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub query: Option<ApiQuery>,

    #[serde(default, rename = "continue")]
    pub continuation: Option<ApiContinue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiQuery {
    /// Pages keyed by page id (`-1` for a missing title)
    #[serde(default)]
    pub pages: BTreeMap<String, ApiPage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiPage {
    #[serde(default)]
    pub links: Vec<ApiLink>,
}

#[derive(Debug, Deserialize)]
pub struct ApiLink {
    pub title: String,
    pub ns: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiContinue {
    #[serde(default)]
    pub plcontinue: Option<String>,
}

impl ApiResponse {
    /// Titles of links in `namespace`, in response order
    pub fn links_in_namespace(&self, namespace: i64) -> impl Iterator<Item = &str> {
        self.query
            .iter()
            .flat_map(|q| q.pages.values())
            .flat_map(|page| page.links.iter())
            .filter(move |link| link.ns == namespace)
            .map(|link| link.title.as_str())
    }

    /// The continuation cursor, if the API has more links to return
    pub fn cursor(&self) -> Option<&str> {
        self.continuation
            .as_ref()
            .and_then(|c| c.plcontinue.as_deref())
            .filter(|cursor| !cursor.is_empty())
    }
}
