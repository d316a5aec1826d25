use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

use super::document::StructuredDocument;

const WORDS_PER_MINUTE: usize = 200;

/// Scalar metrics derived from a [`StructuredDocument`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub word_count: usize,
    pub heading_count: usize,
    pub link_count: usize,
    pub text_block_count: usize,
    pub internal_link_count: usize,
    pub external_link_count: usize,
    pub unique_link_count: usize,
    pub reading_time_minutes: usize,
    pub has_title: bool,
    pub has_meta_description: bool,
}

impl Summary {
    /// Metrics as ordered name/value pairs, for flat exports.
    pub fn metrics(&self) -> Vec<(&'static str, String)> {
        vec![
            ("word_count", self.word_count.to_string()),
            ("heading_count", self.heading_count.to_string()),
            ("link_count", self.link_count.to_string()),
            ("text_block_count", self.text_block_count.to_string()),
            ("internal_link_count", self.internal_link_count.to_string()),
            ("external_link_count", self.external_link_count.to_string()),
            ("unique_link_count", self.unique_link_count.to_string()),
            ("reading_time_minutes", self.reading_time_minutes.to_string()),
            ("has_title", self.has_title.to_string()),
            ("has_meta_description", self.has_meta_description.to_string()),
        ]
    }
}

pub fn summarize(document: &StructuredDocument) -> Summary {
    let word_count = document
        .text_blocks
        .iter()
        .map(|block| block.split_whitespace().count())
        .sum();

    let page_host = Url::parse(&document.url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string));

    let internal_link_count = document
        .links
        .iter()
        .filter(|link| {
            let host = Url::parse(&link.url)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string));
            host.is_some() && host == page_host
        })
        .count();

    let unique_link_count = document
        .links
        .iter()
        .map(|link| link.url.as_str())
        .collect::<HashSet<_>>()
        .len();

    Summary {
        word_count,
        heading_count: document.headings.len(),
        link_count: document.links.len(),
        text_block_count: document.text_blocks.len(),
        internal_link_count,
        external_link_count: document.links.len() - internal_link_count,
        unique_link_count,
        reading_time_minutes: word_count.div_ceil(WORDS_PER_MINUTE),
        has_title: !document.title.is_empty(),
        has_meta_description: !document.meta_description.is_empty(),
    }
}
