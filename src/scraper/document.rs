use serde::{Deserialize, Serialize};
use url::Url;

/// Bytes as they came off the wire, before any decoding.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub body: Vec<u8>,
    /// Value of the `Content-Type` header, empty when the server sent none
    pub content_type: String,
    /// Location after all redirects were followed
    pub final_url: Url,
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    /// Absolute http(s) URL
    pub url: String,
}

/// Normalized page content. Every field is always present; absent page
/// features are represented by the empty string or an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub language: String,
    pub canonical_url: String,
    pub headings: Vec<Heading>,
    pub links: Vec<Link>,
    pub text_blocks: Vec<String>,
}
