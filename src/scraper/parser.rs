use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use super::document::{Heading, Link, RawDocument, StructuredDocument};
use crate::error::ParseError;

/// How far into the body to look for a `<meta charset>` declaration.
const META_SNIFF_BYTES: usize = 1024;

/// Never rendered, never counted as text.
const HIDDEN: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "object", "canvas",
];

/// Elements whose whole text forms one block.
const PARAGRAPHS: &[&str] = &[
    "p", "li", "blockquote", "pre", "td", "th", "dt", "dd", "figcaption", "caption", "address",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Formatting elements that continue the surrounding run of text.
const INLINE: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "dfn", "em", "font", "i", "kbd",
    "label", "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u",
    "var",
];

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Failed to parse title selector"));

static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[name]").expect("Failed to parse meta selector"));

static HTML_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("html").expect("Failed to parse html selector"));

static BASE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("base[href]").expect("Failed to parse base selector"));

static CANONICAL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel][href]").expect("Failed to parse link selector"));

static HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6").expect("Failed to parse heading selector")
});

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Failed to parse anchor selector"));

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Failed to parse body selector"));

/// Build a [`StructuredDocument`] from fetched bytes.
///
/// Markup errors are recovered from the way browsers do; only a body with no
/// content at all is rejected.
pub fn parse(raw: &RawDocument) -> Result<StructuredDocument, ParseError> {
    let text = decode_body(&raw.body, &raw.content_type);
    if text.trim().is_empty() {
        return Err(ParseError::EmptyOrUnparseable);
    }

    let html = Html::parse_document(&text);
    let base = base_url(&html, &raw.final_url);

    Ok(StructuredDocument {
        url: raw.final_url.to_string(),
        title: extract_title(&html),
        meta_description: extract_meta_description(&html),
        language: extract_language(&html),
        canonical_url: extract_canonical(&html, &base),
        headings: extract_headings(&html),
        links: extract_links(&html, &base),
        text_blocks: extract_text_blocks(&html),
    })
}

/// Decode with the declared charset, a sniffed `<meta>` charset, or UTF-8.
/// A byte order mark wins over all of them. Bad sequences become U+FFFD.
pub fn decode_body(body: &[u8], content_type: &str) -> String {
    let encoding = charset_from_content_type(content_type)
        .or_else(|| sniff_meta_charset(body))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches(['"', '\'']);
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn sniff_meta_charset(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(META_SNIFF_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    for (start, _) in head.match_indices("<meta") {
        let tag = &head[start..];
        let tag = &tag[..tag.find('>').unwrap_or(tag.len())];

        if let Some(pos) = tag.find("charset=") {
            let value = tag[pos + "charset=".len()..].trim_start_matches(['"', '\'', ' ']);
            let end = value
                .find(|c: char| matches!(c, '"' | '\'' | ';' | '/') || c.is_whitespace())
                .unwrap_or(value.len());
            if end > 0 {
                return Some(value[..end].to_string());
            }
        }
    }

    None
}

/// `<base href>` if it resolves to an http(s) URL, the document URL otherwise.
fn base_url(html: &Html, document_url: &Url) -> Url {
    html.select(&BASE_SELECTOR)
        .next()
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| resolve_http(document_url, href))
        .unwrap_or_else(|| document_url.clone())
}

fn resolve_http(base: &Url, href: &str) -> Option<Url> {
    let url = base.join(href.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn extract_title(html: &Html) -> String {
    html.select(&TITLE_SELECTOR)
        .next()
        .map(|title| collapse_whitespace(&title.text().collect::<String>()))
        .unwrap_or_default()
}

fn extract_meta_description(html: &Html) -> String {
    html.select(&META_SELECTOR)
        .find(|meta| {
            meta.value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

fn extract_language(html: &Html) -> String {
    html.select(&HTML_SELECTOR)
        .next()
        .and_then(|root| root.value().attr("lang"))
        .map(|lang| lang.trim().to_string())
        .unwrap_or_default()
}

fn extract_canonical(html: &Html, base: &Url) -> String {
    html.select(&CANONICAL_SELECTOR)
        .find(|link| {
            link.value().attr("rel").is_some_and(|rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("canonical"))
            })
        })
        .and_then(|link| link.value().attr("href"))
        .and_then(|href| resolve_http(base, href))
        .map(String::from)
        .unwrap_or_default()
}

fn extract_headings(html: &Html) -> Vec<Heading> {
    html.select(&HEADING_SELECTOR)
        .filter_map(|heading| {
            let level = heading.value().name()[1..].parse::<u8>().ok()?;
            let text = visible_text(heading);
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect()
}

fn extract_links(html: &Html, base: &Url) -> Vec<Link> {
    html.select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| {
            let url = resolve_http(base, anchor.value().attr("href")?)?;
            Some(Link {
                text: visible_text(anchor),
                url: url.into(),
            })
        })
        .collect()
}

fn extract_text_blocks(html: &Html) -> Vec<String> {
    let root = html
        .select(&BODY_SELECTOR)
        .next()
        .unwrap_or_else(|| html.root_element());

    let mut blocks = Vec::new();
    collect_blocks(root, &mut blocks);
    blocks
}

/// A pending step of a document walk. The walks keep their own stack so
/// nesting depth is bounded by the heap, not the thread stack.
enum Piece<'a> {
    Text(&'a str),
    Element(ElementRef<'a>),
    /// End of an element whose contents have all been visited
    Close,
}

/// Queue the visible children of `element` so they pop in document order.
fn push_children<'a>(element: ElementRef<'a>, stack: &mut Vec<Piece<'a>>) {
    for child in element.children().rev() {
        match child.value() {
            Node::Text(text) => stack.push(Piece::Text(&**text)),
            Node::Element(el) if !HIDDEN.contains(&el.name()) => {
                if let Some(child) = ElementRef::wrap(child) {
                    stack.push(Piece::Element(child));
                }
            }
            _ => {}
        }
    }
}

/// Walk structural elements, emitting paragraph-like elements whole and
/// grouping loose text (plus inline formatting) into runs. Headings and bare
/// anchors end up in their own fields, not here.
fn collect_blocks(root: ElementRef<'_>, blocks: &mut Vec<String>) {
    let mut run = String::new();
    let mut stack = Vec::new();
    push_children(root, &mut stack);

    while let Some(piece) = stack.pop() {
        match piece {
            Piece::Text(text) => run.push_str(text),
            Piece::Close => flush_run(&mut run, blocks),
            Piece::Element(child) => {
                let name = child.value().name();
                if name == "a" {
                    continue;
                }
                if INLINE.contains(&name) {
                    push_visible_text(child, &mut run);
                    continue;
                }

                flush_run(&mut run, blocks);
                if PARAGRAPHS.contains(&name) {
                    push_block(visible_text(child), blocks);
                } else if !HEADINGS.contains(&name) {
                    stack.push(Piece::Close);
                    push_children(child, &mut stack);
                }
            }
        }
    }

    flush_run(&mut run, blocks);
}

fn flush_run(run: &mut String, blocks: &mut Vec<String>) {
    push_block(collapse_whitespace(run), blocks);
    run.clear();
}

fn push_block(block: String, blocks: &mut Vec<String>) {
    if !block.is_empty() {
        blocks.push(block);
    }
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_visible_text(element, &mut out);
    collapse_whitespace(&out)
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    let mut stack = Vec::new();
    push_children(element, &mut stack);

    while let Some(piece) = stack.pop() {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Close => out.push(' '),
            Piece::Element(child) => {
                // Block boundaries separate words; inline ones do not.
                if !INLINE.contains(&child.value().name()) {
                    out.push(' ');
                    stack.push(Piece::Close);
                }
                push_children(child, &mut stack);
            }
        }
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
