use crate::store::ScrapeRecord;

/// Flatten a record into ordered key/value rows.
pub fn flat_pairs(record: &ScrapeRecord) -> Vec<(String, String)> {
    let document = &record.document;
    let mut pairs = vec![
        ("url".to_string(), record.url.clone()),
        ("final_url".to_string(), document.url.clone()),
        ("title".to_string(), document.title.clone()),
        ("meta_description".to_string(), document.meta_description.clone()),
        ("language".to_string(), document.language.clone()),
        ("canonical_url".to_string(), document.canonical_url.clone()),
    ];

    for (i, heading) in document.headings.iter().enumerate() {
        pairs.push((
            format!("heading.{i}"),
            format!("h{}: {}", heading.level, heading.text),
        ));
    }
    for (i, link) in document.links.iter().enumerate() {
        pairs.push((format!("link.{i}"), format!("{} <{}>", link.text, link.url)));
    }
    for (i, block) in document.text_blocks.iter().enumerate() {
        pairs.push((format!("text.{i}"), block.clone()));
    }
    for (name, value) in record.summary.metrics() {
        pairs.push((format!("summary.{name}"), value));
    }

    pairs.push(("created_at".to_string(), record.created_at.to_rfc3339()));
    pairs
}

/// Two-column `Key,Value` CSV with CRLF line endings.
pub fn to_csv(pairs: &[(String, String)]) -> String {
    let mut out = String::from("Key,Value\r\n");
    for (key, value) in pairs {
        out.push_str(&escape_field(key));
        out.push(',');
        out.push_str(&escape_field(value));
        out.push_str("\r\n");
    }
    out
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
