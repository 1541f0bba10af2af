//! Atom feed parsing and projection into [`ArxivPaper`] records.
//!
//! Parsing happens in two steps. The document is first read into a small element
//! tree keyed by local names (namespace prefixes such as `arxiv:` are dropped). The
//! tree is then projected entry by entry; a missing required field fails the whole
//! feed with the entry's 0-based index, so a bad response never shrinks silently.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::models::{ArxivPaper, ArxivPaperBuilder};

/// Entry ids under this prefix are arXiv's way of reporting a rejected query
const API_ERROR_ID_PREFIX: &str = "http://arxiv.org/api/errors";

/// Errors raised while turning a response body into papers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The body is not well-formed XML
    #[error("invalid XML: {0}")]
    InvalidXml(String),

    /// An entry lacks a field every paper must have
    #[error("entry {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    /// An entry's timestamp could not be interpreted
    #[error("entry {index} has unparseable timestamp `{value}`")]
    InvalidTimestamp { index: usize, value: String },

    /// The feed is arXiv's error report
    #[error("{0}")]
    Api(String),
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, FeedError> {
        let mut attributes = BTreeMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| FeedError::InvalidXml(e.to_string()))?;
            if attr.key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| FeedError::InvalidXml(e.to_string()))?
                .into_owned();
            attributes.insert(key, value);
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Trimmed text of a child, `None` when absent or blank
    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

fn parse_tree(xml: &str) -> Result<Element, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            FeedError::InvalidXml(format!("{} at byte {}", e, reader.error_position()))
        })?;

        match event {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| FeedError::InvalidXml(e.to_string()))?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(FeedError::InvalidXml(format!(
                            "text outside the root element at byte {}",
                            reader.buffer_position()
                        )))
                    }
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                // quick-xml has already checked that the end tag matches
                let element = stack
                    .pop()
                    .ok_or_else(|| FeedError::InvalidXml("unbalanced end tag".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FeedError::InvalidXml(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| FeedError::InvalidXml("document has no root element".to_string()))
}

/// Parse an arXiv Atom feed into papers, in feed order
///
/// A well-formed document without a `feed` root or without entries yields an empty
/// list. A body that is not an XML document at all, empty included, is `InvalidXml`.
pub fn parse_feed(xml: &str) -> Result<Vec<ArxivPaper>, FeedError> {
    let root = parse_tree(xml)?;

    if root.name != "feed" {
        tracing::warn!("arXiv response root is <{}>, expected <feed>", root.name);
        return Ok(Vec::new());
    }

    let entries: Vec<&Element> = root.children_named("entry").collect();

    if let Some(message) = api_error(&entries) {
        return Err(FeedError::Api(message));
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| project_entry(index, entry))
        .collect()
}

fn api_error(entries: &[&Element]) -> Option<String> {
    entries.iter().find_map(|entry| {
        let id = entry.child_text("id")?;
        if !id.starts_with(API_ERROR_ID_PREFIX) {
            return None;
        }
        Some(
            entry
                .child_text("summary")
                .unwrap_or_else(|| format!("query rejected ({})", id)),
        )
    })
}

fn project_entry(index: usize, entry: &Element) -> Result<ArxivPaper, FeedError> {
    let missing = |field| FeedError::MissingField { index, field };

    let title = entry.child_text("title").ok_or_else(|| missing("title"))?;
    let link = entry
        .child_text("id")
        .or_else(|| link_href(entry, |l| l.attr("rel") == Some("alternate")))
        .ok_or_else(|| missing("id"))?;
    let published = entry
        .child_text("published")
        .ok_or_else(|| missing("published"))?;

    let authors = entry
        .children_named("author")
        .filter_map(|author| author.child_text("name"))
        .collect();

    let categories: Vec<String> = entry
        .children_named("category")
        .filter_map(|c| c.attr("term"))
        .map(str::to_string)
        .collect();

    let primary_category = entry
        .child("primary_category")
        .and_then(|c| c.attr("term"))
        .map(str::to_string)
        .or_else(|| categories.first().cloned());

    let pdf_url = link_href(entry, |l| {
        l.attr("title") == Some("pdf") || l.attr("type") == Some("application/pdf")
    });

    Ok(ArxivPaperBuilder::new(title, link, published)
        .authors(authors)
        .summary(entry.child_text("summary").unwrap_or_default())
        .updated(entry.child_text("updated"))
        .pdf_url(pdf_url)
        .categories(categories)
        .primary_category(primary_category)
        .doi(entry.child_text("doi"))
        .comment(entry.child_text("comment"))
        .journal_ref(entry.child_text("journal_ref"))
        .build())
}

fn link_href(entry: &Element, predicate: impl Fn(&Element) -> bool) -> Option<String> {
    entry
        .children_named("link")
        .find(|l| predicate(l))
        .and_then(|l| l.attr("href"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ENTRIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=cat:cs.AI</title>
  <entry>
    <id>http://arxiv.org/abs/2101.00001v1</id>
    <updated>2021-01-02T10:00:00Z</updated>
    <published>2021-01-01T09:30:00Z</published>
    <title>Scaling Laws for
      Sparse Transformers</title>
    <summary>
      We study sparse &amp; dense models.
    </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name><arxiv:affiliation>Bletchley</arxiv:affiliation></author>
    <arxiv:doi>10.1000/xyz123</arxiv:doi>
    <arxiv:comment>12 pages</arxiv:comment>
    <link href="http://arxiv.org/abs/2101.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2101.00001v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
    <category term="stat.ML" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2002.00002v3</id>
    <published>2020-02-01T00:00:00Z</published>
    <title><![CDATA[Graph Networks]]></title>
    <summary>Short.</summary>
    <author><name>Grace Hopper</name></author>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_two_entries() {
        let papers = parse_feed(TWO_ENTRIES).unwrap();
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.title, "Scaling Laws for\n      Sparse Transformers");
        assert_eq!(first.link, "http://arxiv.org/abs/2101.00001v1");
        assert_eq!(first.published, "2021-01-01T09:30:00Z");
        assert_eq!(first.updated.as_deref(), Some("2021-01-02T10:00:00Z"));
        assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(first.summary, "We study sparse & dense models.");
        assert_eq!(first.categories, vec!["cs.LG", "cs.AI", "stat.ML"]);
        assert_eq!(first.primary_category.as_deref(), Some("cs.LG"));
        assert_eq!(first.pdf_url.as_deref(), Some("http://arxiv.org/pdf/2101.00001v1"));
        assert_eq!(first.doi.as_deref(), Some("10.1000/xyz123"));
        assert_eq!(first.comment.as_deref(), Some("12 pages"));
        assert_eq!(first.journal_ref, None);

        let second = &papers[1];
        assert_eq!(second.title, "Graph Networks");
        assert_eq!(second.authors, vec!["Grace Hopper"]);
        // Falls back to the first category without arxiv:primary_category
        assert_eq!(second.primary_category.as_deref(), Some("cs.AI"));
        assert_eq!(second.pdf_url, None);
    }

    #[test]
    fn test_missing_title_fails_whole_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><id>http://arxiv.org/abs/1</id><published>2021-01-01T00:00:00Z</published><title>One</title></entry>
  <entry><id>http://arxiv.org/abs/2</id><published>2021-01-01T00:00:00Z</published></entry>
  <entry><id>http://arxiv.org/abs/3</id><published>2021-01-01T00:00:00Z</published><title>Three</title></entry>
</feed>"#;

        assert_eq!(
            parse_feed(xml).unwrap_err(),
            FeedError::MissingField {
                index: 1,
                field: "title"
            }
        );
    }

    #[test]
    fn test_blank_published_counts_as_missing() {
        let xml = r#"<feed><entry><id>http://arxiv.org/abs/1</id><title>T</title><published>  </published></entry></feed>"#;
        assert_eq!(
            parse_feed(xml).unwrap_err(),
            FeedError::MissingField {
                index: 0,
                field: "published"
            }
        );
    }

    #[test]
    fn test_link_falls_back_to_alternate() {
        let xml = r#"<feed><entry><title>T</title><published>2021-01-01T00:00:00Z</published>
<link rel="alternate" href="http://arxiv.org/abs/2101.00001v1"/></entry></feed>"#;
        let papers = parse_feed(xml).unwrap();
        assert_eq!(papers[0].link, "http://arxiv.org/abs/2101.00001v1");
    }

    #[test]
    fn test_empty_feed_is_not_an_error() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">
  <title>ArXiv Query</title>
  <opensearch:totalResults>0</opensearch:totalResults>
</feed>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
        assert!(parse_feed("<html><body>maintenance</body></html>").unwrap().is_empty());
    }

    #[test]
    fn test_body_without_document_is_invalid() {
        for body in ["", "  \n ", "Rate exceeded.", "<!-- nothing here -->"] {
            assert!(
                matches!(parse_feed(body), Err(FeedError::InvalidXml(_))),
                "{:?} should be rejected",
                body
            );
        }

        // Trailing garbage after a complete feed
        let err = parse_feed("<feed></feed>Rate exceeded.").unwrap_err();
        assert!(matches!(err, FeedError::InvalidXml(_)));
    }

    #[test]
    fn test_invalid_xml() {
        let err = parse_feed("<feed><entry><title>T</entry></feed>").unwrap_err();
        assert!(matches!(err, FeedError::InvalidXml(_)));

        let err = parse_feed("<feed><entry>").unwrap_err();
        assert!(matches!(err, FeedError::InvalidXml(_)));
    }

    #[test]
    fn test_api_error_entry() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
    <updated>2024-01-01T00:00:00-05:00</updated>
  </entry>
</feed>"#;
        assert_eq!(
            parse_feed(xml).unwrap_err(),
            FeedError::Api("incorrect id format for 1234".to_string())
        );
    }
}
