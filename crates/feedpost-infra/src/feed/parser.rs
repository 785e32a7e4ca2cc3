//! RSS 2.0 parsing with quick-xml.
//!
//! The document is checked once up front (well-formed, has a `channel`
//! under the root), then items are read lazily from an owned copy of the
//! bytes as the pipeline asks for them.

use std::fmt;
use std::io::Cursor;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use feedpost_core::error::FetchError;
use feedpost_core::ports::{FeedItems, RawFeedItem};

// Element depths, counting the root as 1.
const CHANNEL_DEPTH: usize = 2;
const ITEM_DEPTH: usize = 3;
const FIELD_DEPTH: usize = 4;

/// Check `bytes` and return its items in document order.
pub fn parse_feed(bytes: Vec<u8>) -> Result<FeedItems, FetchError> {
    validate(&bytes)?;
    Ok(Box::new(FeedItemIter::new(bytes)))
}

fn malformed(position: impl fmt::Display, err: impl fmt::Display) -> FetchError {
    FetchError::Malformed(format!("at byte {position}: {err}"))
}

/// Full pass over the document without building any items.
fn validate(bytes: &[u8]) -> Result<(), FetchError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut has_channel = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed(reader.buffer_position(), e))?;

        match event {
            Event::Start(e) => {
                if depth == 0 && seen_root {
                    return Err(malformed(reader.buffer_position(), "multiple root elements"));
                }
                seen_root = true;
                depth += 1;
                if depth == CHANNEL_DEPTH && e.name().as_ref() == b"channel" {
                    has_channel = true;
                }
            }
            Event::Empty(e) => {
                if depth == 0 && seen_root {
                    return Err(malformed(reader.buffer_position(), "multiple root elements"));
                }
                seen_root = true;
                if depth + 1 == CHANNEL_DEPTH && e.name().as_ref() == b"channel" {
                    has_channel = true;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(e) => {
                // Entities must resolve even though the text is discarded.
                e.unescape()
                    .map_err(|err| malformed(reader.buffer_position(), err))?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(malformed(reader.buffer_position(), "unexpected end of document"));
    }
    if !seen_root {
        return Err(FetchError::Malformed("document has no root element".to_string()));
    }
    if !has_channel {
        return Err(FetchError::MissingChannel);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Guid,
    Title,
    Link,
    Description,
    PubDate,
}

impl Field {
    fn from_element(e: &BytesStart<'_>) -> Option<Self> {
        match e.name().as_ref() {
            b"guid" => Some(Field::Guid),
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            b"pubDate" => Some(Field::PubDate),
            _ => None,
        }
    }
}

#[derive(Default)]
struct ItemBuilder {
    guid: Option<String>,
    title: String,
    link: String,
    description: String,
    pub_date: String,
}

impl ItemBuilder {
    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Guid => self.guid.get_or_insert_with(String::new),
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::PubDate => &mut self.pub_date,
        }
    }

    fn build(self) -> RawFeedItem {
        RawFeedItem {
            guid: self.guid.map(|g| g.trim().to_string()),
            title: self.title.trim().to_string(),
            link: self.link.trim().to_string(),
            description: self.description.trim().to_string(),
            pub_date: self.pub_date.trim().to_string(),
        }
    }
}

/// Single-pass iterator over `channel/item` elements.
struct FeedItemIter {
    reader: Reader<Cursor<Vec<u8>>>,
    buf: Vec<u8>,
    depth: usize,
    in_channel: bool,
    item: Option<ItemBuilder>,
    field: Option<Field>,
    done: bool,
}

impl FeedItemIter {
    fn new(bytes: Vec<u8>) -> Self {
        let mut reader = Reader::from_reader(Cursor::new(bytes));
        reader.config_mut().trim_text(true);

        Self {
            reader,
            buf: Vec::new(),
            depth: 0,
            in_channel: false,
            item: None,
            field: None,
            done: false,
        }
    }

    fn append(&mut self, text: &str) {
        if self.depth != FIELD_DEPTH {
            return;
        }
        if let (Some(item), Some(field)) = (self.item.as_mut(), self.field) {
            item.slot(field).push_str(text);
        }
    }

    fn next_item(&mut self) -> Result<Option<RawFeedItem>, FetchError> {
        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| malformed(self.reader.buffer_position(), e))?;

            match event {
                Event::Start(e) => {
                    self.depth += 1;
                    match self.depth {
                        CHANNEL_DEPTH => self.in_channel = e.name().as_ref() == b"channel",
                        ITEM_DEPTH if self.in_channel && e.name().as_ref() == b"item" => {
                            self.item = Some(ItemBuilder::default());
                        }
                        FIELD_DEPTH if self.item.is_some() => {
                            self.field = Field::from_element(&e);
                        }
                        _ => {}
                    }
                }
                Event::Empty(e) => match self.depth + 1 {
                    ITEM_DEPTH if self.in_channel && e.name().as_ref() == b"item" => {
                        return Ok(Some(ItemBuilder::default().build()));
                    }
                    FIELD_DEPTH => {
                        let field = Field::from_element(&e);
                        if let (Some(item), Some(field)) = (self.item.as_mut(), field) {
                            item.slot(field);
                        }
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|err| malformed(self.reader.buffer_position(), err))?
                        .into_owned();
                    self.append(&text);
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    self.append(&text);
                }
                Event::End(_) => {
                    let closing = self.depth;
                    self.depth = self.depth.saturating_sub(1);
                    match closing {
                        FIELD_DEPTH => self.field = None,
                        ITEM_DEPTH => {
                            if let Some(item) = self.item.take() {
                                return Ok(Some(item.build()));
                            }
                        }
                        CHANNEL_DEPTH => self.in_channel = false,
                        _ => {}
                    }
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl Iterator for FeedItemIter {
    type Item = Result<RawFeedItem, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_item() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(xml: &str) -> Vec<RawFeedItem> {
        parse_feed(xml.as_bytes().to_vec())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Example feed</title>
    <link>https://example.com</link>
    <item>
      <guid isPermaLink="false">a1</guid>
      <title>Morning Brew</title>
      <link>https://example.com/brew</link>
      <description><![CDATA[<p>Fresh <b>coffee</b></p>]]></description>
      <pubDate>Wed, 19 Mar 2025 04:49:52 GMT</pubDate>
      <dc:creator>Someone</dc:creator>
    </item>
    <item>
      <guid>  a2  </guid>
      <title>Fish &amp; Chips</title>
      <link>https://example.com/chips</link>
      <pubDate>Thu, 20 Mar 2025 10:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parses_items_in_document_order() {
        let items = items(FEED);

        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            RawFeedItem {
                guid: Some("a1".into()),
                title: "Morning Brew".into(),
                link: "https://example.com/brew".into(),
                description: "<p>Fresh <b>coffee</b></p>".into(),
                pub_date: "Wed, 19 Mar 2025 04:49:52 GMT".into(),
            }
        );
        assert_eq!(items[1].guid.as_deref(), Some("a2"));
        assert_eq!(items[1].title, "Fish & Chips");
        assert_eq!(items[1].description, "");
    }

    #[test]
    fn test_channel_fields_do_not_leak_into_items() {
        let xml = r#"<rss><channel><title>Channel</title>
            <item><link>https://x/1</link></item></channel></rss>"#;

        let items = items(xml);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "");
        assert_eq!(items[0].guid, None);
    }

    #[test]
    fn test_empty_elements() {
        let xml = r#"<rss><channel><item/><item><guid/><title>t</title></item></channel></rss>"#;

        let items = items(xml);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], RawFeedItem::default());
        assert_eq!(items[1].guid.as_deref(), Some(""));
        assert_eq!(items[1].title, "t");
    }

    #[test]
    fn test_nested_markup_in_fields_is_ignored() {
        let xml = r#"<rss><channel><item>
            <guid>g</guid><description>before<span>inner</span></description>
            </item></channel></rss>"#;

        let items = items(xml);
        assert_eq!(items[0].description, "before");
    }

    #[test]
    fn test_items_outside_channel_are_ignored() {
        let xml = r#"<rss><item><guid>stray</guid></item><channel></channel></rss>"#;
        assert!(items(xml).is_empty());
    }

    #[test]
    fn test_channel_without_items() {
        let xml = r#"<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        assert!(items(xml).is_empty());
    }

    #[test]
    fn test_missing_channel() {
        let err = parse_feed(b"<rss version=\"2.0\"><item/></rss>".to_vec()).err();
        assert!(matches!(err, Some(FetchError::MissingChannel)));

        let err = parse_feed(b"<feed><entry/></feed>".to_vec()).err();
        assert!(matches!(err, Some(FetchError::MissingChannel)));
    }

    #[test]
    fn test_malformed_documents() {
        for xml in [
            "",
            "not xml at all",
            "<rss><channel></rss>",
            "<rss><channel><item></channel></rss>",
            "<rss><channel/>",
            "<rss><channel/></rss><rss/>",
        ] {
            let err = parse_feed(xml.as_bytes().to_vec()).err();
            assert!(
                matches!(err, Some(FetchError::Malformed(_))),
                "{xml:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_iterator_is_lazy() {
        let mut iter = parse_feed(FEED.as_bytes().to_vec()).unwrap();

        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.guid.as_deref(), Some("a1"));
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }
}
