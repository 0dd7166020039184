use quick_xml::{events::Event, name::LocalName, Reader};

use crate::{
    errors::XmlError,
    feed_types::{FeedField, FeedItem},
    xml::FeedHeader,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub header: FeedHeader,
    pub items: Vec<FeedItem>,
}

/// Parses an RSS feed back into its header and items. Field names lose their namespace prefix (`g:price` reads as
/// `price`); values are unescaped and otherwise returned exactly as written.
pub fn read_feed(xml: &str) -> Result<ParsedFeed, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut feed = ParsedFeed::default();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut fields: Vec<FeedField> = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(local_name(e.local_name())?);
                text.clear();
                if in_item(&stack) {
                    fields.clear();
                }
            },
            Event::Empty(e) => {
                stack.push(local_name(e.local_name())?);
                text.clear();
                close_element(&stack, &mut feed, &mut fields, &mut text);
                stack.pop();
            },
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => {
                text.push_str(std::str::from_utf8(&c.into_inner()).map_err(|e| XmlError(e.to_string()))?)
            },
            Event::End(_) => {
                close_element(&stack, &mut feed, &mut fields, &mut text);
                stack.pop();
            },
            Event::Eof => break,
            _ => {},
        }
    }
    if !stack.is_empty() {
        return Err(XmlError(format!("Unexpected end of document inside <{}>", stack.join("/"))));
    }
    Ok(feed)
}

/// Shorthand for [`read_feed`] when only the items matter.
pub fn read_feed_items(xml: &str) -> Result<Vec<FeedItem>, XmlError> {
    read_feed(xml).map(|f| f.items)
}

fn local_name(name: LocalName<'_>) -> Result<String, XmlError> {
    std::str::from_utf8(name.as_ref()).map(|s| s.to_string()).map_err(|e| XmlError(e.to_string()))
}

/// `rss/channel/item`
fn in_item(stack: &[String]) -> bool {
    matches!(stack, [_, channel, item] if channel == "channel" && item == "item")
}

fn close_element(stack: &[String], feed: &mut ParsedFeed, fields: &mut Vec<FeedField>, text: &mut String) {
    match stack {
        [_, channel, item, field] if channel == "channel" && item == "item" => {
            fields.push(FeedField { name: field.clone(), value: std::mem::take(text) });
        },
        [_, channel, item] if channel == "channel" && item == "item" => {
            feed.items.push(FeedItem::new(std::mem::take(fields)));
        },
        [_, channel, name] if channel == "channel" => {
            let value = std::mem::take(text);
            match name.as_str() {
                "title" => feed.header.title = value,
                "link" => feed.header.link = value,
                "description" => feed.header.description = value,
                _ => {},
            }
        },
        _ => {},
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_prefixed_and_empty_fields() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:g="http://base.google.com/ns/1.0">
  <channel>
    <title>FR Product Feed - GOOGLE</title>
    <link>https://bisgaard-fr.myshopify.com</link>
    <description>Product feed for google</description>
    <item>
      <g:id>1</g:id>
      <g:size/>
      <note><![CDATA[a < b]]></note>
    </item>
    <item></item>
  </channel>
</rss>"#;
        let feed = read_feed(xml).unwrap();
        assert_eq!(feed.header.title, "FR Product Feed - GOOGLE");
        assert_eq!(feed.items.len(), 2);
        let item = &feed.items[0];
        assert_eq!(item.field_names().collect::<Vec<&str>>(), ["id", "size", "note"]);
        assert_eq!(item.get("size"), Some(""));
        assert_eq!(item.get("note"), Some("a < b"));
        assert!(feed.items[1].is_empty());
    }

    #[test]
    fn broken_documents_are_errors() {
        assert!(read_feed("<rss><channel><item><id>1</item></channel></rss>").is_err());
        assert!(read_feed("<rss><channel>").is_err());
    }
}
