use std::borrow::Cow;

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use crate::{config::XmlNamespace, errors::XmlError, feed_types::FeedItem, xml::FeedHeader};

/// Serialises `items` into an RSS 2.0 document, in the order given.
///
/// Fields covered by `namespace` are written with its prefix, and the namespace is declared on the `<rss>` element.
/// Empty values are written as empty elements, so that every item carries every field.
pub fn write_feed(header: &FeedHeader, namespace: Option<&XmlNamespace>, items: &[FeedItem]) -> Result<Vec<u8>, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    let xmlns = namespace.map(|ns| format!("xmlns:{}", ns.prefix));
    if let (Some(attr), Some(ns)) = (&xmlns, namespace) {
        rss.push_attribute((attr.as_str(), ns.uri.as_str()));
    }
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;
    write_text_element(&mut writer, "title", &header.title)?;
    write_text_element(&mut writer, "link", &header.link)?;
    write_text_element(&mut writer, "description", &header.description)?;
    for item in items {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        for field in item.fields() {
            let name = match namespace {
                Some(ns) if ns.applies_to(&field.name) => format!("{}:{}", ns.prefix, field.name),
                _ => field.name.clone(),
            };
            write_text_element(&mut writer, &name, &field.value)?;
        }
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;
    let mut xml = writer.into_inner();
    xml.push(b'\n');
    Ok(xml)
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<(), XmlError> {
    let element = writer.create_element(name);
    let value = strip_illegal_chars(value);
    if value.is_empty() {
        element.write_empty()?;
    } else {
        element.write_text_content(BytesText::new(&value))?;
    }
    Ok(())
}

/// True for characters allowed by the XML 1.0 `Char` production. Surrogates can't occur in a `char`.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\u{9}' | '\u{A}' | '\u{D}' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Drops control characters that can't appear in an XML 1.0 document at all, not even escaped. Product copy pasted
/// into Shopify regularly carries a stray vertical tab or similar.
fn strip_illegal_chars(value: &str) -> Cow<'_, str> {
    if value.chars().all(is_xml_char) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.chars().filter(|c| is_xml_char(*c)).collect())
    }
}
