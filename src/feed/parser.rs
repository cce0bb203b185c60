// src/feed/parser.rs
//! Namespace-aware parser for the nodvarsel.no RSS/Atom hybrid.
//!
//! Only the shape `<root><channel><item>…</item></channel></root>` matters.
//! Element lookup mirrors a "first direct child with this name" search:
//! the first `<channel>` under the root, every `<item>` directly under it, and
//! the first `<guid>`, `<link>`, `<title>`, `<description>` and `<updated>`
//! directly under each item.

use std::collections::HashMap;

use metrics::histogram;
use quick_xml::escape::{resolve_xml_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::feed::error::FeedError;
use crate::feed::types::AlertRecord;

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Parse a feed body into alert records, in document order.
///
/// A root without `<channel>` is [`FeedError::MissingChannel`]; a channel
/// without items is simply an empty list. Anything that is not well-formed
/// XML is [`FeedError::MalformedFeed`].
pub fn parse_feed(xml: &str) -> Result<Vec<AlertRecord>, FeedError> {
    let t0 = std::time::Instant::now();
    check_chars(xml)?;

    let mut reader = NsReader::from_str(xml);
    reader.config_mut().check_comments = true;
    let mut walker = Walker::default();
    let mut entities = Entities::default();

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(malformed)?;
        match event {
            Event::Start(e) => {
                check_start(&e, &entities)?;
                let node = walker.classify(&ns, e.local_name().as_ref())?;
                walker.open(node);
            }
            Event::Empty(e) => {
                check_start(&e, &entities)?;
                let node = walker.classify(&ns, e.local_name().as_ref())?;
                walker.open(node);
                walker.close()?;
            }
            Event::End(_) => walker.close()?,
            Event::Text(t) => {
                let text = t.unescape_with(|name| entities.resolve(name)).map_err(malformed)?;
                check_chars(&text)?;
                walker.text(&text)?;
            }
            Event::CData(c) => walker.text(&String::from_utf8_lossy(&c))?,
            Event::DocType(d) => {
                if walker.root_seen {
                    return Err(malformed("DOCTYPE after the root element"));
                }
                entities.declare(&String::from_utf8_lossy(&d))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let records = walker.finish()?;
    histogram!("nodvarsel_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(records)
}

fn malformed(err: impl std::fmt::Display) -> FeedError {
    FeedError::MalformedFeed(err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Guid,
    Link,
    Title,
    Description,
    AtomUpdated,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Root,
    Channel,
    Item,
    Field(Field),
    Other,
}

/// First-occurrence values of one `<item>`. `None` = element not seen yet.
#[derive(Debug, Default)]
struct ItemFields {
    guid: Option<String>,
    link: Option<String>,
    title: Option<String>,
    description: Option<String>,
    atom_updated: Option<String>,
    updated: Option<String>,
}

impl ItemFields {
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Guid => &mut self.guid,
            Field::Link => &mut self.link,
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::AtomUpdated => &mut self.atom_updated,
            Field::Updated => &mut self.updated,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn into_record(self) -> AlertRecord {
        let updated = self
            .atom_updated
            .filter(|s| !s.is_empty())
            .or(self.updated)
            .unwrap_or_default();
        AlertRecord {
            guid: self.guid.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            updated,
        }
    }
}

#[derive(Debug, Default)]
struct Walker {
    stack: Vec<Node>,
    root_seen: bool,
    channel_seen: bool,
    item: Option<ItemFields>,
    // text of the field element currently open; frozen once it gets a child
    capture: String,
    capture_frozen: bool,
    records: Vec<AlertRecord>,
}

impl Walker {
    fn classify(&mut self, ns: &ResolveResult, local: &[u8]) -> Result<Node, FeedError> {
        if let ResolveResult::Unknown(prefix) = ns {
            return Err(malformed(format!(
                "unbound prefix '{}'",
                String::from_utf8_lossy(prefix)
            )));
        }
        let unbound = matches!(ns, ResolveResult::Unbound);
        let node = match self.stack.last() {
            None if self.root_seen => {
                return Err(malformed("junk after document element"));
            }
            None => Node::Root,
            Some(Node::Root) if unbound && local == b"channel" && !self.channel_seen => {
                Node::Channel
            }
            Some(Node::Channel) if unbound && local == b"item" => Node::Item,
            Some(Node::Item) => field_for(ns, local).map_or(Node::Other, Node::Field),
            Some(Node::Field(_)) => {
                self.capture_frozen = true;
                Node::Other
            }
            Some(_) => Node::Other,
        };
        Ok(node)
    }

    fn open(&mut self, node: Node) {
        match node {
            Node::Root => self.root_seen = true,
            Node::Channel => self.channel_seen = true,
            Node::Item => self.item = Some(ItemFields::default()),
            Node::Field(_) => {
                self.capture.clear();
                self.capture_frozen = false;
            }
            Node::Other => {}
        }
        self.stack.push(node);
    }

    fn close(&mut self) -> Result<(), FeedError> {
        let node = self
            .stack
            .pop()
            .ok_or_else(|| malformed("closing tag without matching opening tag"))?;
        match node {
            Node::Item => {
                if let Some(fields) = self.item.take() {
                    self.records.push(fields.into_record());
                }
            }
            Node::Field(field) => {
                let value = self.capture.trim().to_string();
                if let Some(fields) = self.item.as_mut() {
                    fields.set(field, value);
                }
            }
            Node::Root | Node::Channel | Node::Other => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), FeedError> {
        match self.stack.last() {
            None if !text.trim().is_empty() => Err(malformed("text outside the root element")),
            Some(Node::Field(_)) if !self.capture_frozen => {
                self.capture.push_str(text);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn finish(self) -> Result<Vec<AlertRecord>, FeedError> {
        if !self.stack.is_empty() {
            return Err(malformed("unexpected end of document: unclosed element"));
        }
        if !self.root_seen {
            return Err(malformed("no root element"));
        }
        if !self.channel_seen {
            return Err(FeedError::MissingChannel);
        }
        Ok(self.records)
    }
}

/// Element and attribute names must be XML names; attribute values must be
/// quoted, unique per element and contain only known entities.
fn check_start(e: &BytesStart<'_>, entities: &Entities) -> Result<(), FeedError> {
    check_name(e.name().as_ref())?;
    for attr in e.attributes() {
        let attr = attr.map_err(malformed)?;
        check_name(attr.key.as_ref())?;
        let value = attr
            .unescape_value_with(|name| entities.resolve(name))
            .map_err(malformed)?;
        check_chars(&value)?;
    }
    Ok(())
}

fn check_name(name: &[u8]) -> Result<(), FeedError> {
    let name = std::str::from_utf8(name).map_err(malformed)?;
    let mut chars = name.chars();
    if chars.next().is_some_and(is_name_start) && chars.all(is_name_char) {
        Ok(())
    } else {
        Err(malformed(format!("invalid name '{name}'")))
    }
}

fn check_chars(text: &str) -> Result<(), FeedError> {
    match text.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(malformed(format!("invalid character U+{:04X}", c as u32))),
        None => Ok(()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

fn is_name_start(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start(c)
        || matches!(c, '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// General entities declared in the internal DTD subset, on top of the five
/// predefined ones. External and parameter entities are skipped.
#[derive(Debug, Default)]
struct Entities(HashMap<String, String>);

impl Entities {
    fn resolve(&self, name: &str) -> Option<&str> {
        resolve_xml_entity(name).or_else(|| self.0.get(name).map(String::as_str))
    }

    fn declare(&mut self, doctype: &str) -> Result<(), FeedError> {
        const DECL: &str = "<!ENTITY";
        let mut rest = doctype;
        while let Some(at) = rest.find(DECL) {
            rest = rest[at + DECL.len()..].trim_start();
            if rest.starts_with('%') {
                continue;
            }
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let (name, tail) = rest.split_at(end);
            check_name(name.as_bytes())?;
            rest = tail.trim_start();

            let Some(quote) = rest.chars().next().filter(|c| matches!(*c, '"' | '\'')) else {
                continue;
            };
            let body = &rest[1..];
            let close = body
                .find(quote)
                .ok_or_else(|| malformed(format!("unterminated value for entity '{name}'")))?;
            let value = unescape_with(&body[..close], |n| self.resolve(n))
                .map_err(malformed)?
                .into_owned();
            // first declaration is binding
            self.0.entry(name.to_string()).or_insert(value);
            rest = &body[close + 1..];
        }
        Ok(())
    }
}

fn field_for(ns: &ResolveResult, local: &[u8]) -> Option<Field> {
    match ns {
        ResolveResult::Unbound => match local {
            b"guid" => Some(Field::Guid),
            b"link" => Some(Field::Link),
            b"title" => Some(Field::Title),
            b"description" => Some(Field::Description),
            b"updated" => Some(Field::Updated),
            _ => None,
        },
        ResolveResult::Bound(Namespace(uri)) if *uri == ATOM_NS.as_bytes() && local == b"updated" => {
            Some(Field::AtomUpdated)
        }
        _ => None,
    }
}
