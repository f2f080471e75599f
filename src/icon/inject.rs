//! Class injection on the root `<svg>` element.

use std::borrow::Cow;

use quick_xml::{
    Reader, Writer,
    escape::escape,
    events::{BytesStart, Event, attributes::Attribute},
};

/// Class every inlined icon carries.
pub const BASE_CLASS: &str = "icon";

/// `icon` or `icon <classes>`.
pub fn icon_class(classes: Option<&str>) -> String {
    match classes.map(str::trim).filter(|c| !c.is_empty()) {
        Some(extra) => format!("{BASE_CLASS} {extra}"),
        None => BASE_CLASS.to_string(),
    }
}

/// Add `class` to the root `<svg>` of `markup`.
///
/// An existing class attribute is extended instead of duplicated. Markup the
/// XML reader cannot handle falls back to a plain `<svg` substitution.
pub fn with_class(markup: &str, class: &str) -> String {
    inject_root(markup, class)
        .unwrap_or_else(|| markup.replacen("<svg", &format!("<svg class=\"{}\"", escape(class)), 1))
}

fn inject_root(markup: &str, class: &str) -> Option<String> {
    let mut reader = Reader::from_str(markup);

    loop {
        let start = usize::try_from(reader.buffer_position()).ok()?;
        let (tag, empty) = match reader.read_event().ok()? {
            Event::Start(tag) => (tag, false),
            Event::Empty(tag) => (tag, true),
            Event::Eof => return None,
            _ => continue,
        };
        if tag.name().as_ref() != b"svg" {
            return None;
        }
        let end = usize::try_from(reader.buffer_position()).ok()?;

        let rebuilt = rebuild_tag(&tag, class)?;
        let mut writer = Writer::new(Vec::new());
        let event = if empty {
            Event::Empty(rebuilt)
        } else {
            Event::Start(rebuilt)
        };
        writer.write_event(event).ok()?;
        let tag_text = String::from_utf8(writer.into_inner()).ok()?;

        let mut out = String::with_capacity(markup.len() + class.len() + 10);
        out.push_str(markup.get(..start)?);
        out.push_str(&tag_text);
        out.push_str(markup.get(end..)?);
        return Some(out);
    }
}

fn rebuild_tag(tag: &BytesStart<'_>, class: &str) -> Option<BytesStart<'static>> {
    let attrs = tag.attributes().collect::<Result<Vec<_>, _>>().ok()?;
    let class = escape(class);

    let mut rebuilt = BytesStart::new("svg");
    if !attrs.iter().any(|a| a.key.as_ref() == b"class") {
        rebuilt.push_attribute((b"class".as_slice(), class.as_bytes()));
    }

    for attr in &attrs {
        if attr.key.as_ref() == b"class" {
            let existing = std::str::from_utf8(&attr.value).ok()?.trim();
            let merged: Cow<'_, str> = if existing.is_empty() {
                Cow::Borrowed(class.as_ref())
            } else {
                Cow::Owned(format!("{class} {existing}"))
            };
            rebuilt.push_attribute((b"class".as_slice(), merged.as_bytes()));
        } else {
            rebuilt.push_attribute(Attribute {
                key: attr.key,
                value: attr.value.clone(),
            });
        }
    }
    Some(rebuilt)
}
