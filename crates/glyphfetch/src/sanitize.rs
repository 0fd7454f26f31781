//! SVG sanitization.
//!
//! Untrusted SVG markup is cleaned before it is ever handed to a render
//! surface. Sanitization runs in two passes:
//!
//! 1. A string-level pass strips `<script>` and `<foreignObject>` blocks and
//!    `on*` event-handler attributes. This pass always runs and is the
//!    guaranteed baseline in any environment.
//! 2. A structural pass parses the document and rebuilds it keeping only
//!    allow-listed elements and attributes. If parsing fails the result of
//!    the string-level pass is returned instead, so malformed input degrades
//!    gracefully rather than failing the whole load.

use std::sync::LazyLock;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;

/// Elements allowed to survive structural sanitization.
const ALLOWED_ELEMENTS: [&str; 9] = [
    "svg", "g", "path", "circle", "rect", "polygon", "polyline", "line", "ellipse",
];

/// Attributes allowed on surviving elements.
const ALLOWED_ATTRIBUTES: [&str; 19] = [
    "d",
    "fill",
    "stroke",
    "stroke-width",
    "viewBox",
    "cx",
    "cy",
    "r",
    "x",
    "y",
    "width",
    "height",
    "points",
    "transform",
    "class",
    "style",
    "opacity",
    "rx",
    "ry",
];

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static FOREIGN_OBJECT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<foreignObject[^>]*>.*?</foreignObject>").expect("valid regex"));
static EVENT_HANDLER_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\son\w+\s*=\s*"[^"]*""#).expect("valid regex"));

/// Sanitize untrusted SVG markup.
///
/// Pure and infallible: on unparseable input the string-level pass is the
/// result. The output never contains `<script`, `<foreignObject`, or `on*`
/// handler attributes, and contains only allow-listed elements and
/// attributes whenever the structural pass succeeds.
pub fn sanitize(raw_svg: &str) -> String {
    let stripped = string_pass(raw_svg);

    match structural_pass(&stripped) {
        Ok(clean) => clean,
        Err(err) => {
            tracing::debug!(
                target: "glyphfetch::sanitize",
                "structural pass failed, keeping string-level result: {err}"
            );
            stripped
        }
    }
}

/// Regex-based removal of active content.
fn string_pass(input: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(input, "");
    let without_foreign = FOREIGN_OBJECT_BLOCK.replace_all(&without_scripts, "");
    EVENT_HANDLER_ATTR
        .replace_all(&without_foreign, "")
        .into_owned()
}

/// Parse, filter against the allow-lists, and re-serialize.
fn structural_pass(input: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(input);
    let mut writer = Writer::new(Vec::new());

    // Depth inside a dropped element; everything below it is dropped too.
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if skip_depth > 0 || !element_allowed(&start) {
                    skip_depth += 1;
                } else {
                    writer.write_event(Event::Start(filter_attributes(&start)?))?;
                }
            }
            Event::Empty(start) => {
                if skip_depth == 0 && element_allowed(&start) {
                    writer.write_event(Event::Empty(filter_attributes(&start)?))?;
                }
            }
            Event::End(end) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                } else {
                    let name = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                    writer.write_event(Event::End(BytesEnd::new(name)))?;
                }
            }
            Event::Text(text) => {
                if skip_depth == 0 {
                    writer.write_event(Event::Text(text))?;
                }
            }
            Event::Eof => break,
            // Declarations, comments, CDATA, processing instructions, and
            // doctypes have no place in an inline icon.
            _ => {}
        }
    }

    // The writer only ever received UTF-8 input.
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn element_allowed(start: &BytesStart<'_>) -> bool {
    match std::str::from_utf8(start.local_name().as_ref()) {
        Ok(name) => ALLOWED_ELEMENTS.contains(&name),
        Err(_) => false,
    }
}

/// Rebuild a start tag keeping only allow-listed attributes.
fn filter_attributes<'a>(start: &BytesStart<'a>) -> Result<BytesStart<'a>, quick_xml::Error> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut filtered = BytesStart::new(name);

    for attribute in start.attributes() {
        let attribute = attribute?;
        let Ok(key) = std::str::from_utf8(attribute.key.as_ref()) else {
            continue;
        };
        if ALLOWED_ATTRIBUTES.contains(&key) {
            let value = attribute.unescape_value()?;
            filtered.push_attribute((key, value.as_ref()));
        }
    }

    Ok(filtered)
}
