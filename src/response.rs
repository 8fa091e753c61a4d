//! Response normalisation: turns an ABR response body into result records.

use crate::error::{AbnLookupError, Result};
use crate::request::SearchKind;
use crate::types::{Record, ResponseFormat};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

const ROOT_ELEMENT: &str = "ABRPayloadSearchResults";

/// Exception block returned by the ABR in place of results
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamException {
    exception_code: Option<String>,
    exception_description: Option<String>,
}

/// Records produced by one search
///
/// The iterator owns its records; consuming it does not send another request.
#[derive(Debug)]
pub struct SearchResults {
    kind: SearchKind,
    records: std::vec::IntoIter<Record>,
}

impl SearchResults {
    pub fn new(kind: SearchKind, records: Vec<Record>) -> Self {
        Self {
            kind,
            records: records.into_iter(),
        }
    }

    /// The operation that produced these results
    pub fn kind(&self) -> SearchKind {
        self.kind
    }
}

impl Iterator for SearchResults {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.records.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for SearchResults {}

/// Parse `body` and extract the records for `kind`
pub fn normalize(kind: SearchKind, format: ResponseFormat, body: &str) -> Result<SearchResults> {
    let document = parse_body(format, body)?;
    let records = extract_records(kind, &document)?;
    debug!("Extracted {} record(s) for {}", records.len(), kind);
    Ok(SearchResults::new(kind, records))
}

/// Parse a response body into a nested value
pub fn parse_body(format: ResponseFormat, body: &str) -> Result<Value> {
    match format {
        ResponseFormat::Xml => xml_to_value(body),
        ResponseFormat::Json => json_to_value(body),
    }
}

/// Convert an XML document into a nested value
///
/// Elements become keys and repeated siblings become arrays in document
/// order. Attributes are stored as `@name` and text next to child elements
/// as `#text`. Text-only elements become strings and empty elements null.
/// Namespace prefixes and declarations are dropped.
pub fn xml_to_value(body: &str) -> Result<Value> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to parse XML response: {}", e);
                return Err(AbnLookupError::malformed(format!(
                    "invalid XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        };

        match event {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                attach(&mut stack, &mut root, element.finish())?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| AbnLookupError::malformed(format!("invalid text: {}", e)))?;
                match stack.last_mut() {
                    Some(element) => element.text.push_str(&text),
                    None => return Err(AbnLookupError::malformed("text outside the root element")),
                }
            }
            Event::CData(data) => {
                let data = String::from_utf8_lossy(&data.into_inner()).into_owned();
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&data);
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| AbnLookupError::malformed("unexpected closing tag"))?;
                attach(&mut stack, &mut root, element.finish())?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(AbnLookupError::malformed(format!(
            "document ended inside <{}>",
            open.name
        )));
    }

    let (name, value) = root.ok_or_else(|| AbnLookupError::malformed("empty response body"))?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}

fn json_to_value(body: &str) -> Result<Value> {
    let body = strip_jsonp(body.trim());
    serde_json::from_str(body).map_err(|e| {
        warn!("Failed to parse JSON response: {}", e);
        AbnLookupError::malformed(format!("invalid JSON: {}", e))
    })
}

/// Remove a `callback( ... )` wrapper if present
fn strip_jsonp(body: &str) -> &str {
    if body.starts_with('{') || body.starts_with('[') {
        return body;
    }
    match (body.find('('), body.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            let callback = &body[..open];
            if callback
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.')
            {
                return body[open + 1..close].trim();
            }
            body
        }
        _ => body,
    }
}

struct Element {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut children = Map::new();

        for attr in start.attributes() {
            let attr = attr
                .map_err(|e| AbnLookupError::malformed(format!("invalid attribute: {}", e)))?;
            let key = attr.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }
            let value = attr
                .unescape_value()
                .map_err(|e| AbnLookupError::malformed(format!("invalid attribute: {}", e)))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            children.insert(format!("@{}", key), Value::String(value.into_owned()));
        }

        Ok(Self {
            name,
            children,
            text: String::new(),
        })
    }

    fn finish(self) -> (String, Value) {
        let value = if self.children.is_empty() {
            if self.text.is_empty() {
                Value::Null
            } else {
                Value::String(self.text)
            }
        } else {
            let mut children = self.children;
            if !self.text.is_empty() {
                children.insert("#text".to_string(), Value::String(self.text));
            }
            Value::Object(children)
        };
        (self.name, value)
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<(String, Value)>,
    (name, value): (String, Value),
) -> Result<()> {
    let Some(parent) = stack.last_mut() else {
        if root.is_some() {
            return Err(AbnLookupError::malformed("more than one root element"));
        }
        *root = Some((name, value));
        return Ok(());
    };

    match parent.children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.children.insert(name, value);
        }
    }
    Ok(())
}

/// Pull the records for `kind` out of a parsed response document
pub fn extract_records(kind: SearchKind, document: &Value) -> Result<Vec<Record>> {
    let response = document
        .get(ROOT_ELEMENT)
        .ok_or_else(|| AbnLookupError::malformed(format!("missing <{}> root", ROOT_ELEMENT)))?
        .get("response")
        .ok_or_else(|| AbnLookupError::malformed("missing <response> element"))?;

    if let Some(exception) = response.get("exception") {
        return Err(upstream_error(exception));
    }

    if kind.is_single_result() {
        let entity = response
            .as_object()
            .and_then(|fields| {
                fields
                    .iter()
                    .find(|(key, _)| key.starts_with("businessEntity"))
                    .map(|(_, value)| value)
            })
            .ok_or_else(|| AbnLookupError::malformed("missing <businessEntity> element"))?;

        // Repeated siblings collapse into an array; the first one wins
        let entity = match entity {
            Value::Array(items) => items.first().unwrap_or(&Value::Null),
            other => other,
        };
        if !entity.is_object() {
            return Err(AbnLookupError::malformed("empty <businessEntity> element"));
        }
        return Ok(vec![Record::new(entity.clone())]);
    }

    let records = if let Some(list) = response.get("searchResultsList") {
        list.get("searchResultsRecord")
    } else if let Some(list) = response.get("abnList") {
        list.get("abn")
    } else {
        return Err(AbnLookupError::malformed(
            "missing <searchResultsList> or <abnList> element",
        ));
    };

    Ok(match records {
        Some(Value::Array(items)) => items.iter().cloned().map(Record::new).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![Record::new(single.clone())],
    })
}

fn upstream_error(exception: &Value) -> AbnLookupError {
    let exception: UpstreamException = serde_json::from_value(exception.clone())
        .unwrap_or(UpstreamException {
            exception_code: None,
            exception_description: None,
        });
    let code = exception
        .exception_code
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let description = exception
        .exception_description
        .unwrap_or_else(|| "no description given".to_string());
    warn!("ABR returned exception {}: {}", code, description);
    AbnLookupError::upstream(code, description)
}
