//! Record parsing: reading namespaced XML into records.
//!
//! The parser walks the schema of the expected type in declared order and asks,
//! for each field, whether the element under the cursor belongs to it. The
//! answer is a [`FieldMatch`]: the field matched and was consumed, the field is
//! absent and the cursor is already on an element owned by a later field, or
//! the cursor is on something no remaining field owns, which is a structural
//! error. An absent field therefore never consumes the next field's element,
//! and an out-of-schema element is never mistaken for an absent field.

use std::collections::VecDeque;
use std::sync::Arc;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, trace};

use crate::attachment::{AttachmentSource, content_id_from_href};
use crate::config::CodecConfig;
use crate::error::XmlBindError;
use crate::namespace::NamespaceStack;
use crate::record::Record;
use crate::registry::TypeRegistry;
use crate::schema::{FieldDescriptor, FieldType, QName, RecordSchema, XOP_NAMESPACE, XSI_NAMESPACE};
use crate::value::Value;

const XOP_INCLUDE: QName = QName::from_static(XOP_NAMESPACE, "Include");

// ---------------------------------------------------------------------------
// Namespace-resolved event stream
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StartElement {
    name: QName,
    attributes: Vec<(QName, String)>,
    xsi_type: Option<QName>,
    nil: bool,
}

impl StartElement {
    /// Value of an unqualified attribute.
    fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.matches("", local_name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
enum XmlEvent {
    Start(StartElement),
    End(QName),
    Text(String),
    Eof,
}

/// quick-xml reader with namespace resolution and one-event lookahead.
///
/// Adjacent text, CDATA and entity references are merged into one `Text`
/// event. Comments, processing instructions and the declaration are dropped.
struct EventReader<'x> {
    reader: Reader<&'x [u8]>,
    namespaces: NamespaceStack,
    pending: VecDeque<XmlEvent>,
}

impl<'x> EventReader<'x> {
    fn new(xml: &'x [u8]) -> Self {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            namespaces: NamespaceStack::default(),
            pending: VecDeque::new(),
        }
    }

    fn next_event(&mut self) -> Result<XmlEvent, XmlBindError> {
        if self.pending.is_empty() {
            self.fill()?;
        }
        self.pending.pop_front().ok_or_else(unexpected_eof)
    }

    fn peek(&mut self) -> Result<&XmlEvent, XmlBindError> {
        if self.pending.is_empty() {
            self.fill()?;
        }
        self.pending.front().ok_or_else(unexpected_eof)
    }

    /// Drop whitespace-only text at the cursor.
    fn skip_whitespace(&mut self) -> Result<(), XmlBindError> {
        while matches!(self.peek()?, XmlEvent::Text(t) if t.trim().is_empty()) {
            self.pending.pop_front();
        }
        Ok(())
    }

    fn fill(&mut self) -> Result<(), XmlBindError> {
        let mut text: Option<String> = None;
        loop {
            let event = match self.reader.read_event()? {
                Event::Start(e) => XmlEvent::Start(self.open(&e)?),
                Event::End(e) => {
                    let qname = e.name();
                    let raw = std::str::from_utf8(qname.as_ref())
                        .map_err(|err| XmlBindError::Malformed(err.to_string()))?;
                    let name = self
                        .namespaces
                        .resolve(raw, false)
                        .map_err(XmlBindError::Malformed)?;
                    self.namespaces.pop();
                    XmlEvent::End(name)
                }
                Event::Text(e) => {
                    let decoded = e
                        .decode()
                        .map_err(|err| XmlBindError::Malformed(err.to_string()))?;
                    let unescaped = unescape(&decoded)
                        .map_err(|err| XmlBindError::Malformed(err.to_string()))?;
                    text.get_or_insert_with(String::new).push_str(&unescaped);
                    continue;
                }
                Event::CData(e) => {
                    let raw = String::from_utf8(e.into_inner().into_owned())
                        .map_err(|err| XmlBindError::Malformed(err.to_string()))?;
                    text.get_or_insert_with(String::new).push_str(&raw);
                    continue;
                }
                Event::GeneralRef(e) => {
                    let name = e
                        .decode()
                        .map_err(|err| XmlBindError::Malformed(err.to_string()))?;
                    let resolved = resolve_reference(&name)?;
                    text.get_or_insert_with(String::new).push(resolved);
                    continue;
                }
                Event::Eof => XmlEvent::Eof,
                // Declaration, comments, processing instructions, doctype.
                _ => continue,
            };
            if let Some(text) = text.take() {
                self.pending.push_back(XmlEvent::Text(text));
            }
            self.pending.push_back(event);
            return Ok(());
        }
    }

    /// Open an element scope and resolve its name and attributes.
    fn open(&mut self, e: &BytesStart<'_>) -> Result<StartElement, XmlBindError> {
        let mut declarations = Vec::new();
        let mut raw_attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|err| XmlBindError::Malformed(err.to_string()))?;
            let raw = std::str::from_utf8(&attr.value)
                .map_err(|err| XmlBindError::Malformed(err.to_string()))?;
            let value = unescape(raw)
                .map_err(|err| XmlBindError::Malformed(err.to_string()))?
                .into_owned();
            if key == "xmlns" {
                declarations.push((None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((Some(prefix.to_owned()), value));
            } else {
                raw_attributes.push((key.to_owned(), value));
            }
        }
        self.namespaces.push(declarations);

        let qname = e.name();
        let raw_name = std::str::from_utf8(qname.as_ref())
            .map_err(|err| XmlBindError::Malformed(err.to_string()))?;
        let name = self
            .namespaces
            .resolve(raw_name, false)
            .map_err(XmlBindError::Malformed)?;

        let mut attributes = Vec::with_capacity(raw_attributes.len());
        let mut xsi_type = None;
        let mut nil = false;
        for (key, value) in raw_attributes {
            let attr_name = self
                .namespaces
                .resolve(&key, true)
                .map_err(XmlBindError::Malformed)?;
            if attr_name.namespace() == XSI_NAMESPACE {
                match attr_name.local_name() {
                    "type" => {
                        xsi_type = Some(
                            self.namespaces
                                .resolve(value.trim(), false)
                                .map_err(XmlBindError::Malformed)?,
                        );
                    }
                    "nil" => nil = matches!(value.trim(), "true" | "1"),
                    _ => {}
                }
                continue;
            }
            attributes.push((attr_name, value));
        }

        Ok(StartElement {
            name,
            attributes,
            xsi_type,
            nil,
        })
    }
}

/// Resolve a predefined entity or character reference.
fn resolve_reference(name: &str) -> Result<char, XmlBindError> {
    let resolved = match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => name
            .strip_prefix('#')
            .and_then(|code| match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse().ok(),
            })
            .and_then(char::from_u32),
    };
    resolved.ok_or_else(|| XmlBindError::Malformed(format!("unknown entity reference &{name};")))
}

// ---------------------------------------------------------------------------
// Schema-driven parser
// ---------------------------------------------------------------------------

/// Outcome of trying to consume one field at the cursor.
#[derive(Debug)]
enum FieldMatch {
    /// The element belonged to the field and was consumed.
    Matched(Value),
    /// The field is absent; the cursor was not moved.
    NotMatched,
}

/// Streaming record parser over one XML document.
pub struct Deserializer<'r, 'x> {
    events: EventReader<'x>,
    registry: &'r TypeRegistry,
    attachments: Option<&'r dyn AttachmentSource>,
    max_depth: usize,
    depth: usize,
}

impl std::fmt::Debug for Deserializer<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deserializer")
            .field("types", &self.registry.len())
            .field("attachments", &self.attachments.is_some())
            .field("max_depth", &self.max_depth)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl<'r, 'x> Deserializer<'r, 'x> {
    /// Create a parser over `xml` resolving types through `registry`.
    #[must_use]
    pub fn new(xml: &'x [u8], registry: &'r TypeRegistry, config: &CodecConfig) -> Self {
        Self {
            events: EventReader::new(xml),
            registry,
            attachments: None,
            max_depth: config.max_depth,
            depth: 0,
        }
    }

    /// Resolve `xop:Include` references through `source`.
    #[must_use]
    pub fn with_attachments(mut self, source: &'r dyn AttachmentSource) -> Self {
        self.attachments = Some(source);
        self
    }

    /// Name of the next element in the document, without consuming it.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the document ends first or a stream error occurs.
    pub fn peek_element(&mut self) -> Result<QName, XmlBindError> {
        self.events.skip_whitespace()?;
        match self.events.peek()? {
            XmlEvent::Start(start) => Ok(start.name.clone()),
            XmlEvent::End(name) => Err(XmlBindError::unexpected("a start element", name)),
            XmlEvent::Text(_) => Err(XmlBindError::unexpected("a start element", "text content")),
            XmlEvent::Eof => Err(XmlBindError::Malformed("document has no root element".to_owned())),
        }
    }

    /// Parse the whole document: one `element` of type `type_name` and nothing after it.
    ///
    /// The returned record may be of a subtype of `type_name` when the root
    /// announces one through `xsi:type`.
    ///
    /// # Errors
    ///
    /// Returns any structural, conversion, type resolution or stream error.
    /// No partial record is returned.
    pub fn parse_document(
        &mut self,
        element: &QName,
        type_name: &QName,
    ) -> Result<Record, XmlBindError> {
        let found = self.peek_element()?;
        if found != *element {
            return Err(XmlBindError::unexpected(element, found));
        }
        let XmlEvent::Start(start) = self.events.next_event()? else {
            return Err(XmlBindError::Malformed("lost the root element".to_owned()));
        };
        if start.nil {
            return Err(XmlBindError::Malformed(format!(
                "root element {} cannot be nil",
                start.name
            )));
        }
        let record = self.parse_record(&start, type_name)?;

        self.events.skip_whitespace()?;
        match self.events.next_event()? {
            XmlEvent::Eof => Ok(record),
            XmlEvent::Start(next) => Err(XmlBindError::Malformed(format!(
                "content after the root element: {}",
                next.name
            ))),
            XmlEvent::End(name) => Err(XmlBindError::Malformed(format!("stray end tag {name}"))),
            XmlEvent::Text(_) => Err(XmlBindError::Malformed(
                "text after the root element".to_owned(),
            )),
        }
    }

    /// Parse the children of `start` as a record of `static_type`.
    fn parse_record(
        &mut self,
        start: &StartElement,
        static_type: &QName,
    ) -> Result<Record, XmlBindError> {
        let schema = self.effective_schema(start, static_type)?;
        if self.depth >= self.max_depth {
            return Err(XmlBindError::DepthLimitExceeded(self.max_depth));
        }
        self.depth += 1;
        let result = self.parse_fields(schema);
        self.depth -= 1;
        result
    }

    /// The schema to parse with: the static type, or the `xsi:type` substitute.
    fn effective_schema(
        &self,
        start: &StartElement,
        static_type: &QName,
    ) -> Result<Arc<RecordSchema>, XmlBindError> {
        let declared = self.registry.resolve(static_type)?;
        let announced = match &start.xsi_type {
            Some(announced) if announced != static_type => announced,
            _ => {
                if declared.is_abstract() {
                    return Err(XmlBindError::AbstractType(static_type.clone()));
                }
                return Ok(Arc::clone(declared));
            }
        };

        let concrete = self.registry.resolve(announced)?;
        if !concrete.is_a(static_type) {
            return Err(XmlBindError::InvalidSubstitution {
                expected: static_type.clone(),
                actual: announced.clone(),
            });
        }
        if concrete.is_abstract() {
            return Err(XmlBindError::AbstractType(announced.clone()));
        }
        debug!(
            element = %start.name,
            declared = %static_type,
            concrete = %announced,
            "resolved xsi:type substitution"
        );
        Ok(Arc::clone(concrete))
    }

    fn parse_fields(&mut self, schema: Arc<RecordSchema>) -> Result<Record, XmlBindError> {
        let mut record = Record::new(Arc::clone(&schema));
        let mut chosen_groups: Vec<u32> = Vec::new();

        for (index, field) in schema.fields().iter().enumerate() {
            if field
                .choice_group()
                .is_some_and(|group| chosen_groups.contains(&group))
            {
                continue;
            }
            match self.consume_field(&schema, index)? {
                FieldMatch::Matched(value) => {
                    trace!(field = %field.name(), "matched field");
                    if let Some(group) = field.choice_group() {
                        chosen_groups.push(group);
                    }
                    record.store(index, value);
                }
                FieldMatch::NotMatched if field.is_required() && field.is_repeated() => {
                    record.store(index, Value::Array(Vec::new()));
                }
                FieldMatch::NotMatched if field.is_required() => {
                    return Err(XmlBindError::MissingRequiredField {
                        record: schema.type_name().clone(),
                        field: field.name().clone(),
                    });
                }
                FieldMatch::NotMatched => {
                    trace!(field = %field.name(), "field absent");
                }
            }
        }

        self.events.skip_whitespace()?;
        match self.events.next_event()? {
            XmlEvent::End(_) => Ok(record),
            XmlEvent::Start(extra) => Err(XmlBindError::UnexpectedTrailingElement {
                record: schema.type_name().clone(),
                element: extra.name,
            }),
            XmlEvent::Text(_) => Err(XmlBindError::unexpected(
                format!("end of {}", schema.type_name()),
                "text content",
            )),
            XmlEvent::Eof => Err(unexpected_eof()),
        }
    }

    /// Try to consume field `index` of `schema` at the cursor.
    fn consume_field(
        &mut self,
        schema: &RecordSchema,
        index: usize,
    ) -> Result<FieldMatch, XmlBindError> {
        let field = &schema.fields()[index];
        self.events.skip_whitespace()?;

        let found = match self.events.peek()? {
            XmlEvent::Start(start) => start.name.clone(),
            XmlEvent::End(_) => return Ok(FieldMatch::NotMatched),
            XmlEvent::Text(_) => {
                return Err(XmlBindError::unexpected(field.name(), "text content"));
            }
            XmlEvent::Eof => return Err(unexpected_eof()),
        };

        if found != *field.name() {
            let later = &schema.fields()[index + 1..];
            if later.is_empty() || later.iter().any(|f| *f.name() == found) {
                return Ok(FieldMatch::NotMatched);
            }
            return Err(XmlBindError::unexpected(field.name(), found));
        }

        if !field.is_repeated() {
            return self.parse_occurrence(field).map(FieldMatch::Matched);
        }
        let mut items = Vec::new();
        loop {
            items.push(self.parse_occurrence(field)?);
            self.events.skip_whitespace()?;
            match self.events.peek()? {
                XmlEvent::Start(next) if next.name == *field.name() => {}
                _ => break,
            }
        }
        Ok(FieldMatch::Matched(Value::Array(items)))
    }

    /// Consume one element of `field`, the cursor being on its start tag.
    fn parse_occurrence(&mut self, field: &FieldDescriptor) -> Result<Value, XmlBindError> {
        let XmlEvent::Start(start) = self.events.next_event()? else {
            return Err(XmlBindError::Malformed(format!(
                "lost the start of {}",
                field.name()
            )));
        };

        if start.nil {
            if !field.is_nillable() {
                return Err(XmlBindError::TypeConversion {
                    field: field.name().clone(),
                    expected: field.field_type().type_label(),
                    value: "xsi:nil".to_owned(),
                    reason: "field is not nillable".to_owned(),
                });
            }
            self.skip_element()?;
            return Ok(Value::Nil);
        }

        match field.field_type() {
            FieldType::Record(static_type) => self
                .parse_record(&start, static_type)
                .map(|record| Value::Record(Box::new(record))),
            FieldType::Binary => self.read_binary(field),
            primitive => {
                let text = self.read_text(field)?;
                Value::from_lexical(primitive, &text).map_err(|reason| {
                    XmlBindError::TypeConversion {
                        field: field.name().clone(),
                        expected: primitive.type_label(),
                        value: text,
                        reason,
                    }
                })
            }
        }
    }

    /// Read the text content of the current element and consume its end tag.
    fn read_text(&mut self, field: &FieldDescriptor) -> Result<String, XmlBindError> {
        let mut text = String::new();
        loop {
            match self.events.next_event()? {
                XmlEvent::Text(t) => text.push_str(&t),
                XmlEvent::End(_) => return Ok(text),
                XmlEvent::Start(child) => {
                    return Err(XmlBindError::unexpected(
                        format!("text content of {}", field.name()),
                        child.name,
                    ));
                }
                XmlEvent::Eof => return Err(unexpected_eof()),
            }
        }
    }

    /// Read inline base64 or resolve an `xop:Include` reference.
    fn read_binary(&mut self, field: &FieldDescriptor) -> Result<Value, XmlBindError> {
        let mut text = String::new();
        let mut content = None;
        loop {
            match self.events.next_event()? {
                XmlEvent::Text(t) => text.push_str(&t),
                XmlEvent::Start(include) if include.name == XOP_INCLUDE && content.is_none() => {
                    let href = include.attribute("href").ok_or_else(|| {
                        XmlBindError::Malformed("xop:Include without href".to_owned())
                    })?;
                    let content_id = content_id_from_href(href).ok_or_else(|| {
                        XmlBindError::Malformed(format!("invalid XOP reference {href:?}"))
                    })?;
                    let data = self
                        .attachments
                        .and_then(|source| source.resolve(&content_id))
                        .ok_or_else(|| XmlBindError::UnresolvedAttachment(content_id.clone()))?;
                    debug!(
                        element = %field.name(),
                        content_id = %content_id,
                        size = data.len(),
                        "resolved MTOM attachment"
                    );
                    self.skip_element()?;
                    content = Some(data);
                }
                XmlEvent::Start(child) => {
                    return Err(XmlBindError::unexpected(
                        format!("content of {}", field.name()),
                        child.name,
                    ));
                }
                XmlEvent::End(_) => break,
                XmlEvent::Eof => return Err(unexpected_eof()),
            }
        }

        match content {
            Some(data) if text.trim().is_empty() => Ok(Value::Binary(data)),
            Some(_) => Err(XmlBindError::Malformed(format!(
                "{} mixes text with an XOP reference",
                field.name()
            ))),
            None => Value::from_lexical(&FieldType::Binary, &text).map_err(|reason| {
                XmlBindError::TypeConversion {
                    field: field.name().clone(),
                    expected: FieldType::Binary.type_label(),
                    value: text,
                    reason,
                }
            }),
        }
    }

    /// Skip the rest of the element whose start tag was just consumed.
    fn skip_element(&mut self) -> Result<(), XmlBindError> {
        let mut depth: u32 = 1;
        loop {
            match self.events.next_event()? {
                XmlEvent::Start(_) => depth += 1,
                XmlEvent::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                XmlEvent::Text(_) => {}
                XmlEvent::Eof => return Err(unexpected_eof()),
            }
        }
    }
}

fn unexpected_eof() -> XmlBindError {
    XmlBindError::Malformed("unexpected end of document".to_owned())
}

/// Parse a document whose root `element` holds a record of `type_name`.
///
/// # Errors
///
/// Returns `XmlBindError` if the document does not match the schema.
pub fn from_xml(
    xml: &[u8],
    element: &QName,
    type_name: &QName,
    registry: &TypeRegistry,
    config: &CodecConfig,
) -> Result<Record, XmlBindError> {
    Deserializer::new(xml, registry, config).parse_document(element, type_name)
}

/// Like [`from_xml`], resolving MTOM references through `source`.
///
/// # Errors
///
/// Returns `XmlBindError` if the document does not match the schema or an
/// attachment is missing.
pub fn from_xml_with_attachments(
    xml: &[u8],
    element: &QName,
    type_name: &QName,
    registry: &TypeRegistry,
    config: &CodecConfig,
    source: &dyn AttachmentSource,
) -> Result<Record, XmlBindError> {
    Deserializer::new(xml, registry, config)
        .with_attachments(source)
        .parse_document(element, type_name)
}

/// Name of the root element of `xml`.
///
/// # Errors
///
/// Returns `Malformed` if the document has no root element.
pub fn root_element_name(xml: &[u8]) -> Result<QName, XmlBindError> {
    let registry = TypeRegistry::new();
    Deserializer::new(xml, &registry, &CodecConfig::default()).peek_element()
}
