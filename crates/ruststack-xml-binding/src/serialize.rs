//! Record serialization: writing records as namespaced XML.
//!
//! One generic algorithm covers every record type. For each field in schema
//! order the serializer either skips it (optional and untracked), fails
//! (required and untracked), recurses (nested record), repeats (array), or
//! writes canonical text. Binary fields go to the attachment channel when MTOM
//! is enabled, otherwise they are written inline as base64.
//!
//! Prefix state lives in a [`NamespaceContext`] that every recursive call
//! receives and returns; the serializer itself keeps no namespace state.

use std::io::Write;

use bytes::Bytes;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::{debug, trace};

use crate::attachment::AttachmentSink;
use crate::config::CodecConfig;
use crate::error::XmlBindError;
use crate::namespace::NamespaceContext;
use crate::record::Record;
use crate::schema::{FieldDescriptor, FieldType, QName, XOP_NAMESPACE, XSI_NAMESPACE};
use crate::value::{Value, encode_base64};

const XOP_INCLUDE: QName = QName::from_static(XOP_NAMESPACE, "Include");

/// Streaming record writer.
pub struct Serializer<'a, W: Write> {
    writer: Writer<W>,
    config: &'a CodecConfig,
    attachments: Option<&'a mut dyn AttachmentSink>,
}

impl<W: Write> std::fmt::Debug for Serializer<'_, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Serializer")
            .field("config", &self.config)
            .field("attachments", &self.attachments.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a, W: Write> Serializer<'a, W> {
    /// Create a serializer writing to `inner`.
    pub fn new(inner: W, config: &'a CodecConfig) -> Self {
        Self {
            writer: Writer::new(inner),
            config,
            attachments: None,
        }
    }

    /// Supply an attachment channel for MTOM output.
    #[must_use]
    pub fn with_attachments(mut self, sink: &'a mut dyn AttachmentSink) -> Self {
        self.attachments = Some(sink);
        self
    }

    /// Write the XML declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn write_declaration(&mut self) -> Result<(), XmlBindError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(())
    }

    /// Write `record` as the element `element`.
    ///
    /// With `serialize_type` the element announces the record's type through
    /// `xsi:type`, which is how a subtype identifies itself when the reader
    /// only knows a base type. Returns the context with the bindings declared
    /// on this element removed again.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` for an untracked required field,
    /// `AbstractType` for an abstract record, or any writer error.
    pub fn serialize_record(
        &mut self,
        record: &Record,
        element: &QName,
        serialize_type: bool,
        ctx: NamespaceContext,
    ) -> Result<NamespaceContext, XmlBindError> {
        self.write_record(record, element, serialize_type, ctx)
    }

    /// Consume the serializer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_record(
        &mut self,
        record: &Record,
        element: &QName,
        serialize_type: bool,
        mut ctx: NamespaceContext,
    ) -> Result<NamespaceContext, XmlBindError> {
        let schema = record.schema();
        if schema.is_abstract() {
            return Err(XmlBindError::AbstractType(schema.type_name().clone()));
        }

        let mark = ctx.mark();
        let mut declarations = Vec::new();
        let tag = ctx.qualify(element, &mut declarations);
        let type_attribute = if serialize_type {
            let xsi = ctx.bind(XSI_NAMESPACE, &mut declarations);
            let type_name = ctx.qualify(schema.type_name(), &mut declarations);
            Some((format!("{xsi}:type"), type_name))
        } else {
            None
        };

        let mut start = BytesStart::new(tag.as_str());
        push_declarations(&mut start, &declarations);
        if let Some((key, value)) = &type_attribute {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        self.writer.write_event(Event::Start(start))?;

        for (index, field) in schema.fields().iter().enumerate() {
            ctx = self.write_field(record, field, record.value_at(index), ctx)?;
        }

        self.writer
            .write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        ctx.restore(mark);
        Ok(ctx)
    }

    fn write_field(
        &mut self,
        record: &Record,
        field: &FieldDescriptor,
        value: Option<&Value>,
        ctx: NamespaceContext,
    ) -> Result<NamespaceContext, XmlBindError> {
        let Some(value) = value else {
            if field.is_required() {
                return Err(XmlBindError::MissingRequiredField {
                    record: record.type_name().clone(),
                    field: field.name().clone(),
                });
            }
            trace!(field = %field.name(), "skipping untracked field");
            return Ok(ctx);
        };

        match value {
            Value::Array(items) if field.is_repeated() => {
                let mut ctx = ctx;
                for item in items {
                    ctx = self.write_occurrence(field, item, ctx)?;
                }
                Ok(ctx)
            }
            _ => self.write_occurrence(field, value, ctx),
        }
    }

    fn write_occurrence(
        &mut self,
        field: &FieldDescriptor,
        value: &Value,
        ctx: NamespaceContext,
    ) -> Result<NamespaceContext, XmlBindError> {
        match value {
            Value::Nil => self.write_nil(field.name(), ctx),
            Value::Record(nested) => {
                let announce = match field.field_type() {
                    FieldType::Record(declared) => declared != nested.type_name(),
                    _ => true,
                };
                if announce {
                    debug!(
                        field = %field.name(),
                        type_name = %nested.type_name(),
                        "announcing subtype with xsi:type"
                    );
                }
                self.write_record(nested, field.name(), announce, ctx)
            }
            Value::Binary(data) => self.write_binary(field.name(), data, ctx),
            Value::Array(_) => Err(XmlBindError::InvalidValue {
                field: field.name().clone(),
                reason: "nested arrays cannot be written".to_owned(),
            }),
            primitive => match primitive.to_lexical() {
                Some(text) => self.write_text_element(field.name(), &text, ctx),
                None => Err(XmlBindError::InvalidValue {
                    field: field.name().clone(),
                    reason: format!("{} has no text form", primitive.kind_label()),
                }),
            },
        }
    }

    /// Write `<name>text</name>`.
    fn write_text_element(
        &mut self,
        name: &QName,
        text: &str,
        mut ctx: NamespaceContext,
    ) -> Result<NamespaceContext, XmlBindError> {
        let mark = ctx.mark();
        let mut declarations = Vec::new();
        let tag = ctx.qualify(name, &mut declarations);

        let mut start = BytesStart::new(tag.as_str());
        push_declarations(&mut start, &declarations);
        self.writer.write_event(Event::Start(start))?;
        if !text.is_empty() {
            self.writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::new(tag.as_str())))?;

        ctx.restore(mark);
        Ok(ctx)
    }

    /// Write `<name xsi:nil="true"/>`.
    fn write_nil(
        &mut self,
        name: &QName,
        mut ctx: NamespaceContext,
    ) -> Result<NamespaceContext, XmlBindError> {
        let mark = ctx.mark();
        let mut declarations = Vec::new();
        let tag = ctx.qualify(name, &mut declarations);
        let xsi = ctx.bind(XSI_NAMESPACE, &mut declarations);

        let mut start = BytesStart::new(tag.as_str());
        push_declarations(&mut start, &declarations);
        let nil = format!("{xsi}:nil");
        start.push_attribute((nil.as_str(), "true"));
        self.writer.write_event(Event::Empty(start))?;

        ctx.restore(mark);
        Ok(ctx)
    }

    /// Write binary content as an XOP reference or as inline base64.
    fn write_binary(
        &mut self,
        name: &QName,
        data: &Bytes,
        mut ctx: NamespaceContext,
    ) -> Result<NamespaceContext, XmlBindError> {
        let externalize = self.config.mtom_enabled && data.len() >= self.config.mtom_threshold;
        let content_id = match self.attachments.as_deref_mut() {
            Some(sink) if externalize => Some(sink.attach(data.clone())),
            _ => None,
        };
        let Some(content_id) = content_id else {
            return self.write_text_element(name, &encode_base64(data), ctx);
        };
        debug!(
            element = %name,
            content_id = %content_id,
            size = data.len(),
            "sending binary as MTOM attachment"
        );

        let mark = ctx.mark();
        let mut declarations = Vec::new();
        let tag = ctx.qualify(name, &mut declarations);
        let mut start = BytesStart::new(tag.as_str());
        push_declarations(&mut start, &declarations);
        self.writer.write_event(Event::Start(start))?;

        let inner_mark = ctx.mark();
        let mut inner_declarations = Vec::new();
        let include_tag = ctx.qualify(&XOP_INCLUDE, &mut inner_declarations);
        let mut include = BytesStart::new(include_tag.as_str());
        push_declarations(&mut include, &inner_declarations);
        let href = format!("cid:{content_id}");
        include.push_attribute(("href", href.as_str()));
        self.writer.write_event(Event::Empty(include))?;
        ctx.restore(inner_mark);

        self.writer
            .write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        ctx.restore(mark);
        Ok(ctx)
    }
}

/// Add `xmlns:prefix="uri"` attributes for newly bound prefixes.
fn push_declarations(start: &mut BytesStart<'_>, declarations: &[(String, String)]) {
    for (prefix, uri) in declarations {
        let key = format!("xmlns:{prefix}");
        start.push_attribute((key.as_str(), uri.as_str()));
    }
}

/// Serialize a record as a complete XML document.
///
/// `type_name` is the type the reader expects under `element`. A record of a
/// derived type announces itself through `xsi:type` on the root element.
///
/// # Errors
///
/// Returns `XmlBindError` if serialization fails.
pub fn to_xml(
    record: &Record,
    element: &QName,
    type_name: &QName,
    config: &CodecConfig,
) -> Result<Vec<u8>, XmlBindError> {
    write_document(record, element, type_name, config, None)
}

/// Serialize a record as a complete XML document, sending binaries through `sink`
/// when MTOM is enabled in `config`.
///
/// # Errors
///
/// Returns `XmlBindError` if serialization fails.
pub fn to_xml_with_attachments(
    record: &Record,
    element: &QName,
    type_name: &QName,
    config: &CodecConfig,
    sink: &mut dyn AttachmentSink,
) -> Result<Vec<u8>, XmlBindError> {
    write_document(record, element, type_name, config, Some(sink))
}

fn write_document(
    record: &Record,
    element: &QName,
    type_name: &QName,
    config: &CodecConfig,
    sink: Option<&mut dyn AttachmentSink>,
) -> Result<Vec<u8>, XmlBindError> {
    let announce = record.type_name() != type_name;
    if announce {
        debug!(%element, type_name = %record.type_name(), "announcing root subtype with xsi:type");
    }

    let mut buf = Vec::with_capacity(512);
    {
        let mut serializer = Serializer::new(&mut buf, config);
        if let Some(sink) = sink {
            serializer = serializer.with_attachments(sink);
        }
        if config.xml_declaration {
            serializer.write_declaration()?;
        }
        serializer.serialize_record(record, element, announce, NamespaceContext::new())?;
    }
    Ok(buf)
}
