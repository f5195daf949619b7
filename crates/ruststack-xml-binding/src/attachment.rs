//! Out-of-band binary payloads (MTOM/XOP).
//!
//! When MTOM is enabled the serializer hands binary field content to an
//! [`AttachmentSink`] and writes an `xop:Include` reference in its place. The
//! parser resolves such references through an [`AttachmentSource`]. The MIME
//! packaging of the parts belongs to the transport; [`Attachments`] is the
//! in-memory hand-off between the two.

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use uuid::Uuid;

/// Receives binary content that is sent outside the XML body.
pub trait AttachmentSink {
    /// Store `content` and return the content id that references it.
    fn attach(&mut self, content: Bytes) -> String;
}

/// Supplies binary content referenced from the XML body.
pub trait AttachmentSource {
    /// The content stored under `content_id`, if any.
    fn resolve(&self, content_id: &str) -> Option<Bytes>;
}

/// One attachment part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Content id without the `cid:` scheme.
    pub content_id: String,
    /// Raw content.
    pub content: Bytes,
}

/// An ordered set of attachment parts.
#[derive(Debug, Clone, Default)]
pub struct Attachments {
    parts: Vec<Attachment>,
}

impl Attachments {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part received from the transport.
    pub fn insert(&mut self, content_id: impl Into<String>, content: Bytes) {
        self.parts.push(Attachment {
            content_id: content_id.into(),
            content,
        });
    }

    /// Parts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.parts.iter()
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether there are no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl AttachmentSink for Attachments {
    fn attach(&mut self, content: Bytes) -> String {
        let content_id = format!("{}@ruststack", Uuid::new_v4());
        self.insert(content_id.clone(), content);
        content_id
    }
}

impl AttachmentSource for Attachments {
    fn resolve(&self, content_id: &str) -> Option<Bytes> {
        self.parts
            .iter()
            .find(|p| p.content_id == content_id)
            .map(|p| p.content.clone())
    }
}

/// Extract the content id from an `xop:Include` `href` (`cid:...`, percent-encoded).
pub(crate) fn content_id_from_href(href: &str) -> Option<String> {
    let raw = href.strip_prefix("cid:")?;
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|id| id.into_owned())
}
