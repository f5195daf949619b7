//! Namespace bookkeeping for the writer and the reader.
//!
//! [`NamespaceContext`] is the explicit prefix state of a serialization. It is
//! passed by value into every recursive serialize call and handed back when the
//! element is closed, with declarations made on that element dropped again and
//! the prefix counter kept, so generated prefixes are deterministic for a given
//! record tree.

use crate::schema::{QName, XOP_NAMESPACE, XSI_NAMESPACE};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// In-scope prefix bindings of the element being written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    bindings: Vec<(String, String)>,
    generated: u32,
}

/// Position in a [`NamespaceContext`] to return to when an element closes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScopeMark(usize);

impl NamespaceContext {
    /// An empty context with no prefixes bound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The prefix currently bound to `uri`, innermost first.
    #[must_use]
    pub fn prefix_of(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }

    /// Number of prefixes generated so far.
    #[must_use]
    pub fn generated(&self) -> u32 {
        self.generated
    }

    pub(crate) fn mark(&self) -> ScopeMark {
        ScopeMark(self.bindings.len())
    }

    /// Drop the bindings declared since `mark`.
    pub(crate) fn restore(&mut self, mark: ScopeMark) {
        self.bindings.truncate(mark.0);
    }

    /// Qualified name for `name`, binding a prefix when its namespace is not in scope.
    ///
    /// Newly bound prefixes are appended to `declarations`; the caller must emit
    /// them as `xmlns:prefix` attributes on the element being started.
    pub(crate) fn qualify(
        &mut self,
        name: &QName,
        declarations: &mut Vec<(String, String)>,
    ) -> String {
        let uri = name.namespace();
        if uri.is_empty() {
            return name.local_name().to_owned();
        }
        let prefix = self.bind(uri, declarations);
        format!("{prefix}:{}", name.local_name())
    }

    /// The prefix for `uri`, declaring one if needed.
    pub(crate) fn bind(&mut self, uri: &str, declarations: &mut Vec<(String, String)>) -> String {
        if let Some(prefix) = self.prefix_of(uri) {
            return prefix.to_owned();
        }
        let prefix = match uri {
            XSI_NAMESPACE => "xsi".to_owned(),
            XOP_NAMESPACE => "xop".to_owned(),
            _ => {
                self.generated += 1;
                format!("ns{}", self.generated)
            }
        };
        self.bindings.push((prefix.clone(), uri.to_owned()));
        declarations.push((prefix.clone(), uri.to_owned()));
        prefix
    }
}

/// Namespace scopes of the element being read.
#[derive(Debug, Default)]
pub(crate) struct NamespaceStack {
    scopes: Vec<Vec<(Option<String>, String)>>,
}

impl NamespaceStack {
    pub(crate) fn push(&mut self, declarations: Vec<(Option<String>, String)>) {
        self.scopes.push(declarations);
    }

    pub(crate) fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Namespace bound to `prefix` (`None` for the default namespace).
    pub(crate) fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Resolve a lexical `prefix:local` name.
    ///
    /// Unprefixed element names take the default namespace; unprefixed
    /// attribute names have no namespace.
    pub(crate) fn resolve(&self, raw: &str, is_attribute: bool) -> Result<QName, String> {
        match raw.split_once(':') {
            Some((prefix, local)) => {
                let uri = self
                    .lookup(Some(prefix))
                    .ok_or_else(|| format!("undeclared namespace prefix {prefix:?}"))?;
                Ok(QName::new(uri.to_owned(), local.to_owned()))
            }
            None if is_attribute => Ok(QName::new("", raw.to_owned())),
            None => {
                let uri = self.lookup(None).unwrap_or_default();
                Ok(QName::new(uri.to_owned(), raw.to_owned()))
            }
        }
    }
}
