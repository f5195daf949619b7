//! SOAP faults returned by the service skeleton.
//!
//! S3 reports SOAP faults with a dotted fault code: the SOAP 1.1 class
//! (`Client` or `Server`) followed by the S3 error code, e.g.
//! `soapenv:Client.NoSuchKey`.

use std::fmt;
use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use ruststack_xml_binding::{ErrorKind, XmlBindError};

use crate::operations::S3SoapOperation;

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP 1.1 fault class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCode {
    /// The message was wrong; resending it unchanged will fail again.
    Client,
    /// The receiver failed to process a valid message.
    Server,
}

impl FaultCode {
    /// Returns the fault class as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Server => "Server",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A SOAP fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}.{reason}: {message}")]
pub struct SoapFault {
    /// Fault class.
    pub code: FaultCode,
    /// S3 error code, e.g. `NoSuchKey`.
    pub reason: String,
    /// Human-readable description.
    pub message: String,
}

impl SoapFault {
    /// Create a fault.
    #[must_use]
    pub fn new(code: FaultCode, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// Create a `Client` fault.
    #[must_use]
    pub fn client(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FaultCode::Client, reason, message)
    }

    /// Create a `Server` fault.
    #[must_use]
    pub fn server(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FaultCode::Server, reason, message)
    }

    /// The fault for an operation the handler does not implement.
    #[must_use]
    pub fn not_implemented(operation: S3SoapOperation) -> Self {
        Self::server(
            "NotImplemented",
            format!("{operation} is not implemented"),
        )
    }

    /// Qualified `faultcode` value, e.g. `soapenv:Client.NoSuchKey`.
    #[must_use]
    pub fn fault_code(&self) -> String {
        format!("soapenv:{}.{}", self.code, self.reason)
    }
}

impl From<XmlBindError> for SoapFault {
    fn from(err: XmlBindError) -> Self {
        let kind = err.kind();
        let reason = match kind {
            ErrorKind::TypeConversion => "InvalidArgument",
            ErrorKind::InvalidValue | ErrorKind::Configuration => "InternalError",
            ErrorKind::MissingRequiredField
            | ErrorKind::UnexpectedElement
            | ErrorKind::UnexpectedTrailingElement
            | ErrorKind::UnknownType
            | ErrorKind::Stream => "MalformedXML",
        };
        let code = if kind.fault_code() == "Server" {
            FaultCode::Server
        } else {
            FaultCode::Client
        };
        Self::new(code, reason, format!("{kind}: {err}"))
    }
}

/// Format a fault as a SOAP 1.1 `Fault` element.
///
/// ```text
/// <soapenv:Fault xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
///   <faultcode>soapenv:Client.NoSuchKey</faultcode>
///   <faultstring>The specified key does not exist.</faultstring>
/// </soapenv:Fault>
/// ```
#[must_use]
pub fn fault_to_xml(fault: &SoapFault) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    if let Err(e) = write_fault_xml(&mut buf, fault) {
        tracing::error!(error = %e, "failed to serialize SOAP fault XML");
        buf.clear();
    }
    buf
}

fn write_fault_xml(buf: &mut Vec<u8>, fault: &SoapFault) -> io::Result<()> {
    let mut writer = Writer::new(buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let fault_code = fault.fault_code();
    writer
        .create_element("soapenv:Fault")
        .with_attribute(("xmlns:soapenv", SOAP_ENVELOPE_NAMESPACE))
        .write_inner_content(|w| {
            w.create_element("faultcode")
                .write_text_content(BytesText::new(&fault_code))?;
            w.create_element("faultstring")
                .write_text_content(BytesText::new(&fault.message))?;
            Ok(())
        })?;

    Ok(())
}
