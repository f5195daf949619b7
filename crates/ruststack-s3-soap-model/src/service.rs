//! The S3 SOAP service skeleton.
//!
//! [`S3SoapService`] ties the codec to an [`S3SoapHandler`]. For each call it:
//!
//! 1. Identifies the operation from the root element of the SOAP body payload
//! 2. Parses the payload into the operation's request record
//! 3. Dispatches to the handler
//! 4. Checks the handler's record against the operation's response type
//! 5. Serializes the response, moving binaries to attachments when MTOM is on
//!
//! Any failure becomes a [`SoapFault`]. The SOAP envelope and the MIME
//! packaging of attachments belong to the transport.

use std::sync::Arc;

use ruststack_xml_binding::{
    Attachments, CodecConfig, QName, Record, SharedTypeRegistry, XmlBindError,
    from_xml_with_attachments, root_element_name, to_xml_with_attachments,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::fault::{SoapFault, fault_to_xml};
use crate::handler::S3SoapHandler;
use crate::operations::S3SoapOperation;
use crate::registry::build_registry;

/// The serialized outcome of one call.
#[derive(Debug, Clone)]
pub struct SoapResponse {
    /// Id assigned to the request for log correlation.
    pub request_id: String,
    /// Response payload, or a `Fault` element when `is_fault` is set.
    pub body: Vec<u8>,
    /// Binary parts referenced from `body` through `xop:Include`.
    pub attachments: Attachments,
    /// Whether `body` holds a fault.
    pub is_fault: bool,
}

impl SoapResponse {
    fn fault(request_id: String, fault: &SoapFault) -> Self {
        Self {
            request_id,
            body: fault_to_xml(fault),
            attachments: Attachments::new(),
            is_fault: true,
        }
    }
}

/// Parses S3 SOAP requests, dispatches them and serializes the results.
///
/// # Type Parameters
///
/// - `H`: The business logic handler implementing [`S3SoapHandler`].
#[derive(Debug)]
pub struct S3SoapService<H: S3SoapHandler> {
    handler: Arc<H>,
    registry: SharedTypeRegistry,
    config: Arc<CodecConfig>,
}

impl<H: S3SoapHandler> Clone for S3SoapService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            registry: self.registry.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: S3SoapHandler> S3SoapService<H> {
    /// Create a service over an existing registry.
    #[must_use]
    pub fn new(handler: H, registry: SharedTypeRegistry, config: CodecConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            registry,
            config: Arc::new(config),
        }
    }

    /// Create a service with a fresh registry holding the S3 types.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in schemas are inconsistent.
    pub fn with_s3_registry(handler: H, config: CodecConfig) -> Result<Self, XmlBindError> {
        let registry = SharedTypeRegistry::new(build_registry()?);
        Ok(Self::new(handler, registry, config))
    }

    /// The registry used for parsing and serializing.
    #[must_use]
    pub fn registry(&self) -> &SharedTypeRegistry {
        &self.registry
    }

    /// The codec configuration.
    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Parse a request payload and identify its operation.
    ///
    /// # Errors
    ///
    /// Returns a `Client` fault when the root element names no known operation
    /// or the payload does not match the request schema.
    pub fn parse_request(
        &self,
        xml: &[u8],
        attachments: &Attachments,
    ) -> Result<(S3SoapOperation, Record), SoapFault> {
        let element = root_element_name(xml)?;
        let operation = S3SoapOperation::from_request_element(&element).ok_or_else(|| {
            SoapFault::client(
                "InvalidRequest",
                format!("{element} is not an S3 SOAP operation"),
            )
        })?;
        let registry = self.registry.read();
        let request =
            from_xml_with_attachments(xml, &element, &element, &registry, &self.config, attachments)?;
        Ok((operation, request))
    }

    /// Serialize the handler's response for `operation`.
    ///
    /// # Errors
    ///
    /// Returns a `Server` fault when `response` is not of the operation's
    /// response type or cannot be serialized.
    pub fn serialize_response(
        &self,
        operation: S3SoapOperation,
        response: &Record,
    ) -> Result<(Vec<u8>, Attachments), SoapFault> {
        let element: QName = operation.response_element();
        if !response.schema().is_a(&element) {
            return Err(SoapFault::server(
                "InternalError",
                format!(
                    "{operation} produced {} instead of {element}",
                    response.type_name()
                ),
            ));
        }
        let mut attachments = Attachments::new();
        let body = to_xml_with_attachments(
            response,
            &element,
            &element,
            &self.config,
            &mut attachments,
        )
        .map_err(|e| SoapFault::server("InternalError", e.to_string()))?;
        Ok((body, attachments))
    }

    /// Run one request through the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns the fault raised by parsing, the handler, or serialization.
    pub fn call(
        &self,
        xml: &[u8],
        attachments: &Attachments,
    ) -> Result<(S3SoapOperation, Vec<u8>, Attachments), SoapFault> {
        let (operation, request) = self.parse_request(xml, attachments)?;
        debug!(%operation, fields = ?request.tracked_fields(), "parsed S3 SOAP request");

        let response = self.handler.handle(operation, request)?;
        let (body, attachments) = self.serialize_response(operation, &response)?;
        Ok((operation, body, attachments))
    }

    /// Run one request and always produce a body, formatting failures as faults.
    #[must_use]
    pub fn process(&self, xml: &[u8], attachments: &Attachments) -> SoapResponse {
        let request_id = Uuid::new_v4().to_string();
        match self.call(xml, attachments) {
            Ok((operation, body, attachments)) => {
                info!(
                    %operation,
                    request_id,
                    bytes = body.len(),
                    attachments = attachments.len(),
                    "S3 SOAP operation succeeded"
                );
                SoapResponse {
                    request_id,
                    body,
                    attachments,
                    is_fault: false,
                }
            }
            Err(fault) => {
                warn!(
                    fault_code = %fault.fault_code(),
                    message = %fault.message,
                    request_id,
                    "S3 SOAP operation failed"
                );
                SoapResponse::fault(request_id, &fault)
            }
        }
    }
}
