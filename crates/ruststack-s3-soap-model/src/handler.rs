//! Service skeleton: the boundary between the codec and S3 business logic.
//!
//! The codec sits strictly below this layer. [`S3SoapService`] parses the
//! request, calls [`S3SoapHandler::handle`], and serializes whatever record the
//! handler returns; the handler never sees XML.
//!
//! [`S3SoapService`]: crate::service::S3SoapService

use ruststack_xml_binding::Record;

use crate::fault::SoapFault;
use crate::operations::S3SoapOperation;

/// Trait that the business logic provider must implement.
///
/// `request` is a record of the operation's request type. The returned record
/// must be of the operation's response type, i.e. the record for the response
/// element such as `CreateBucketResponse`.
pub trait S3SoapHandler: Send + Sync + 'static {
    /// Handle one operation.
    fn handle(&self, operation: S3SoapOperation, request: Record) -> Result<Record, SoapFault>;
}

/// A handler that answers every operation with a `NotImplemented` fault.
///
/// Useful for exercising the codec and dispatch layers in isolation.
#[derive(Debug, Clone, Default)]
pub struct NotImplementedHandler;

impl S3SoapHandler for NotImplementedHandler {
    fn handle(&self, operation: S3SoapOperation, _request: Record) -> Result<Record, SoapFault> {
        Err(SoapFault::not_implemented(operation))
    }
}
