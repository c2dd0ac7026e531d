//! Body writers produce outbound body content.
//!
//! A [`BodyWriter`] runs to completion into an in-memory buffer before
//! the reply message is constructed (see
//! [`Message::from_body_writer`](crate::Message::from_body_writer)), so
//! a failing writer produces no message rather than a truncated one.

use crate::error::EnvelopeError;
use crate::value::SoapValue;
use crate::xml::XmlWriter;

/// Serializes one message body.
pub trait BodyWriter {
    fn write(&self, xml: &mut XmlWriter) -> Result<(), EnvelopeError>;
}

/// Writes the standard RPC reply shape:
///
/// ```xml
/// <AddResponse xmlns="http://tempuri.org/"><AddResult>5</AddResult></AddResponse>
/// ```
///
/// A `Null` result serializes the result element self-closed.
pub struct ResponseBodyWriter {
    namespace: String,
    wrapper_name: String,
    result_name: String,
    result: SoapValue,
}

impl ResponseBodyWriter {
    pub fn new(
        namespace: impl Into<String>,
        wrapper_name: impl Into<String>,
        result_name: impl Into<String>,
        result: SoapValue,
    ) -> Self {
        ResponseBodyWriter {
            namespace: namespace.into(),
            wrapper_name: wrapper_name.into(),
            result_name: result_name.into(),
            result,
        }
    }
}

impl BodyWriter for ResponseBodyWriter {
    fn write(&self, xml: &mut XmlWriter) -> Result<(), EnvelopeError> {
        xml.start_element_with(&self.wrapper_name, &[("xmlns", self.namespace.as_str())]);
        match self.result.xml_text() {
            Some(text) => {
                xml.start_element(&self.result_name);
                xml.text(&text);
                xml.end_element();
            }
            None => xml.empty_element(&self.result_name),
        }
        xml.end_element();
        Ok(())
    }
}
