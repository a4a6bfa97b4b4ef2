use crate::codec::BodyCodec;
use crate::error::ParseError;
use mime::Mime;
use serde_json::Value;

fn has_suffix(mime: &Mime, suffix: &str) -> bool {
    mime.suffix().is_some_and(|s| s.as_str() == suffix)
}

/// `application/json` and any `+json` media type
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl BodyCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn accepts(&self, mime: &Mime) -> bool {
        mime.subtype() == mime::JSON || has_suffix(mime, "json")
    }

    fn decode(&self, body: &[u8]) -> Result<Value, ParseError> {
        serde_json::from_slice(body).map_err(|e| ParseError::Json(e.to_string()))
    }
}

/// `application/xml`, `text/xml` and any `+xml` media type
#[cfg(feature = "xml")]
#[derive(Clone, Copy, Debug, Default)]
pub struct XmlCodec;

#[cfg(feature = "xml")]
impl BodyCodec for XmlCodec {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn accepts(&self, mime: &Mime) -> bool {
        mime.subtype() == mime::XML || has_suffix(mime, "xml")
    }

    fn decode(&self, body: &[u8]) -> Result<Value, ParseError> {
        crate::codec::xml::to_params(body)
    }
}

/// YAML under `application/` or `text/`, with or without the `x-` prefix
#[cfg(feature = "yaml")]
#[derive(Clone, Copy, Debug, Default)]
pub struct YamlCodec;

#[cfg(feature = "yaml")]
impl BodyCodec for YamlCodec {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn accepts(&self, mime: &Mime) -> bool {
        matches!(
            (mime.type_().as_str(), mime.subtype().as_str()),
            ("application" | "text", "yaml" | "x-yaml")
        )
    }

    fn decode(&self, body: &[u8]) -> Result<Value, ParseError> {
        serde_yaml::from_slice(body).map_err(|e| ParseError::Yaml(e.to_string()))
    }
}
