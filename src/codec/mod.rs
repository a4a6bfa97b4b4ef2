use crate::error::ParseError;
use mime::Mime;
use serde_json::Value;
use std::sync::Arc;

pub mod builtins;
#[cfg(feature = "xml")]
pub mod xml;

pub use builtins::JsonCodec;
#[cfg(feature = "xml")]
pub use builtins::XmlCodec;
#[cfg(feature = "yaml")]
pub use builtins::YamlCodec;

/// The BodyCodec trait
///
/// A codec turns a formatted request body into request parameters.
/// Codecs are looked up by the request's media type.
///
/// # Example
/// ```
/// use request_gate::codec::BodyCodec;
/// use request_gate::error::ParseError;
/// use mime::Mime;
/// use serde_json::Value;
///
/// struct PlainTextCodec;
///
/// impl BodyCodec for PlainTextCodec {
///     fn name(&self) -> &'static str {
///         "text"
///     }
///
///     fn accepts(&self, mime: &Mime) -> bool {
///         mime.essence_str() == "text/plain"
///     }
///
///     fn decode(&self, body: &[u8]) -> Result<Value, ParseError> {
///         std::str::from_utf8(body)
///             .map(|s| Value::String(s.to_string()))
///             .map_err(|e| ParseError::codec("text", e.to_string()))
///     }
/// }
/// ```
pub trait BodyCodec: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn accepts(&self, mime: &Mime) -> bool;

    fn decode(&self, body: &[u8]) -> Result<Value, ParseError>;
}

/// Ordered set of codecs consulted for every formatted body
#[derive(Clone, Default)]
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn BodyCodec>>,
}

impl CodecRegistry {
    /// An empty registry; every body is left unparsed
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON plus whichever of XML and YAML are compiled in
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.codecs.push(Arc::new(JsonCodec));
        #[cfg(feature = "xml")]
        registry.codecs.push(Arc::new(XmlCodec));
        #[cfg(feature = "yaml")]
        registry.codecs.push(Arc::new(YamlCodec));
        registry
    }

    /// Register a codec ahead of the ones already present
    pub fn register<C: BodyCodec>(mut self, codec: C) -> Self {
        self.codecs.insert(0, Arc::new(codec));
        self
    }

    pub fn find(&self, mime: &Mime) -> Option<&Arc<dyn BodyCodec>> {
        self.codecs.iter().find(|codec| codec.accepts(mime))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.codecs.iter().map(|codec| codec.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct CsvCodec;

    impl BodyCodec for CsvCodec {
        fn name(&self) -> &'static str {
            "csv"
        }

        fn accepts(&self, mime: &Mime) -> bool {
            mime.essence_str() == "text/csv"
        }

        fn decode(&self, _body: &[u8]) -> Result<Value, ParseError> {
            Err(ParseError::codec("csv", "unsupported"))
        }
    }

    struct GreedyJsonCodec;

    impl BodyCodec for GreedyJsonCodec {
        fn name(&self) -> &'static str {
            "greedy-json"
        }

        fn accepts(&self, mime: &Mime) -> bool {
            mime.subtype() == mime::JSON
        }

        fn decode(&self, _body: &[u8]) -> Result<Value, ParseError> {
            Ok(Value::Null)
        }
    }

    #[rstest]
    #[case("application/json", Some("json"))]
    #[case("application/json; charset=utf-8", Some("json"))]
    #[case("application/vnd.api+json", Some("json"))]
    #[case("text/html", None)]
    #[case("application/x-www-form-urlencoded", None)]
    fn test_find_json(#[case] content_type: &str, #[case] expected: Option<&str>) {
        let registry = CodecRegistry::with_defaults();
        let mime: Mime = content_type.parse().unwrap();
        assert_eq!(registry.find(&mime).map(|c| c.name()), expected);
    }

    #[cfg(all(feature = "xml", feature = "yaml"))]
    #[rstest]
    #[case("application/xml", "xml")]
    #[case("text/xml", "xml")]
    #[case("application/atom+xml", "xml")]
    #[case("application/x-yaml", "yaml")]
    #[case("text/yaml", "yaml")]
    fn test_find_markup(#[case] content_type: &str, #[case] expected: &str) {
        let registry = CodecRegistry::with_defaults();
        let mime: Mime = content_type.parse().unwrap();
        assert_eq!(registry.find(&mime).map(|c| c.name()), Some(expected));
    }

    #[test]
    fn test_registered_codec_takes_precedence() {
        let registry = CodecRegistry::with_defaults()
            .register(CsvCodec)
            .register(GreedyJsonCodec);

        let json: Mime = "application/json".parse().unwrap();
        let csv: Mime = "text/csv".parse().unwrap();

        assert_eq!(registry.find(&json).unwrap().name(), "greedy-json");
        assert_eq!(registry.find(&csv).unwrap().name(), "csv");
        assert_eq!(registry.names()[..2], ["greedy-json", "csv"]);
    }

    #[test]
    fn test_empty_registry_finds_nothing() {
        let registry = CodecRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.find(&mime::APPLICATION_JSON).is_none());
    }
}
