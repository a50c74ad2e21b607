#![forbid(unsafe_code)]

//! Typed attribute value codec.
//!
//! The wire `xsi:type` hint selects the decoding.  A recognized integer
//! type parses the text as an integer; a recognized string type yields a
//! typed string; anything else is untyped — plain text, unless the value
//! carries element children (an embedded `<saml:NameID>` and the like),
//! which are preserved verbatim as an opaque fragment.  Untyped values
//! are never coerced to a numeric type.

use sigtuna_core::{ns, Error};
use sigtuna_xml::XmlWriter;

/// A decoded `<saml:AttributeValue>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Text content. `typed` records whether the wire value carried
    /// `xsi:type="xs:string"`, so serialization reproduces the observed
    /// form.  Freshly constructed values default to untyped.
    String { value: String, typed: bool },
    /// An `xsi:type="xs:integer"` value.
    Integer(i64),
    /// Structural content, kept as the verbatim serialized child elements.
    Fragment(String),
}

impl AttributeValue {
    /// An untyped string value.
    pub fn string(value: impl Into<String>) -> Self {
        Self::String {
            value: value.into(),
            typed: false,
        }
    }

    pub fn integer(value: i64) -> Self {
        Self::Integer(value)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_fragment(&self) -> Option<&str> {
        match self {
            Self::Fragment(xml) => Some(xml),
            _ => None,
        }
    }

    /// Decode an `<AttributeValue>` node.  `source` is the document text
    /// the node was parsed from; fragments are sliced from it verbatim.
    pub fn decode(node: roxmltree::Node<'_, '_>, source: &str) -> Result<Self, Error> {
        match node.attribute((ns::XSI, "type")) {
            Some(t) if is_integer_type(t) => {
                let text = node.text().unwrap_or("").trim();
                text.parse::<i64>()
                    .map(Self::Integer)
                    .map_err(|_| Error::Parse(format!("invalid xs:integer value: {text:?}")))
            }
            Some(t) if is_string_type(t) => Ok(Self::String {
                value: node.text().unwrap_or("").to_owned(),
                typed: true,
            }),
            // No hint, or a type this codec does not recognize: keep the
            // content as observed.
            _ => {
                let elements: Vec<roxmltree::Node<'_, '_>> =
                    node.children().filter(|c| c.is_element()).collect();
                if elements.is_empty() {
                    Ok(Self::String {
                        value: node.text().unwrap_or("").to_owned(),
                        typed: false,
                    })
                } else {
                    let start = elements[0].range().start;
                    let end = elements[elements.len() - 1].range().end;
                    Ok(Self::Fragment(source[start..end].to_owned()))
                }
            }
        }
    }

    /// Serialize this value as a `<saml:AttributeValue>` element.
    pub fn write(&self, w: &mut XmlWriter) {
        match self {
            Self::Integer(v) => w.text_element(
                "saml:AttributeValue",
                &[
                    ("xmlns:xs", ns::XS),
                    ("xmlns:xsi", ns::XSI),
                    ("xsi:type", "xs:integer"),
                ],
                &v.to_string(),
            ),
            Self::String { value, typed: true } => w.text_element(
                "saml:AttributeValue",
                &[
                    ("xmlns:xs", ns::XS),
                    ("xmlns:xsi", ns::XSI),
                    ("xsi:type", "xs:string"),
                ],
                value,
            ),
            Self::String {
                value,
                typed: false,
            } => w.text_element("saml:AttributeValue", &[], value),
            Self::Fragment(xml) => {
                w.start_element("saml:AttributeValue", &[]);
                w.raw(xml);
                w.end_element("saml:AttributeValue");
            }
        }
    }
}

fn is_integer_type(t: &str) -> bool {
    matches!(t, "xs:integer" | "xsd:integer")
}

fn is_string_type(t: &str) -> bool {
    matches!(t, "xs:string" | "xsd:string")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_first(xml: &str) -> Result<AttributeValue, Error> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        AttributeValue::decode(doc.root_element(), xml)
    }

    const WRAP: &str = r#"xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#;

    #[test]
    fn integer_hint_decodes_to_integer() {
        let xml = format!(r#"<saml:AttributeValue {WRAP} xsi:type="xs:integer">42</saml:AttributeValue>"#);
        assert_eq!(decode_first(&xml).unwrap(), AttributeValue::Integer(42));
    }

    #[test]
    fn non_numeric_integer_is_a_parse_error() {
        let xml = format!(r#"<saml:AttributeValue {WRAP} xsi:type="xs:integer">forty-two</saml:AttributeValue>"#);
        assert!(matches!(decode_first(&xml), Err(Error::Parse(_))));
    }

    #[test]
    fn string_hint_decodes_typed() {
        let xml = format!(r#"<saml:AttributeValue {WRAP} xsi:type="xs:string">string</saml:AttributeValue>"#);
        assert_eq!(
            decode_first(&xml).unwrap(),
            AttributeValue::String {
                value: "string".into(),
                typed: true
            }
        );
    }

    #[test]
    fn missing_hint_stays_untyped_text() {
        let xml = format!(r#"<saml:AttributeValue {WRAP}>123</saml:AttributeValue>"#);
        // Never silently coerced to a numeric type.
        assert_eq!(
            decode_first(&xml).unwrap(),
            AttributeValue::String {
                value: "123".into(),
                typed: false
            }
        );
    }

    #[test]
    fn element_children_become_a_fragment() {
        let xml = format!(
            r#"<saml:AttributeValue {WRAP}><saml:NameID Format="urn:f">abcd</saml:NameID></saml:AttributeValue>"#
        );
        let value = decode_first(&xml).unwrap();
        assert_eq!(
            value.as_fragment(),
            Some(r#"<saml:NameID Format="urn:f">abcd</saml:NameID>"#)
        );
    }

    #[test]
    fn write_then_decode_is_identity() {
        let values = vec![
            AttributeValue::Integer(42),
            AttributeValue::String {
                value: "typed".into(),
                typed: true,
            },
            AttributeValue::string("plain"),
            AttributeValue::Fragment("<saml:NameID>x</saml:NameID>".into()),
        ];
        for value in values {
            let mut w = XmlWriter::new();
            w.start_element("saml:wrap", &[("xmlns:saml", sigtuna_core::ns::SAML)]);
            value.write(&mut w);
            w.end_element("saml:wrap");
            let xml = w.into_string();
            let doc = roxmltree::Document::parse(&xml).unwrap();
            let node = doc.root_element().first_element_child().unwrap();
            assert_eq!(AttributeValue::decode(node, &xml).unwrap(), value);
        }
    }
}
