// used for the header date value
use chrono::NaiveDateTime;

// used to print out readable forms of values
use std::fmt;
use std::hash::{Hash, Hasher};
use std::cmp::Ordering;

use crate::tag::HEADER_DATE_FORMAT;

// ------------- Value -------------
/// One value slot of a clause. The parser picks the variant from the grammar
/// rule that produced it; there is no untyped fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Date(NaiveDateTime),
    Xref(Xref),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_date(&self) -> Option<&NaiveDateTime> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }
    pub fn as_xref(&self) -> Option<&Xref> {
        match self {
            Value::Xref(x) => Some(x),
            _ => None,
        }
    }
    /// The identifier this value names: text as-is, or an xref's id.
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Xref(x) => Some(x.idref()),
            _ => None,
        }
    }
    // booleans may arrive as `true` or as the text "true"
    fn truth(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Text(s) if s == "true" => Some(true),
            Value::Text(s) if s == "false" => Some(false),
            _ => None,
        }
    }
    /// Equality that treats `Bool(true)` and `Text("true")` (and likewise
    /// for false) as the same value.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        if self == other {
            return true;
        }
        match (self.truth(), other.truth()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", format_header_date(d)),
            Value::Xref(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}
impl From<Xref> for Value {
    fn from(x: Xref) -> Self {
        Value::Xref(x)
    }
}

pub fn parse_header_date(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, HEADER_DATE_FORMAT)
}

pub fn format_header_date(date: &NaiveDateTime) -> String {
    date.format(HEADER_DATE_FORMAT).to_string()
}

// ------------- Xref -------------
/// A foreign identifier with an optional free-text annotation. Identity is
/// the identifier alone; the annotation is metadata.
#[derive(Debug, Clone, Eq)]
pub struct Xref {
    idref: String,
    annotation: Option<String>,
}
impl Xref {
    pub fn new(idref: impl Into<String>) -> Self {
        Self {
            idref: idref.into(),
            annotation: None,
        }
    }
    pub fn annotated(idref: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            idref: idref.into(),
            annotation: Some(annotation.into()),
        }
    }
    pub fn idref(&self) -> &str {
        &self.idref
    }
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }
    pub fn set_annotation(&mut self, annotation: impl Into<String>) {
        self.annotation = Some(annotation.into());
    }
    /// The namespace prefix, i.e. everything before the first `:`.
    pub fn id_space(&self) -> &str {
        id_space(&self.idref)
    }
}
impl PartialEq for Xref {
    fn eq(&self, other: &Self) -> bool {
        self.idref == other.idref
    }
}
impl Hash for Xref {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.idref.hash(state);
    }
}
impl fmt::Display for Xref {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.annotation {
            None => write!(f, "{}", self.idref),
            Some(annotation) => write!(f, "<{} \"{}\">", self.idref, annotation),
        }
    }
}

/// Prefix of an identifier up to its first `:`, or the whole identifier.
pub fn id_space(id: &str) -> &str {
    id.split_once(':').map(|(prefix, _)| prefix).unwrap_or(id)
}

// ------------- QualifierValue -------------
/// A trailing `key=value` annotation. Ordered by rendered text so qualifier
/// blocks print deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifierValue {
    qualifier: String,
    value: String,
}
impl QualifierValue {
    pub fn new(qualifier: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            value: value.into(),
        }
    }
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }
    pub fn value(&self) -> &str {
        &self.value
    }
}
impl fmt::Display for QualifierValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{}={}}}", self.qualifier, self.value)
    }
}
impl Ord for QualifierValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string()
            .cmp(&other.to_string())
            // keeps Ord consistent with Eq when two renderings collide
            .then_with(|| (&self.qualifier, &self.value).cmp(&(&other.qualifier, &other.value)))
    }
}
impl PartialOrd for QualifierValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
