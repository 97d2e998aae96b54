use std::{collections::BTreeMap, fmt::Display, str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use serde::Serialize;
use time::{macros::format_description, Date, OffsetDateTime};

pub mod read;
pub mod write;

/// Backend-assigned document identifier.
pub type DocumentId = Arc<str>;

/// Schemaless document as held by the document store.
pub type Document = BTreeMap<Arc<str>, DataValue>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataValue {
    Null,
    Int(i64),
    Money(Decimal),
    String(Arc<str>),
    Date(Date),
    Timestamp(OffsetDateTime),
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(Arc::from(value))
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(Arc::from(value))
    }
}

impl From<Decimal> for DataValue {
    fn from(value: Decimal) -> Self {
        DataValue::Money(value)
    }
}

impl From<Date> for DataValue {
    fn from(value: Date) -> Self {
        DataValue::Date(value)
    }
}

impl From<OffsetDateTime> for DataValue {
    fn from(value: OffsetDateTime) -> Self {
        DataValue::Timestamp(value)
    }
}

impl Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Null => f.write_str("null"),
            DataValue::Int(i) => write!(f, "{}", i),
            DataValue::Money(m) => write!(f, "{}", m),
            DataValue::String(s) => f.write_str(s),
            DataValue::Date(d) => write!(f, "{}", d),
            DataValue::Timestamp(t) => write!(f, "{}", t),
        }
    }
}

/// A typed view over one collection's documents.
pub trait Record: Sized + Clone + Send + Sync + 'static {
    /// Name of the remote collection holding this record type.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn from_document(id: &str, document: &Document) -> Self;
}

/// The currently authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub uid: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub signed_in_at: OffsetDateTime,
}

pub(crate) fn text(document: &Document, key: &str) -> String {
    match document.get(key) {
        None | Some(DataValue::Null) => String::new(),
        Some(value) => value.to_string(),
    }
}

/// Numeric coercion: anything that is not a number or a numeric string counts as zero.
pub(crate) fn money(document: &Document, key: &str) -> Decimal {
    match document.get(key) {
        Some(DataValue::Money(m)) => *m,
        Some(DataValue::Int(i)) => Decimal::from(*i),
        Some(DataValue::String(s)) => Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

pub(crate) fn date(document: &Document, key: &str) -> Option<Date> {
    match document.get(key)? {
        DataValue::Date(d) => Some(*d),
        DataValue::Timestamp(t) => Some(t.date()),
        DataValue::String(s) => parse_date(s),
        _ => None,
    }
}

pub(crate) fn timestamp(document: &Document, key: &str) -> Option<OffsetDateTime> {
    match document.get(key)? {
        DataValue::Timestamp(t) => Some(*t),
        DataValue::Date(d) => Some(d.midnight().assume_utc()),
        _ => None,
    }
}

/// Parses the leading `YYYY-MM-DD` of a string.
pub fn parse_date(value: &str) -> Option<Date> {
    let value = value.trim();
    let head = value.get(..10).unwrap_or(value);
    Date::parse(head, format_description!("[year]-[month]-[day]")).ok()
}

pub(crate) fn put(document: &mut Document, key: &str, value: impl Into<DataValue>) {
    document.insert(Arc::from(key), value.into());
}

pub(crate) fn put_opt<V: Into<DataValue>>(document: &mut Document, key: &str, value: Option<V>) {
    if let Some(value) = value {
        put(document, key, value);
    }
}
