//! Decoding of the extended JSON produced by document-store exports.
//!
//! Exports write identifiers either as plain strings or as `{"$oid": "..."}`,
//! and timestamps either as RFC 3339 strings, epoch milliseconds, or wrapped
//! in `{"$date": ...}` / `{"$numberLong": "..."}`. Both forms are accepted.
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identifier of a document in the source store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ObjectIdRepr {
    Plain(String),
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match ObjectIdRepr::deserialize(deserializer)? {
            ObjectIdRepr::Plain(id) => Ok(Self(id)),
            ObjectIdRepr::Extended { oid } => Ok(Self(oid)),
        }
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DateRepr {
    Text(String),
    Millis(i64),
    Date {
        #[serde(rename = "$date")]
        date: Box<DateRepr>,
    },
    Long {
        #[serde(rename = "$numberLong")]
        value: String,
    },
}

impl DateRepr {
    fn resolve(self) -> Result<DateTime<Utc>, String> {
        match self {
            DateRepr::Text(text) => parse_date_text(&text),
            DateRepr::Millis(millis) => from_millis(millis),
            DateRepr::Date { date } => date.resolve(),
            DateRepr::Long { value } => {
                let millis = value
                    .parse::<i64>()
                    .map_err(|e| format!("invalid $numberLong `{}`: {}", value, e))?;
                from_millis(millis)
            }
        }
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| format!("timestamp {} is out of range", millis))
}

/// Parses an RFC 3339 timestamp, falling back to a zone-less timestamp read as UTC.
pub fn parse_date_text(text: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp `{}`: {}", text, e))
}

/// `#[serde(with = "...")]` adapter for extended JSON timestamps.
pub mod date {
    use super::DateRepr;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        DateRepr::deserialize(deserializer)?
            .resolve()
            .map_err(serde::de::Error::custom)
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }
}
