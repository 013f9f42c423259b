//! Canonical form of a field mapping.
//!
//! The plaintext inside every `EncryptInfo` is a form-urlencoded string
//! whose keys are sorted by byte value. Two maps holding the same pairs
//! always produce the same bytes, no matter how they were built, so the
//! ciphertext is reproducible for idempotent retries.
//!
//! An empty map serializes to the sentinel pair `empty=1`, which the decoder
//! recognizes and drops.

use std::{
    borrow::Cow,
    collections::{BTreeMap, btree_map},
    fmt,
};

use serde::{Deserialize, Deserializer, Serialize};
use url::form_urlencoded;

use crate::error::{Result, TradeError};

/// Key of the pair emitted for an empty field map.
pub const EMPTY_SENTINEL_KEY: &str = "empty";

/// Value of the pair emitted for an empty field map.
pub const EMPTY_SENTINEL_VALUE: &str = "1";

/// A single field value.
///
/// Inbound values are always [`Text`](Self::Text) or, for bracket-indexed
/// keys, [`List`](Self::List). [`Integer`](Self::Integer) and
/// [`Null`](Self::Null) exist for callers building requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Absent value; dropped before serialization.
    Null,
    /// Integer value, serialized in decimal.
    Integer(i64),
    /// String value.
    Text(String),
    /// Values of `name[0]`, `name[1]`, ... collected under `name`.
    List(Vec<String>),
}

impl FieldValue {
    /// Returns the scalar string form of this value.
    ///
    /// `None` for [`Null`](Self::Null) and [`List`](Self::List).
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(s) => Some(Cow::Borrowed(s)),
            Self::Integer(n) => Some(Cow::Owned(n.to_string())),
            Self::Null | Self::List(_) => None,
        }
    }

    /// Returns `true` for a non-null, non-blank value.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Integer(_) => true,
            Self::Text(s) => !s.trim().is_empty(),
            Self::List(items) => !items.is_empty(),
        }
    }

    /// Returns the value after string coercion, or `None` if it is dropped.
    fn coerced(&self) -> Option<Self> {
        match self {
            Self::Null => None,
            Self::List(items) if items.is_empty() => None,
            Self::Integer(n) => Some(Self::Text(n.to_string())),
            other => Some(other.clone()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Text(value.to_string()), Self::Integer)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for FieldValue {
    /// Converts a JSON value from a gateway payload.
    ///
    /// Scalars become text, arrays of scalars become lists and anything
    /// nested is kept as its JSON text.
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::String(s) => Self::Text(s),
            Value::Number(n) => n.as_i64().map_or_else(|| Self::Text(n.to_string()), Self::Integer),
            Value::Bool(b) => Self::Text(b.to_string()),
            Value::Array(items) => {
                let scalars: Option<Vec<String>> = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        Value::Bool(b) => Some(b.to_string()),
                        _ => None,
                    })
                    .collect();
                scalars.map_or_else(|| Self::Text(Value::Array(items).to_string()), Self::List)
            }
            object @ Value::Object(_) => Self::Text(object.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

/// Mapping from field name to value.
///
/// Backed by a [`BTreeMap`], so iteration is always in byte order of the
/// keys. Unknown keys are carried verbatim.
///
/// # Examples
///
/// ```
/// use payuni_trade::envelope::FieldMap;
///
/// let mut fields = FieldMap::new();
/// fields.insert("MerID", "ABC");
/// fields.insert("Timestamp", 1_700_000_000_i64);
///
/// assert_eq!(fields.text("Timestamp").as_deref(), Some("1700000000"));
/// assert!(fields.is_present("MerID"));
/// assert!(!fields.is_present("TradeNo"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, FieldValue>);

impl FieldMap {
    /// Creates an empty field map.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts a field, returning the previous value for that key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    /// Returns the scalar string form of `key`, if it holds a scalar.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<Cow<'_, str>> {
        self.0.get(key).and_then(FieldValue::as_text)
    }

    /// Returns `true` if `key` holds a non-null, non-blank value.
    #[must_use]
    pub fn is_present(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(FieldValue::is_present)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.0.remove(key)
    }

    /// Returns `true` if `key` exists, even with a null value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries, including null ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.0.iter()
    }

    /// Returns the map as it reads back after a serialize/deserialize cycle.
    ///
    /// Null entries and empty lists are dropped and integers become text.
    #[must_use]
    pub fn coerced(&self) -> Self {
        self.0
            .iter()
            .filter_map(|(key, value)| value.coerced().map(|v| (key.clone(), v)))
            .collect()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<FieldValue>, const N: usize> From<[(K, V); N]> for FieldMap {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<BTreeMap<String, FieldValue>> for FieldMap {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        Self(map)
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, FieldValue);
    type IntoIter = btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Deterministic form-urlencoded serialization of a [`FieldMap`].
///
/// Only produced by [`serialize`] or validated through [`CanonicalForm::parse`],
/// so every value of this type has well-formed percent-encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalForm(String);

impl CanonicalForm {
    /// Validates a form-urlencoded string.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::InvalidCanonicalForm`] if a `%` is not followed
    /// by two hex digits.
    pub fn parse(form: impl Into<String>) -> Result<Self> {
        let form = form.into();
        let bytes = form.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let valid = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                    && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
                if !valid {
                    return Err(TradeError::InvalidCanonicalForm(format!(
                        "malformed percent-encoding at byte {i}"
                    )));
                }
                i += 3;
            } else {
                i += 1;
            }
        }
        Ok(Self(form))
    }

    /// Returns the canonical string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the canonical bytes fed to the cipher.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for CanonicalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializes a field map into its canonical form.
///
/// Null entries are dropped, integers are written in decimal and list
/// values expand to `name[0]=...&name[1]=...` at the position of `name`.
///
/// # Examples
///
/// ```
/// use payuni_trade::envelope::{FieldMap, canonical};
///
/// let fields = FieldMap::from([("b", "2 3"), ("a", "1")]);
/// assert_eq!(canonical::serialize(&fields).as_str(), "a=1&b=2+3");
///
/// assert_eq!(canonical::serialize(&FieldMap::new()).as_str(), "empty=1");
/// ```
#[must_use]
pub fn serialize(fields: &FieldMap) -> CanonicalForm {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut pairs = 0_usize;

    for (key, value) in fields {
        match value {
            FieldValue::Null => {}
            FieldValue::Text(s) => {
                serializer.append_pair(key, s);
                pairs += 1;
            }
            FieldValue::Integer(n) => {
                serializer.append_pair(key, &n.to_string());
                pairs += 1;
            }
            FieldValue::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    serializer.append_pair(&format!("{key}[{index}]"), item);
                    pairs += 1;
                }
            }
        }
    }

    if pairs == 0 {
        serializer.append_pair(EMPTY_SENTINEL_KEY, EMPTY_SENTINEL_VALUE);
    }

    CanonicalForm(serializer.finish())
}

/// Parses a canonical form back into a field map.
///
/// Every value comes back as text. The empty sentinel pair is dropped and
/// bracket-indexed keys are gathered into a [`FieldValue::List`] under their
/// base name, in the order they appear.
#[must_use]
pub fn deserialize(form: &CanonicalForm) -> FieldMap {
    let mut map: BTreeMap<String, FieldValue> = BTreeMap::new();

    for (key, value) in form_urlencoded::parse(form.as_bytes()) {
        if key == EMPTY_SENTINEL_KEY && value == EMPTY_SENTINEL_VALUE {
            continue;
        }

        if let Some(bracket) = key.find('[')
            && key[bracket..].contains(']')
        {
            let base = key[..bracket].to_owned();
            let value = value.into_owned();
            match map.entry(base).or_insert_with(|| FieldValue::List(Vec::new())) {
                FieldValue::List(items) => items.push(value),
                slot => {
                    let previous = slot.as_text().map(Cow::into_owned).unwrap_or_default();
                    *slot = FieldValue::List(vec![previous, value]);
                }
            }
        } else {
            map.insert(key.into_owned(), FieldValue::Text(value.into_owned()));
        }
    }

    FieldMap(map)
}
