//! Harvested student records
//!
//! A [`Record`] is an ordered field map. The originating identifier is always
//! the first field; later fields keep the order in which the page listed them.

use crate::identifier::Identifier;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Field holding the originating identifier
pub const IDENTIFIER_FIELD: &str = "student_id";

/// Field holding the local path of a downloaded profile image
pub const IMAGE_PATH_FIELD: &str = "profile_picture_path";

/// Field used for the per-identifier progress line
pub const NAME_FIELD: &str = "Name";

/// Structured result of one successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Creates a record containing only the identifier field
    pub fn new(identifier: &Identifier) -> Self {
        Self {
            fields: vec![(IDENTIFIER_FIELD.to_string(), identifier.to_string())],
        }
    }

    /// Sets a field, replacing an existing value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn identifier(&self) -> &str {
        self.get(IDENTIFIER_FIELD).unwrap_or_default()
    }

    pub fn image_path(&self) -> Option<&str> {
        self.get(IMAGE_PATH_FIELD)
    }

    /// True when nothing beyond the identifier was extracted
    pub fn has_data(&self) -> bool {
        self.fields.iter().any(|(k, _)| k != IDENTIFIER_FIELD)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
