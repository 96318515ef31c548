use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::errors::{MappingError, Result};
use crate::field::Field;

/// Where one persistent class is stored and how its fields are typed.
///
/// `fields` is keyed by document field name, and each [`Field`] carries the
/// same name. `persistent_fields` maps the class's own field names onto them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElasticsearchMapping {
    pub(crate) class_name: String,
    pub(crate) key_class: Option<String>,
    pub(crate) index_name: String,
    pub(crate) fields: HashMap<String, Field>,
    pub(crate) persistent_fields: BTreeMap<String, String>,
}

impl ElasticsearchMapping {
    pub fn new(class_name: impl Into<String>, index_name: impl Into<String>) -> Self {
        ElasticsearchMapping {
            class_name: class_name.into(),
            index_name: index_name.into(),
            ..Default::default()
        }
    }

    pub fn with_key_class(mut self, key_class: impl Into<String>) -> Self {
        self.key_class = Some(key_class.into());
        self
    }

    /// Registers `field` under `persistent_name`. Returns `false`, leaving the
    /// mapping untouched, if either name is already taken.
    pub fn add_field(&mut self, persistent_name: impl Into<String>, field: Field) -> bool {
        let persistent_name = persistent_name.into();
        if self.persistent_fields.contains_key(&persistent_name)
            || self.fields.contains_key(&field.name)
        {
            return false;
        }
        self.persistent_fields
            .insert(persistent_name, field.name.clone());
        self.fields.insert(field.name.clone(), field);
        true
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn key_class(&self) -> Option<&str> {
        self.key_class.as_deref()
    }

    /// Name of the Elasticsearch index (the collection).
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn fields(&self) -> &HashMap<String, Field> {
        &self.fields
    }

    pub fn field(&self, doc_field: &str) -> Option<&Field> {
        self.fields.get(doc_field)
    }

    pub fn field_for(&self, persistent_name: &str) -> Option<&Field> {
        self.persistent_fields
            .get(persistent_name)
            .and_then(|doc_field| self.fields.get(doc_field))
    }

    /// `(persistent name, document field name)` pairs, sorted by persistent name.
    pub fn persistent_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.persistent_fields
            .iter()
            .map(|(persistent, doc)| (persistent.as_str(), doc.as_str()))
    }
}

/// Every class mapping declared in one mapping file, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MappingFile {
    pub(crate) path: PathBuf,
    pub(crate) mappings: Vec<ElasticsearchMapping>,
}

impl MappingFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mapping_for(&self, class_name: &str) -> Option<&ElasticsearchMapping> {
        self.mappings.iter().find(|m| m.class_name == class_name)
    }

    pub fn mapping_for_index(&self, index_name: &str) -> Option<&ElasticsearchMapping> {
        self.mappings.iter().find(|m| m.index_name == index_name)
    }

    pub fn into_mapping_for(self, class_name: &str) -> Result<ElasticsearchMapping> {
        let MappingFile { path, mappings } = self;
        mappings
            .into_iter()
            .find(|m| m.class_name == class_name)
            .ok_or(MappingError::ClassNotMapped {
                class: class_name.to_string(),
                path,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElasticsearchMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
