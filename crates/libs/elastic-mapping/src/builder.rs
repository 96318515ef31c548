use std::borrow::Cow;
use std::path::Path;

use roxmltree::{Document, Node};
use tracing::{debug, warn};

use crate::errors::{MappingError, Result};
use crate::field::{DataType, Field, FieldType};
use crate::mapping::{ElasticsearchMapping, MappingFile};
use crate::schema::{self, Violation, CLASS_ELEMENT, FIELD_ELEMENT, ROOT_ELEMENT};

/// How much of the mapping grammar is enforced before parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Validation {
    /// Reject any file breaking the grammar described in [`crate::schema`].
    Strict,
    /// Keep whatever can be interpreted, skipping the rest.
    #[default]
    Lenient,
}

impl From<bool> for Validation {
    fn from(validate: bool) -> Self {
        if validate {
            Validation::Strict
        } else {
            Validation::Lenient
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MappingBuilder {
    validation: Validation,
}

impl MappingBuilder {
    pub fn new(validation: Validation) -> Self {
        MappingBuilder { validation }
    }

    pub fn validation(&self) -> Validation {
        self.validation
    }

    #[tracing::instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn read(&self, path: impl AsRef<Path>) -> Result<MappingFile> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| MappingError::MappingNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let content = decode(&bytes).map_err(|violation| MappingError::MalformedMapping {
            path: path.to_path_buf(),
            violation,
        })?;
        self.parse(path, &content)
    }

    /// Parses `content`, `path` only being used to report errors.
    pub fn parse(&self, path: &Path, content: &str) -> Result<MappingFile> {
        let malformed = |violation: Violation| MappingError::MalformedMapping {
            path: path.to_path_buf(),
            violation,
        };

        let doc = Document::parse(content).map_err(|err| malformed(Violation::not_well_formed(&err)))?;

        if self.validation == Validation::Strict {
            schema::validate(&doc).map_err(malformed)?;
        }

        let root = doc.root_element();
        if root.tag_name().name() != ROOT_ELEMENT {
            warn!(
                "unexpected root element <{}> in {}, looking for classes anyway",
                root.tag_name().name(),
                path.display()
            );
        }

        let mut mappings: Vec<ElasticsearchMapping> = Vec::new();
        for node in root.children().filter(Node::is_element) {
            if node.tag_name().name() != CLASS_ELEMENT {
                warn!("skipping unknown element <{}>", node.tag_name().name());
                continue;
            }
            let Some(mapping) = parse_class(node) else {
                continue;
            };
            if mappings.iter().any(|m| m.class_name == mapping.class_name) {
                warn!("skipping second declaration of class '{}'", mapping.class_name);
                continue;
            }
            debug!(
                "mapped class '{}' to index '{}' with {} fields",
                mapping.class_name,
                mapping.index_name,
                mapping.fields.len()
            );
            mappings.push(mapping);
        }

        Ok(MappingFile {
            path: path.to_path_buf(),
            mappings,
        })
    }
}

/// Reads a mapping file, checking it against the grammar first if `validate` is set.
pub fn load(path: impl AsRef<Path>, validate: bool) -> Result<MappingFile> {
    MappingBuilder::new(validate.into()).read(path)
}

/// Reads the mapping of a single class.
pub fn load_class(
    path: impl AsRef<Path>,
    class_name: &str,
    validate: bool,
) -> Result<ElasticsearchMapping> {
    load(path, validate)?.into_mapping_for(class_name)
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes a mapping file according to its XML declaration. UTF-8 is assumed
/// when no encoding is declared.
fn decode(bytes: &[u8]) -> std::result::Result<Cow<'_, str>, Violation> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let encoding = declared_encoding(bytes).unwrap_or_else(|| String::from("UTF-8"));

    match encoding.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|err| Violation::invalid_encoding(bytes, err.valid_up_to(), &encoding)),
        // Latin-1 code points are the byte values.
        "iso-8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "l1" => {
            Ok(Cow::Owned(bytes.iter().copied().map(char::from).collect()))
        }
        _ => Err(Violation::unsupported_encoding(&encoding)),
    }
}

/// `encoding` pseudo-attribute of the `<?xml ...?>` declaration, if any.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let rest = bytes.strip_prefix(b"<?xml")?;
    let end = rest.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&rest[..end]).ok()?;

    let value = decl.split_once("encoding")?.1.trim_start();
    let value = value.strip_prefix('=')?.trim_start();
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &value[1..];
    value.find(quote).map(|end| value[..end].to_string())
}

fn non_empty<'a>(node: Node<'a, '_>, attr: &str) -> Option<&'a str> {
    node.attribute(attr)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_class(node: Node) -> Option<ElasticsearchMapping> {
    let Some(class_name) = non_empty(node, "name") else {
        warn!("skipping class without a name");
        return None;
    };
    let Some(index_name) = non_empty(node, "index") else {
        warn!("skipping class '{class_name}' without an index");
        return None;
    };

    let mut mapping = ElasticsearchMapping::new(class_name, index_name);
    if let Some(key_class) = non_empty(node, "keyClass") {
        mapping = mapping.with_key_class(key_class);
    }

    for field in node.children().filter(Node::is_element) {
        if field.tag_name().name() != FIELD_ELEMENT {
            warn!(
                "skipping unknown element <{}> in class '{class_name}'",
                field.tag_name().name()
            );
            continue;
        }
        let Some((name, field)) = parse_field(class_name, field) else {
            continue;
        };
        if !mapping.add_field(name, field) {
            warn!("skipping duplicate field '{name}' in class '{class_name}'");
        }
    }

    Some(mapping)
}

fn parse_field<'a>(class_name: &str, node: Node<'a, '_>) -> Option<(&'a str, Field)> {
    let Some(name) = non_empty(node, "name") else {
        warn!("skipping field without a name in class '{class_name}'");
        return None;
    };
    let Some(token) = non_empty(node, "type") else {
        warn!("skipping field '{name}' without a type in class '{class_name}'");
        return None;
    };
    let data_type = match token.parse::<DataType>() {
        Ok(data_type) => data_type,
        Err(err) => {
            warn!("skipping field '{name}' in class '{class_name}': {err}");
            return None;
        }
    };

    let field_type = if data_type == DataType::ScaledFloat {
        match node
            .attribute("scalingFactor")
            .and_then(schema::parse_scaling_factor)
        {
            Some(factor) => FieldType::scaled_float(factor),
            None => {
                warn!("skipping scaled_float field '{name}' without a valid scalingFactor");
                return None;
            }
        }
    } else {
        FieldType::new(data_type)
    };

    let doc_field = non_empty(node, "docfield").unwrap_or(name);
    Some((name, Field::new(doc_field, field_type)))
}
