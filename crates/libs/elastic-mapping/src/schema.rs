//! Grammar of mapping files, enforced in strict mode.
//!
//! ```text
//! gora-otd          one or more <class>
//!   class           name, keyClass, index          zero or more <field>
//!     field         name, docfield, type [, scalingFactor]
//! ```
//!
//! `type` must be a known datatype token. `scalingFactor` is a positive
//! integer, present if and only if `type` is `scaled_float`. Class names are
//! unique in a file, field and docfield names are unique in a class, once
//! surrounding whitespace is trimmed.

use std::collections::HashSet;
use std::fmt;

use roxmltree::{Document, Node};

use crate::field::DataType;

pub const ROOT_ELEMENT: &str = "gora-otd";
pub const CLASS_ELEMENT: &str = "class";
pub const FIELD_ELEMENT: &str = "field";

struct ElementRule {
    name: &'static str,
    required: &'static [&'static str],
    optional: &'static [&'static str],
    child: Option<&'static str>,
}

const ROOT_RULE: ElementRule = ElementRule {
    name: ROOT_ELEMENT,
    required: &[],
    optional: &[],
    child: Some(CLASS_ELEMENT),
};

const CLASS_RULE: ElementRule = ElementRule {
    name: CLASS_ELEMENT,
    required: &["name", "keyClass", "index"],
    optional: &[],
    child: Some(FIELD_ELEMENT),
};

const FIELD_RULE: ElementRule = ElementRule {
    name: FIELD_ELEMENT,
    required: &["name", "docfield", "type"],
    optional: &["scalingFactor"],
    child: None,
};

/// 1-based position in the mapping file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    NotWellFormed(String),
    InvalidEncoding(String),
    UnsupportedEncoding(String),
    UnexpectedRoot { found: String },
    UnexpectedElement { parent: String, found: String },
    UnexpectedText,
    MissingAttribute(&'static str),
    EmptyAttribute(&'static str),
    UnknownAttribute(String),
    InvalidType(String),
    InvalidScalingFactor(String),
    MissingScalingFactor,
    UnexpectedScalingFactor,
    NoClass,
    DuplicateClass(String),
    DuplicateField(String),
    DuplicateDocField(String),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::NotWellFormed(details) => write!(f, "not well-formed XML: {details}"),
            Constraint::InvalidEncoding(encoding) => {
                write!(f, "content is not valid {encoding}")
            }
            Constraint::UnsupportedEncoding(encoding) => {
                write!(f, "unsupported encoding '{encoding}'")
            }
            Constraint::UnexpectedRoot { found } => {
                write!(f, "root element must be <{ROOT_ELEMENT}>, found <{found}>")
            }
            Constraint::UnexpectedElement { parent, found } => {
                write!(f, "element <{found}> is not allowed in <{parent}>")
            }
            Constraint::UnexpectedText => write!(f, "text content is not allowed"),
            Constraint::MissingAttribute(attr) => write!(f, "missing required attribute '{attr}'"),
            Constraint::EmptyAttribute(attr) => write!(f, "attribute '{attr}' must not be empty"),
            Constraint::UnknownAttribute(attr) => write!(f, "unknown attribute '{attr}'"),
            Constraint::InvalidType(token) => write!(f, "unknown field type '{token}'"),
            Constraint::InvalidScalingFactor(value) => {
                write!(f, "scalingFactor '{value}' is not a positive integer")
            }
            Constraint::MissingScalingFactor => {
                write!(f, "type 'scaled_float' requires a scalingFactor")
            }
            Constraint::UnexpectedScalingFactor => {
                write!(f, "scalingFactor is only allowed with type 'scaled_float'")
            }
            Constraint::NoClass => write!(f, "at least one <{CLASS_ELEMENT}> is required"),
            Constraint::DuplicateClass(name) => write!(f, "class '{name}' is declared twice"),
            Constraint::DuplicateField(name) => write!(f, "field '{name}' is declared twice"),
            Constraint::DuplicateDocField(name) => {
                write!(f, "docfield '{name}' is declared twice")
            }
        }
    }
}

/// A broken grammar rule: which element, which rule, where.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub element: String,
    pub constraint: Constraint,
    pub position: Position,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}> at {}: {}",
            self.element, self.position, self.constraint
        )
    }
}

impl Violation {
    fn at(doc: &Document, node: Node, constraint: Constraint) -> Self {
        let pos = doc.text_pos_at(node.range().start);
        Violation {
            element: node.tag_name().name().to_string(),
            constraint,
            position: Position {
                line: pos.row,
                column: pos.col,
            },
        }
    }

    pub(crate) fn not_well_formed(err: &roxmltree::Error) -> Self {
        let pos = err.pos();
        Violation {
            element: String::from("?"),
            constraint: Constraint::NotWellFormed(err.to_string()),
            position: Position {
                line: pos.row,
                column: pos.col,
            },
        }
    }

    /// `offset` is the first byte that could not be decoded.
    pub(crate) fn invalid_encoding(bytes: &[u8], offset: usize, encoding: &str) -> Self {
        let before = &bytes[..offset.min(bytes.len())];
        let line_start = before
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |newline| newline + 1);
        let line = before.iter().filter(|b| **b == b'\n').count() + 1;
        Violation {
            element: String::from("?"),
            constraint: Constraint::InvalidEncoding(encoding.to_string()),
            position: Position {
                line: u32::try_from(line).unwrap_or(u32::MAX),
                column: u32::try_from(before.len() - line_start + 1).unwrap_or(u32::MAX),
            },
        }
    }

    pub(crate) fn unsupported_encoding(encoding: &str) -> Self {
        Violation {
            element: String::from("?xml"),
            constraint: Constraint::UnsupportedEncoding(encoding.to_string()),
            position: Position { line: 1, column: 1 },
        }
    }
}

/// Checks a parsed mapping file against the grammar, stopping at the first
/// violation found.
pub fn validate(doc: &Document) -> Result<(), Violation> {
    let root = doc.root_element();
    if root.tag_name().name() != ROOT_RULE.name {
        return Err(Violation::at(
            doc,
            root,
            Constraint::UnexpectedRoot {
                found: root.tag_name().name().to_string(),
            },
        ));
    }
    check_element(doc, root, &ROOT_RULE)?;

    let mut class_names = HashSet::new();
    for class in elements(root) {
        expect_child(doc, class, &ROOT_RULE)?;
        check_element(doc, class, &CLASS_RULE)?;
        let name = class.attribute("name").unwrap_or_default().trim();
        if !class_names.insert(name) {
            return Err(Violation::at(
                doc,
                class,
                Constraint::DuplicateClass(name.to_string()),
            ));
        }
        check_fields(doc, class)?;
    }

    if class_names.is_empty() {
        return Err(Violation::at(doc, root, Constraint::NoClass));
    }

    Ok(())
}

fn check_fields(doc: &Document, class: Node) -> Result<(), Violation> {
    let mut names = HashSet::new();
    let mut doc_fields = HashSet::new();

    for field in elements(class) {
        expect_child(doc, field, &CLASS_RULE)?;
        check_element(doc, field, &FIELD_RULE)?;

        let name = field.attribute("name").unwrap_or_default().trim();
        if !names.insert(name) {
            return Err(Violation::at(
                doc,
                field,
                Constraint::DuplicateField(name.to_string()),
            ));
        }
        let doc_field = field.attribute("docfield").unwrap_or_default().trim();
        if !doc_fields.insert(doc_field) {
            return Err(Violation::at(
                doc,
                field,
                Constraint::DuplicateDocField(doc_field.to_string()),
            ));
        }

        let token = field.attribute("type").unwrap_or_default();
        let data_type = token
            .parse::<DataType>()
            .map_err(|_| Violation::at(doc, field, Constraint::InvalidType(token.to_string())))?;

        match (data_type, field.attribute("scalingFactor")) {
            (DataType::ScaledFloat, None) => {
                return Err(Violation::at(doc, field, Constraint::MissingScalingFactor))
            }
            (DataType::ScaledFloat, Some(factor)) => {
                if parse_scaling_factor(factor).is_none() {
                    return Err(Violation::at(
                        doc,
                        field,
                        Constraint::InvalidScalingFactor(factor.to_string()),
                    ));
                }
            }
            (_, Some(_)) => {
                return Err(Violation::at(
                    doc,
                    field,
                    Constraint::UnexpectedScalingFactor,
                ))
            }
            (_, None) => {}
        }
    }

    Ok(())
}

fn check_element(doc: &Document, node: Node, rule: &ElementRule) -> Result<(), Violation> {
    for &attr in rule.required {
        match node.attribute(attr) {
            None => return Err(Violation::at(doc, node, Constraint::MissingAttribute(attr))),
            Some(value) if value.trim().is_empty() => {
                return Err(Violation::at(doc, node, Constraint::EmptyAttribute(attr)))
            }
            Some(_) => {}
        }
    }

    // Namespaced attributes (xsi:noNamespaceSchemaLocation, ...) are tolerated.
    if let Some(attr) = node.attributes().find(|attr| {
        attr.namespace().is_none()
            && !rule
                .required
                .iter()
                .chain(rule.optional)
                .any(|known| *known == attr.name())
    }) {
        return Err(Violation::at(
            doc,
            node,
            Constraint::UnknownAttribute(attr.name().to_string()),
        ));
    }

    let has_text = node
        .children()
        .filter(Node::is_text)
        .any(|child| child.text().map_or(false, |text| !text.trim().is_empty()));
    if has_text {
        return Err(Violation::at(doc, node, Constraint::UnexpectedText));
    }

    if rule.child.is_none() {
        if let Some(child) = elements(node).next() {
            expect_child(doc, child, rule)?;
        }
    }

    Ok(())
}

fn expect_child(doc: &Document, child: Node, parent: &ElementRule) -> Result<(), Violation> {
    if Some(child.tag_name().name()) == parent.child {
        Ok(())
    } else {
        Err(Violation::at(
            doc,
            child,
            Constraint::UnexpectedElement {
                parent: parent.name.to_string(),
                found: child.tag_name().name().to_string(),
            },
        ))
    }
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

pub(crate) fn parse_scaling_factor(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|factor| *factor > 0)
}
