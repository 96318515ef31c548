use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::MappingError;

/// Elasticsearch field datatypes a mapping file may declare.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Binary,
    Boolean,
    Keyword,
    ConstantKeyword,
    Wildcard,
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    HalfFloat,
    ScaledFloat,
    Date,
    Object,
    Flattened,
    Nested,
    Text,
}

impl DataType {
    pub const ALL: [DataType; 18] = [
        DataType::Binary,
        DataType::Boolean,
        DataType::Keyword,
        DataType::ConstantKeyword,
        DataType::Wildcard,
        DataType::Long,
        DataType::Integer,
        DataType::Short,
        DataType::Byte,
        DataType::Double,
        DataType::Float,
        DataType::HalfFloat,
        DataType::ScaledFloat,
        DataType::Date,
        DataType::Object,
        DataType::Flattened,
        DataType::Nested,
        DataType::Text,
    ];

    /// Token used both in mapping files and in Elasticsearch mappings.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Binary => "binary",
            DataType::Boolean => "boolean",
            DataType::Keyword => "keyword",
            DataType::ConstantKeyword => "constant_keyword",
            DataType::Wildcard => "wildcard",
            DataType::Long => "long",
            DataType::Integer => "integer",
            DataType::Short => "short",
            DataType::Byte => "byte",
            DataType::Double => "double",
            DataType::Float => "float",
            DataType::HalfFloat => "half_float",
            DataType::ScaledFloat => "scaled_float",
            DataType::Date => "date",
            DataType::Object => "object",
            DataType::Flattened => "flattened",
            DataType::Nested => "nested",
            DataType::Text => "text",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .iter()
            .find(|data_type| data_type.as_str() == s)
            .copied()
            .ok_or_else(|| MappingError::UnknownDataType(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct FieldType {
    pub data_type: DataType,
    /// Only meaningful for `scaled_float`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling_factor: Option<u32>,
}

impl FieldType {
    pub fn new(data_type: DataType) -> Self {
        FieldType {
            data_type,
            scaling_factor: None,
        }
    }

    pub fn scaled_float(scaling_factor: u32) -> Self {
        FieldType {
            data_type: DataType::ScaledFloat,
            scaling_factor: Some(scaling_factor),
        }
    }

    /// Property definition sent to Elasticsearch when creating the index.
    pub fn to_es_mapping(&self) -> Value {
        match self.scaling_factor {
            Some(factor) if self.data_type == DataType::ScaledFloat => json!({
                "type": self.data_type.as_str(),
                "scaling_factor": factor,
            }),
            _ => json!({ "type": self.data_type.as_str() }),
        }
    }
}

impl From<DataType> for FieldType {
    fn from(data_type: DataType) -> Self {
        FieldType::new(data_type)
    }
}

/// A document field and its datatype.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        Field {
            name: name.into(),
            field_type: field_type.into(),
        }
    }

    pub fn data_type(&self) -> DataType {
        self.field_type.data_type
    }
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;

    use super::*;

    #[test]
    fn should_map_every_data_type_to_a_distinct_token() {
        for data_type in DataType::ALL {
            let parsed = data_type.as_str().parse::<DataType>();
            assert_that!(parsed).is_ok().is_equal_to(data_type);
        }
        let mut tokens: Vec<_> = DataType::ALL.iter().map(DataType::as_str).collect();
        tokens.sort_unstable();
        tokens.dedup();
        assert_that!(tokens).has_length(DataType::ALL.len());
    }

    #[test]
    fn should_reject_unknown_tokens() {
        assert_that!("strng".parse::<DataType>())
            .is_err()
            .matches(|err| matches!(err, MappingError::UnknownDataType(t) if t == "strng"));
        // tokens are case sensitive, as in Elasticsearch
        assert_that!("TEXT".parse::<DataType>()).is_err();
    }

    #[test]
    fn should_render_scaling_factor_only_for_scaled_float() {
        assert_that!(FieldType::scaled_float(100).to_es_mapping())
            .is_equal_to(json!({ "type": "scaled_float", "scaling_factor": 100 }));

        let odd = FieldType {
            data_type: DataType::Long,
            scaling_factor: Some(10),
        };
        assert_that!(odd.to_es_mapping()).is_equal_to(json!({ "type": "long" }));
    }

    #[test]
    fn should_compare_fields_structurally() {
        let a = Field::new("salary", DataType::Integer);
        let b = Field::new("salary", FieldType::new(DataType::Integer));
        assert_that!(a).is_equal_to(b);
        assert_that!(Field::new("salary", DataType::Long))
            .is_not_equal_to(Field::new("salary", DataType::Integer));
    }
}
