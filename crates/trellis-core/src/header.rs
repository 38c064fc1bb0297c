//! Header -- the schema definition of one field.

use serde::{Deserialize, Serialize};

use crate::field_type::{DateType, FieldType};
use crate::formula::Formula;

/// Schema definition for one field of a workflow.
///
/// Ids are unique within a schema; within one Table's sub-headers ids are
/// unique but may coincide with ids used elsewhere, so callers disambiguate
/// by table context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Header {
    pub id: String,

    /// Display name; unique within a schema, used as a secondary lookup key.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub field_name: String,

    pub field_type: FieldType,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_multi: bool,

    #[serde(skip_serializing_if = "HeaderConfig::is_empty")]
    pub config: HeaderConfig,

    /// Column definitions; present only when `field_type` is Table.
    /// Sub-headers are never themselves of type Table.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_headers: Vec<Header>,
}

impl Header {
    /// The sub-header with the given id, if this is a Table header.
    pub fn sub_header(&self, id: &str) -> Option<&Header> {
        self.sub_headers.iter().find(|sh| sh.id == id)
    }

    /// The DateTime granularity, defaulting when unconfigured.
    pub fn date_type(&self) -> DateType {
        self.config.date_type.unwrap_or_default()
    }
}

/// Type-specific field configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderConfig {
    /// DateTime fields: display/comparison granularity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_type: Option<DateType>,

    /// Formula fields: the formula definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<Formula>,

    /// Set fields: selectable options.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SetOption>,

    /// Set fields: whether free-text values outside the options are allowed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_other: bool,

    /// AutoId fields: configured prefixes with their pad widths.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub auto_id_prefixes: Vec<AutoIdPrefix>,
}

impl HeaderConfig {
    fn is_empty(&self) -> bool {
        self.date_type.is_none()
            && self.formula.is_none()
            && self.options.is_empty()
            && !self.allow_other
            && self.auto_id_prefixes.is_empty()
    }

    /// The display label of a Set option by its id.
    pub fn option_label(&self, option_id: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.id == option_id)
            .map(|o| o.value.as_str())
    }
}

/// One selectable option of a Set field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetOption {
    pub id: String,
    /// Display label.
    pub value: String,
}

/// One configured AutoId prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoIdPrefix {
    pub prefix: String,
    /// Zero-pad the running number to this many digits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digit: Option<usize>,
}
