//! Formula definitions.
//!
//! A formula is an ordered list of conditionally-applicable groups (variants),
//! modelling if / else-if / else branching. Persisted formula data encodes an
//! expression as either a flat operand/operator array or a nested group
//! object; that ambiguity is resolved here, during deserialization, so the
//! evaluator only ever sees the closed [`FormulaExpr`] union.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::field_type::{AggregateOp, BinaryOp, TimeUnit};

/// Ordered list of formula variants; the first whose condition holds wins.
pub type Formula = Vec<FormulaGroup>;

/// One variant of a formula: an optional guard condition plus an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,

    pub items: FormulaExpr,
}

impl FormulaGroup {
    /// An unconditional group around the given expression.
    pub fn unconditional(items: FormulaExpr) -> Self {
        Self {
            condition: None,
            items,
        }
    }
}

/// A formula expression.
///
/// Wire encoding under the `items` key:
/// - `[factorA, "plus", factorB]` — binary operation;
/// - `[factor, "sum"]` — aggregate over a table column;
/// - a nested group object — formula aliasing (the inner condition is
///   ignored by evaluation).
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    Binary {
        factor_a: Factor,
        op: BinaryOp,
        factor_b: Factor,
    },
    Aggregate {
        factor: Factor,
        op: AggregateOp,
    },
    Group(Box<FormulaGroup>),
}

impl Serialize for FormulaExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Binary {
                factor_a,
                op,
                factor_b,
            } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(factor_a)?;
                seq.serialize_element(op)?;
                seq.serialize_element(factor_b)?;
                seq.end()
            }
            Self::Aggregate { factor, op } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(factor)?;
                seq.serialize_element(op)?;
                seq.end()
            }
            Self::Group(group) => group.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FormulaExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        match &json {
            serde_json::Value::Array(items) => match items.as_slice() {
                [factor, op] => Ok(Self::Aggregate {
                    factor: from_json(factor)?,
                    op: from_json(op)?,
                }),
                [factor_a, op, factor_b] => Ok(Self::Binary {
                    factor_a: from_json(factor_a)?,
                    op: from_json(op)?,
                    factor_b: from_json(factor_b)?,
                }),
                _ => Err(de::Error::custom(format!(
                    "formula items array must have 2 or 3 elements, got {}",
                    items.len()
                ))),
            },
            serde_json::Value::Object(_) => Ok(Self::Group(Box::new(from_json(&json)?))),
            other => Err(de::Error::custom(format!(
                "formula items must be an array or group object, got {other}"
            ))),
        }
    }
}

fn from_json<'de, T: serde::de::DeserializeOwned, E: de::Error>(
    json: &serde_json::Value,
) -> Result<T, E> {
    serde_json::from_value(json.clone()).map_err(de::Error::custom)
}

/// An operand of a formula operation: a field reference or a constant.
///
/// The wire marks constants with `fieldId: "Constant"` (legacy data may use
/// `fieldType` instead). `unit` and `includeEndDate` only take effect when
/// the other factor of a binary operation is temporal.
#[derive(Debug, Clone, PartialEq)]
pub enum Factor {
    Field {
        field_id: Option<String>,
        /// Fallback lookup key, used only when `field_id` is absent.
        field_name: Option<String>,
        unit: Option<TimeUnit>,
        include_end_date: bool,
    },
    Constant {
        value: f64,
        unit: Option<TimeUnit>,
        include_end_date: bool,
    },
}

impl Factor {
    pub fn field(id: impl Into<String>) -> Self {
        Self::Field {
            field_id: Some(id.into()),
            field_name: None,
            unit: None,
            include_end_date: false,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::Constant {
            value,
            unit: None,
            include_end_date: false,
        }
    }

    /// The unit this factor applies when the other factor is temporal.
    pub fn unit(&self) -> Option<TimeUnit> {
        match self {
            Self::Constant { unit, .. } | Self::Field { unit, .. } => *unit,
        }
    }

    /// Whether date-difference results should count the end date.
    pub fn include_end_date(&self) -> bool {
        match self {
            Self::Constant {
                include_end_date, ..
            }
            | Self::Field {
                include_end_date, ..
            } => *include_end_date,
        }
    }
}

const CONSTANT_TAG: &str = "Constant";

fn is_false(b: &bool) -> bool {
    !b
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct FactorWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    field_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    constant: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<TimeUnit>,
    #[serde(skip_serializing_if = "is_false")]
    include_end_date: bool,
}

impl Serialize for Factor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Field {
                field_id,
                field_name,
                unit,
                include_end_date,
            } => FactorWire {
                field_id: field_id.clone(),
                field_name: field_name.clone(),
                unit: *unit,
                include_end_date: *include_end_date,
                ..FactorWire::default()
            },
            Self::Constant {
                value,
                unit,
                include_end_date,
            } => FactorWire {
                field_id: Some(CONSTANT_TAG.to_owned()),
                constant: Some(*value),
                unit: *unit,
                include_end_date: *include_end_date,
                ..FactorWire::default()
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Factor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = FactorWire::deserialize(deserializer)?;
        let tagged_constant = wire.field_id.as_deref() == Some(CONSTANT_TAG)
            || wire.field_type.as_deref() == Some(CONSTANT_TAG);
        if tagged_constant || (wire.field_id.is_none() && wire.constant.is_some()) {
            Ok(Self::Constant {
                value: wire.constant.unwrap_or(0.0),
                unit: wire.unit,
                include_end_date: wire.include_end_date,
            })
        } else {
            Ok(Self::Field {
                field_id: wire.field_id,
                field_name: wire.field_name,
                unit: wire.unit,
                include_end_date: wire.include_end_date,
            })
        }
    }
}
