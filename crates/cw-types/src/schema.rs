//! Configuration schemas: typed field declarations plus an optional
//! cross-field predicate.
//!
//! A schema is either assembled with the builder methods on [`ConfigSchema`]
//! or declared as data through [`FieldDecl`] (for example loaded from JSON).
//! [`ConfigSchema::validate`] must pass before a schema is used for search;
//! [`ConfigSchema::build`] is the only constructor of [`Configuration`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::config::Configuration;
use crate::errors::{CwError, CwResult, ValidationError};
use crate::value::FieldValue;

/// One side of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericBound<T> {
    Inclusive(T),
    Exclusive(T),
}

impl<T: Copy> NumericBound<T> {
    pub fn value(&self) -> T {
        match self {
            Self::Inclusive(v) | Self::Exclusive(v) => *v,
        }
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self, Self::Exclusive(_))
    }
}

impl<T: Copy + PartialOrd> NumericBound<T> {
    fn admits_from_below(&self, value: T) -> bool {
        match self {
            Self::Inclusive(l) => value >= *l,
            Self::Exclusive(l) => value > *l,
        }
    }

    fn admits_from_above(&self, value: T) -> bool {
        match self {
            Self::Inclusive(u) => value <= *u,
            Self::Exclusive(u) => value < *u,
        }
    }
}

impl<T: std::fmt::Display + Copy> NumericBound<T> {
    fn describe_lower(&self) -> String {
        match self {
            Self::Inclusive(v) => format!(">= {v}"),
            Self::Exclusive(v) => format!("> {v}"),
        }
    }

    fn describe_upper(&self) -> String {
        match self {
            Self::Inclusive(v) => format!("<= {v}"),
            Self::Exclusive(v) => format!("< {v}"),
        }
    }
}

/// Offset used to turn a strict float bound into an inclusive one.
pub const FLOAT_EPSILON: f64 = 1e-10;

/// The primitive kind of a field, with its domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Integer {
        lower: NumericBound<i64>,
        upper: NumericBound<i64>,
    },
    Float {
        lower: NumericBound<f64>,
        upper: NumericBound<f64>,
    },
    Boolean,
    Categorical {
        values: Vec<serde_json::Value>,
    },
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Integer { .. } => "integer",
            Self::Float { .. } => "float",
            Self::Boolean => "boolean",
            Self::Categorical { .. } => "categorical",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer { .. } | Self::Float { .. })
    }

    /// Inclusive `(lo, hi)` of an integer field. Strict bounds move inward by
    /// one. `None` for other kinds, or when the range is empty.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        let Self::Integer { lower, upper } = self else {
            return None;
        };
        let lo = match lower {
            NumericBound::Inclusive(v) => Some(*v),
            NumericBound::Exclusive(v) => v.checked_add(1),
        }?;
        let hi = match upper {
            NumericBound::Inclusive(v) => Some(*v),
            NumericBound::Exclusive(v) => v.checked_sub(1),
        }?;
        (lo <= hi).then_some((lo, hi))
    }

    /// Inclusive `(lo, hi)` of a float field. Strict bounds move inward by
    /// [`FLOAT_EPSILON`], or to the adjacent float when the epsilon is lost to
    /// rounding. `None` for other kinds, non-finite bounds, or an empty range.
    pub fn float_range(&self) -> Option<(f64, f64)> {
        let Self::Float { lower, upper } = self else {
            return None;
        };
        if !lower.value().is_finite() || !upper.value().is_finite() {
            return None;
        }
        let lo = match lower {
            NumericBound::Inclusive(v) => *v,
            NumericBound::Exclusive(v) => step_up(*v),
        };
        let hi = match upper {
            NumericBound::Inclusive(v) => *v,
            NumericBound::Exclusive(v) => step_down(*v),
        };
        (lo <= hi).then_some((lo, hi))
    }
}

/// `v - FLOAT_EPSILON`, or the next representable float below `v` when the
/// epsilon is lost to rounding.
fn step_down(v: f64) -> f64 {
    let stepped = v - FLOAT_EPSILON;
    if stepped < v {
        return stepped;
    }
    if v == 0.0 {
        return -f64::from_bits(1);
    }
    let bits = v.to_bits();
    if v > 0.0 {
        f64::from_bits(bits - 1)
    } else {
        f64::from_bits(bits + 1)
    }
}

fn step_up(v: f64) -> f64 {
    -step_down(-v)
}

/// A single named field of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    /// Check `value` against this field, coercing between integer and float
    /// where the conversion is lossless.
    pub fn check(&self, value: FieldValue) -> Result<FieldValue, ValidationError> {
        match &self.kind {
            FieldKind::Integer { lower, upper } => {
                let v = match value {
                    FieldValue::Int(v) => v,
                    FieldValue::Float(f)
                        if f.is_finite()
                            && f.fract() == 0.0
                            && f >= i64::MIN as f64
                            && f <= i64::MAX as f64 =>
                    {
                        f as i64
                    }
                    other => return Err(self.mismatch(&other)),
                };
                if !lower.admits_from_below(v) {
                    return Err(self.out_of_bounds(v, lower.describe_lower()));
                }
                if !upper.admits_from_above(v) {
                    return Err(self.out_of_bounds(v, upper.describe_upper()));
                }
                Ok(FieldValue::Int(v))
            }
            FieldKind::Float { lower, upper } => {
                let v = match value {
                    FieldValue::Float(f) => f,
                    FieldValue::Int(i) => i as f64,
                    other => return Err(self.mismatch(&other)),
                };
                if !lower.admits_from_below(v) {
                    return Err(self.out_of_bounds(v, lower.describe_lower()));
                }
                if !upper.admits_from_above(v) {
                    return Err(self.out_of_bounds(v, upper.describe_upper()));
                }
                Ok(FieldValue::Float(v))
            }
            FieldKind::Boolean => match value {
                FieldValue::Bool(b) => Ok(FieldValue::Bool(b)),
                other => Err(self.mismatch(&other)),
            },
            FieldKind::Categorical { values } => {
                let json = value.to_json();
                if values.contains(&json) {
                    Ok(FieldValue::Choice(json))
                } else {
                    Err(ValidationError::NotAChoice {
                        field: self.name.clone(),
                        value: json.to_string(),
                    })
                }
            }
        }
    }

    fn mismatch(&self, actual: &FieldValue) -> ValidationError {
        ValidationError::TypeMismatch {
            field: self.name.clone(),
            expected: self.kind.name().to_string(),
            actual: format!("{} {actual}", actual.kind_name()),
        }
    }

    fn out_of_bounds(&self, value: impl std::fmt::Display, bound: String) -> ValidationError {
        ValidationError::OutOfBounds {
            field: self.name.clone(),
            value: value.to_string(),
            bound,
        }
    }

    fn validate(&self) -> CwResult<()> {
        match &self.kind {
            FieldKind::Integer { lower, upper } => match self.kind.integer_range() {
                Some(_) => Ok(()),
                None => Err(CwError::invalid_field(
                    &self.name,
                    format!(
                        "integer range {} and {} is empty",
                        lower.describe_lower(),
                        upper.describe_upper()
                    ),
                )),
            },
            FieldKind::Float { lower, upper } => {
                if !lower.value().is_finite() || !upper.value().is_finite() {
                    return Err(CwError::invalid_field(&self.name, "float bounds must be finite"));
                }
                match self.kind.float_range() {
                    Some(_) => Ok(()),
                    None => Err(CwError::invalid_field(
                        &self.name,
                        format!(
                            "float range {} and {} is empty",
                            lower.describe_lower(),
                            upper.describe_upper()
                        ),
                    )),
                }
            }
            FieldKind::Boolean => Ok(()),
            FieldKind::Categorical { values } => {
                if values.is_empty() {
                    Err(CwError::invalid_field(
                        &self.name,
                        "categorical field declares no values",
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Cross-field predicate evaluated after every field has been set.
pub type Validator = Arc<dyn Fn(&Configuration) -> Result<(), String> + Send + Sync>;

/// Ordered set of typed fields plus an optional cross-field predicate.
#[derive(Clone, Default)]
pub struct ConfigSchema {
    fields: Vec<FieldDef>,
    validator: Option<Validator>,
}

impl std::fmt::Debug for ConfigSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSchema")
            .field("fields", &self.fields)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

impl ConfigSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn add_int(
        self,
        name: impl Into<String>,
        lower: NumericBound<i64>,
        upper: NumericBound<i64>,
    ) -> Self {
        self.add_field(name, FieldKind::Integer { lower, upper })
    }

    /// Integer field over the inclusive range `[low, high]`.
    pub fn add_int_range(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add_int(name, NumericBound::Inclusive(low), NumericBound::Inclusive(high))
    }

    pub fn add_float(
        self,
        name: impl Into<String>,
        lower: NumericBound<f64>,
        upper: NumericBound<f64>,
    ) -> Self {
        self.add_field(name, FieldKind::Float { lower, upper })
    }

    /// Float field over the inclusive range `[low, high]`.
    pub fn add_float_range(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add_float(name, NumericBound::Inclusive(low), NumericBound::Inclusive(high))
    }

    pub fn add_bool(self, name: impl Into<String>) -> Self {
        self.add_field(name, FieldKind::Boolean)
    }

    pub fn add_categorical(self, name: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        self.add_field(name, FieldKind::Categorical { values })
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Configuration) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reject field declarations the search cannot handle.
    pub fn validate(&self) -> CwResult<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(CwError::invalid_field("", "field name must not be empty"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(CwError::invalid_field(&field.name, "field declared twice"));
            }
            field.validate()?;
        }
        Ok(())
    }

    /// Build a [`Configuration`] from raw field values.
    ///
    /// Every declared field must be present, no undeclared field may be
    /// supplied, and the cross-field predicate must hold.
    pub fn build<K, I>(&self, values: I) -> Result<Configuration, ValidationError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        let mut provided: BTreeMap<String, FieldValue> =
            values.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let mut validated = BTreeMap::new();
        for field in &self.fields {
            let value = provided
                .remove(&field.name)
                .ok_or_else(|| ValidationError::MissingField {
                    field: field.name.clone(),
                })?;
            validated.insert(field.name.clone(), field.check(value)?);
        }

        if let Some(name) = provided.into_keys().next() {
            return Err(ValidationError::UnknownField { field: name });
        }

        let config = Configuration::from_validated(validated);
        if let Some(validator) = &self.validator {
            validator(&config).map_err(|message| ValidationError::Predicate { message })?;
        }
        Ok(config)
    }

    /// Assemble and validate a schema from data declarations.
    pub fn from_declarations(decls: Vec<FieldDecl>) -> CwResult<Self> {
        let fields = decls
            .into_iter()
            .map(FieldDecl::into_field)
            .collect::<CwResult<Vec<_>>>()?;
        let schema = Self {
            fields,
            validator: None,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Parse a JSON array of [`FieldDecl`]s.
    pub fn from_json_str(json: &str) -> CwResult<Self> {
        let decls: Vec<FieldDecl> = serde_json::from_str(json)?;
        Self::from_declarations(decls)
    }
}

/// Data form of a field declaration, mirroring constrained-field syntax
/// (`ge`/`gt` for the lower bound, `le`/`lt` for the upper bound).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub le: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<serde_json::Value>>,
}

impl FieldDecl {
    fn into_field(self) -> CwResult<FieldDef> {
        let kind = match self.kind.as_str() {
            "int" | "integer" => {
                let (lower, upper) = self.float_bounds()?;
                FieldKind::Integer {
                    lower: self.integral(lower)?,
                    upper: self.integral(upper)?,
                }
            }
            "float" => {
                let (lower, upper) = self.float_bounds()?;
                FieldKind::Float { lower, upper }
            }
            "bool" | "boolean" => FieldKind::Boolean,
            "literal" | "categorical" => FieldKind::Categorical {
                values: self.values.clone().unwrap_or_default(),
            },
            other => {
                return Err(CwError::invalid_field(
                    &self.name,
                    format!("unsupported type '{other}', expected one of int, float, bool, literal"),
                ))
            }
        };
        Ok(FieldDef {
            name: self.name,
            kind,
        })
    }

    // Exclusive bounds take precedence when both forms are given.
    fn float_bounds(&self) -> CwResult<(NumericBound<f64>, NumericBound<f64>)> {
        let lower = match (self.gt, self.ge) {
            (Some(v), _) => NumericBound::Exclusive(v),
            (None, Some(v)) => NumericBound::Inclusive(v),
            (None, None) => {
                return Err(CwError::invalid_field(
                    &self.name,
                    "numeric field requires a lower bound (ge or gt)",
                ))
            }
        };
        let upper = match (self.lt, self.le) {
            (Some(v), _) => NumericBound::Exclusive(v),
            (None, Some(v)) => NumericBound::Inclusive(v),
            (None, None) => {
                return Err(CwError::invalid_field(
                    &self.name,
                    "numeric field requires an upper bound (le or lt)",
                ))
            }
        };
        Ok((lower, upper))
    }

    fn integral(&self, bound: NumericBound<f64>) -> CwResult<NumericBound<i64>> {
        // i64::MAX as f64 rounds up to 2^63, so the upper limit is exclusive.
        const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;
        let v = bound.value();
        if !v.is_finite() || v.fract() != 0.0 {
            return Err(CwError::invalid_field(
                &self.name,
                format!("integer bound {v} is not integral"),
            ));
        }
        if v < -I64_LIMIT || v >= I64_LIMIT {
            return Err(CwError::invalid_field(
                &self.name,
                format!("integer bound {v} does not fit in 64 bits"),
            ));
        }
        Ok(match bound {
            NumericBound::Inclusive(_) => NumericBound::Inclusive(v as i64),
            NumericBound::Exclusive(_) => NumericBound::Exclusive(v as i64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn calculator_schema() -> ConfigSchema {
        ConfigSchema::new()
            .add_categorical("calculation_mode", vec![json!("linear"), json!("quadratic")])
            .add_float_range("linear_factor", 0.0, 10.0)
            .add_float(
                "offset",
                NumericBound::Exclusive(0.0),
                NumericBound::Exclusive(10.0),
            )
            .add_int_range("retries", 0, 3)
            .add_bool("use_cache")
            .with_validator(|config| {
                if config.get_str("calculation_mode") == Some("quadratic")
                    && config.get_float("linear_factor") != Some(0.0)
                {
                    return Err("linear factor must be 0 in quadratic mode".into());
                }
                Ok(())
            })
    }

    fn valid_values() -> Vec<(&'static str, FieldValue)> {
        vec![
            ("calculation_mode", FieldValue::from("linear")),
            ("linear_factor", FieldValue::Float(4.0)),
            ("offset", FieldValue::Float(8.0)),
            ("retries", FieldValue::Int(2)),
            ("use_cache", FieldValue::Bool(true)),
        ]
    }

    #[test]
    fn builds_valid_configuration() {
        let schema = calculator_schema();
        schema.validate().unwrap();
        let config = schema.build(valid_values()).unwrap();
        assert_eq!(config.get_str("calculation_mode"), Some("linear"));
        assert_eq!(config.get_int("retries"), Some(2));
        assert_eq!(config.len(), 5);
    }

    #[test]
    fn exclusive_bound_rejects_endpoint() {
        let schema = calculator_schema();
        let mut values = valid_values();
        values[2] = ("offset", FieldValue::Float(10.0));
        match schema.build(values) {
            Err(ValidationError::OutOfBounds { field, .. }) => assert_eq!(field, "offset"),
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
    }

    #[test]
    fn predicate_failure_is_reported() {
        let schema = calculator_schema();
        let mut values = valid_values();
        values[0] = ("calculation_mode", FieldValue::from("quadratic"));
        assert!(matches!(
            schema.build(values),
            Err(ValidationError::Predicate { .. })
        ));
    }

    #[test]
    fn missing_and_unknown_fields_are_rejected() {
        let schema = calculator_schema();
        let mut values = valid_values();
        values.pop();
        assert!(matches!(
            schema.build(values),
            Err(ValidationError::MissingField { ref field }) if field == "use_cache"
        ));

        let mut values = valid_values();
        values.push(("temperature", FieldValue::Float(0.2)));
        assert!(matches!(
            schema.build(values),
            Err(ValidationError::UnknownField { ref field }) if field == "temperature"
        ));
    }

    #[test]
    fn coercion_between_numeric_kinds() {
        let schema = calculator_schema();
        let mut values = valid_values();
        values[1] = ("linear_factor", FieldValue::Int(3));
        values[3] = ("retries", FieldValue::Float(1.0));
        let config = schema.build(values).unwrap();
        assert_eq!(config.get("linear_factor"), Some(&FieldValue::Float(3.0)));
        assert_eq!(config.get("retries"), Some(&FieldValue::Int(1)));

        let mut values = valid_values();
        values[3] = ("retries", FieldValue::Float(1.5));
        assert!(matches!(
            schema.build(values),
            Err(ValidationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn categorical_membership() {
        let schema = calculator_schema();
        let mut values = valid_values();
        values[0] = ("calculation_mode", FieldValue::from("cubic"));
        assert!(matches!(
            schema.build(values),
            Err(ValidationError::NotAChoice { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_ranges() {
        let schema = ConfigSchema::new().add_int(
            "n",
            NumericBound::Exclusive(4),
            NumericBound::Exclusive(5),
        );
        assert!(matches!(
            schema.validate(),
            Err(CwError::InvalidFieldType { ref field, .. }) if field == "n"
        ));

        let schema = ConfigSchema::new().add_categorical("mode", vec![]);
        assert!(schema.validate().is_err());

        let schema = ConfigSchema::new().add_bool("a").add_bool("a");
        assert!(schema.validate().is_err());
    }

    #[test]
    fn validate_rejects_float_ranges_emptied_by_strict_bounds() {
        let narrow = ConfigSchema::new().add_float(
            "x",
            NumericBound::Exclusive(0.0),
            NumericBound::Exclusive(1e-11),
        );
        assert!(matches!(
            narrow.validate(),
            Err(CwError::InvalidFieldType { ref field, .. }) if field == "x"
        ));

        let wide_enough = ConfigSchema::new().add_float(
            "x",
            NumericBound::Exclusive(0.0),
            NumericBound::Exclusive(1e-9),
        );
        assert!(wide_enough.validate().is_ok());
        let (lo, hi) = wide_enough.fields()[0].kind.float_range().unwrap();
        assert!(0.0 < lo && lo <= hi && hi < 1e-9);
    }

    #[test]
    fn integer_range_handles_extreme_strict_bounds() {
        let kind = FieldKind::Integer {
            lower: NumericBound::Inclusive(0),
            upper: NumericBound::Exclusive(i64::MAX),
        };
        assert_eq!(kind.integer_range(), Some((0, i64::MAX - 1)));

        let kind = FieldKind::Integer {
            lower: NumericBound::Exclusive(i64::MIN),
            upper: NumericBound::Inclusive(i64::MAX),
        };
        assert_eq!(kind.integer_range(), Some((i64::MIN + 1, i64::MAX)));

        let kind = FieldKind::Integer {
            lower: NumericBound::Exclusive(i64::MAX),
            upper: NumericBound::Inclusive(i64::MAX),
        };
        assert_eq!(kind.integer_range(), None);
        assert_eq!(FieldKind::Boolean.integer_range(), None);
        assert_eq!(FieldKind::Boolean.float_range(), None);
    }

    #[test]
    fn float_range_steps_past_lost_epsilon() {
        let kind = FieldKind::Float {
            lower: NumericBound::Exclusive(1e20),
            upper: NumericBound::Exclusive(2e20),
        };
        let (lo, hi) = kind.float_range().unwrap();
        assert!(lo > 1e20 && hi < 2e20);
    }

    #[test]
    fn declarations_from_json() {
        let schema = ConfigSchema::from_json_str(
            r#"[
                {"name": "mode", "type": "literal", "values": ["a", "b"]},
                {"name": "factor", "type": "float", "ge": 0, "le": 10},
                {"name": "offset", "type": "float", "gt": 0, "lt": 10},
                {"name": "k", "type": "int", "ge": 1, "lt": 8},
                {"name": "cache", "type": "bool"}
            ]"#,
        )
        .unwrap();
        assert_eq!(schema.len(), 5);
        assert_eq!(
            schema.field("k").unwrap().kind,
            FieldKind::Integer {
                lower: NumericBound::Inclusive(1),
                upper: NumericBound::Exclusive(8),
            }
        );
    }

    #[test]
    fn unsupported_declared_type_is_fatal() {
        let err = ConfigSchema::from_json_str(r#"[{"name": "tags", "type": "list"}]"#).unwrap_err();
        match err {
            CwError::InvalidFieldType { field, reason } => {
                assert_eq!(field, "tags");
                assert!(reason.contains("list"));
            }
            other => panic!("expected InvalidFieldType, got {other:?}"),
        }
    }

    #[test]
    fn integer_declaration_bound_outside_i64_is_fatal() {
        let err = ConfigSchema::from_json_str(
            r#"[{"name": "n", "type": "int", "ge": 0, "le": 1e30}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CwError::InvalidFieldType { ref field, .. } if field == "n"));

        let err = ConfigSchema::from_json_str(
            r#"[{"name": "n", "type": "int", "ge": -1e30, "le": 0}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CwError::InvalidFieldType { .. }));
    }

    #[test]
    fn numeric_declaration_without_bounds_is_fatal() {
        let err = ConfigSchema::from_json_str(r#"[{"name": "x", "type": "float", "ge": 0}]"#)
            .unwrap_err();
        assert!(matches!(err, CwError::InvalidFieldType { .. }));
    }
}
