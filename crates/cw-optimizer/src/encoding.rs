//! Numeric encoding of heterogeneous fields.
//!
//! Box-constrained optimizers only see continuous vectors. [`NumericEncoder`]
//! maps each field onto a closed numeric interval and back, and produces the
//! representative value sets used by grid and random sampling.

use cw_types::{CwError, CwResult, FieldDef, FieldKind, FieldValue};
use rand::seq::SliceRandom;
use rand::Rng;

pub use cw_types::FLOAT_EPSILON;

/// Stateless encoder between typed field values and numeric surrogates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericEncoder;

impl NumericEncoder {
    /// Inclusive `(min, max)` of an integer or float field.
    pub fn bounds(field: &FieldDef) -> CwResult<(f64, f64)> {
        if !field.kind.is_numeric() {
            return Err(CwError::invalid_field(
                &field.name,
                format!("{} field has no numeric bounds", field.kind.name()),
            ));
        }
        numeric_bounds(&field.kind)
            .ok_or_else(|| CwError::invalid_field(&field.name, "numeric range is empty"))
    }

    /// Interval searched by box-constrained optimizers for this field.
    pub fn numeric_domain(field: &FieldDef) -> CwResult<(f64, f64)> {
        match &field.kind {
            FieldKind::Boolean => Ok((0.0, 1.0)),
            FieldKind::Categorical { values } if !values.is_empty() => {
                Ok((0.0, (values.len() - 1) as f64))
            }
            FieldKind::Categorical { .. } => Err(CwError::invalid_field(
                &field.name,
                "categorical field declares no values",
            )),
            FieldKind::Integer { .. } | FieldKind::Float { .. } => Self::bounds(field),
        }
    }

    /// Point at fraction `t` of `[lo, hi]`, kept inside the interval.
    ///
    /// Finite for any finite bounds, even when `hi - lo` overflows.
    pub fn interpolate(lo: f64, hi: f64, t: f64) -> f64 {
        clamp(lo * (1.0 - t) + hi * t, lo, hi)
    }

    /// Fraction of `[lo, hi]` at which `v` lies, in `[0, 1]`. A degenerate
    /// interval maps everything to its midpoint.
    pub fn unit_position(lo: f64, hi: f64, v: f64) -> f64 {
        if hi <= lo {
            return 0.5;
        }
        let span = hi - lo;
        let t = if span.is_finite() {
            (v - lo) / span
        } else {
            (v * 0.5 - lo * 0.5) / (hi * 0.5 - lo * 0.5)
        };
        clamp(t, 0.0, 1.0)
    }

    /// Up to `k` values spanning the field's domain.
    ///
    /// Numeric fields get evenly spaced samples (deduplicated, since integer
    /// spacing collides on narrow ranges); boolean and categorical fields get
    /// a random sample of at most `k` of their values.
    pub fn representative_values<R: Rng + ?Sized>(
        field: &FieldDef,
        k: usize,
        rng: &mut R,
    ) -> CwResult<Vec<FieldValue>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let values = match &field.kind {
            FieldKind::Integer { .. } => {
                let (lo, hi) = field
                    .kind
                    .integer_range()
                    .ok_or_else(|| CwError::invalid_field(&field.name, "numeric range is empty"))?;
                let mut out: Vec<FieldValue> = Vec::with_capacity(k);
                for x in linspace(lo as f64, hi as f64, k) {
                    let v = FieldValue::Int((x as i64).clamp(lo, hi));
                    if !out.contains(&v) {
                        out.push(v);
                    }
                }
                out
            }
            FieldKind::Float { .. } => {
                let (lo, hi) = Self::bounds(field)?;
                let mut out: Vec<FieldValue> = Vec::with_capacity(k);
                for x in linspace(lo, hi, k) {
                    let v = FieldValue::Float(x);
                    if !out.contains(&v) {
                        out.push(v);
                    }
                }
                out
            }
            FieldKind::Boolean => [false, true]
                .choose_multiple(rng, k.min(2))
                .map(|b| FieldValue::Bool(*b))
                .collect(),
            FieldKind::Categorical { values } => values
                .choose_multiple(rng, k.min(values.len()))
                .map(|v| FieldValue::Choice(v.clone()))
                .collect(),
        };
        Ok(values)
    }

    /// Map a numeric surrogate back onto the field's native domain.
    ///
    /// Never fails: out-of-range inputs are clamped to the nearest boundary
    /// and NaN maps to the lower end of the domain.
    pub fn decode(field: &FieldDef, x: f64) -> FieldValue {
        match &field.kind {
            FieldKind::Float { .. } => {
                let (lo, hi) = field.kind.float_range().unwrap_or((0.0, 0.0));
                FieldValue::Float(clamp(x, lo, hi))
            }
            FieldKind::Integer { .. } => {
                let (lo, hi) = field.kind.integer_range().unwrap_or((0, 0));
                FieldValue::Int(clamp_int(x, lo, hi))
            }
            FieldKind::Boolean => FieldValue::Bool(clamp(x, 0.0, 1.0).round() != 0.0),
            FieldKind::Categorical { values } => {
                let last = values.len().saturating_sub(1);
                let index = clamp(x.round(), 0.0, last as f64) as usize;
                values
                    .get(index)
                    .cloned()
                    .map(FieldValue::Choice)
                    .unwrap_or(FieldValue::Choice(serde_json::Value::Null))
            }
        }
    }

    /// Numeric surrogate of a native value; `None` if it does not belong to
    /// the field.
    pub fn encode(field: &FieldDef, value: &FieldValue) -> Option<f64> {
        match (&field.kind, value) {
            (FieldKind::Float { .. }, v) => v.as_float(),
            (FieldKind::Integer { .. }, FieldValue::Int(v)) => Some(*v as f64),
            (FieldKind::Boolean, FieldValue::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            (FieldKind::Categorical { values }, v) => {
                let json = v.to_json();
                values.iter().position(|c| *c == json).map(|i| i as f64)
            }
            _ => None,
        }
    }
}

fn numeric_bounds(kind: &FieldKind) -> Option<(f64, f64)> {
    match kind {
        FieldKind::Integer { .. } => kind.integer_range().map(|(lo, hi)| (lo as f64, hi as f64)),
        FieldKind::Float { .. } => kind.float_range(),
        FieldKind::Boolean | FieldKind::Categorical { .. } => None,
    }
}

fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        return lo;
    }
    x.max(lo).min(hi)
}

/// Round `x` to the nearest integer in `[lo, hi]`. The comparison happens in
/// i64 since the float images of `lo` and `hi` may round past them.
fn clamp_int(x: f64, lo: i64, hi: i64) -> i64 {
    if x.is_nan() {
        return lo;
    }
    let r = x.round();
    if r <= lo as f64 {
        lo
    } else if r >= hi as f64 {
        hi
    } else {
        (r as i64).clamp(lo, hi)
    }
}

/// `n` evenly spaced points from `lo` to `hi` inclusive; a single point is `lo`.
fn linspace(lo: f64, hi: f64, n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(move |i| {
        if n == 1 {
            lo
        } else if i == n - 1 {
            hi
        } else {
            NumericEncoder::interpolate(lo, hi, i as f64 / (n - 1) as f64)
        }
    })
}
