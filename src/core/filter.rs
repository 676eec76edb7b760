//! Predicate builder for datapoint queries.
//!
//! Channel names are the only user text that reaches the statement, and
//! only as identifiers. Every comparison value is a bound parameter.

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value};
use std::fmt;

/// A comparison operand bound as a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Integer(v) => write!(f, "{}", v),
            FilterValue::Real(v) => write!(f, "{}", v),
            FilterValue::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
        }
    }
}

impl ToSql for FilterValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FilterValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            FilterValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            FilterValue::Text(v) => ToSqlOutput::Owned(Value::Text(v.clone())),
        })
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Integer(v as i64)
    }
}
impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Integer(v)
    }
}
impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Real(v)
    }
}
impl From<f32> for FilterValue {
    fn from(v: f32) -> Self {
        FilterValue::Real(v as f64)
    }
}
impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}
impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Neq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl Comparison {
    pub fn sql(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Neq => "!=",
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::LtEq => "<=",
            Comparison::GtEq => ">=",
        }
    }

    /// Parse an operator token: `= == != <> < > <= >=` or the builder names.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "=" | "==" | "eq" => Some(Comparison::Eq),
            "!=" | "<>" | "neq" => Some(Comparison::Neq),
            "<" | "lt" => Some(Comparison::Lt),
            ">" | "gt" => Some(Comparison::Gt),
            "<=" | "lteq" => Some(Comparison::LtEq),
            ">=" | "gteq" => Some(Comparison::GtEq),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn sql(&self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

/// Render a channel as a `datapoint` column reference. Plain identifiers
/// stay bare; anything else is quoted.
fn column_ref(channel: &str) -> String {
    let trimmed = channel.trim();
    let mut chars = trimmed.chars();
    let plain = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if plain {
        format!("datapoint.{}", trimmed)
    } else {
        format!("datapoint.{}", crate::utils::sql::quote_ident(trimmed))
    }
}

/// Conjunctive/disjunctive predicate over channels.
///
/// `and_()` / `or_()` set the combinator used for the *next* appended
/// predicate; they never rewrite what is already there.
///
/// ```
/// use telemstore::core::filter::Filter;
///
/// let f = Filter::new()
///     .lt("LapCount", 1)
///     .group(Filter::new().gt("Coolant", 212).or_().gt("RPM", 9000));
/// assert_eq!(f.to_string(), "datapoint.LapCount < ? AND (datapoint.Coolant > ? OR datapoint.RPM > ?)");
/// assert_eq!(f.params().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Filter {
    expr: String,
    comb: Combinator,
    channels: Vec<String>,
    params: Vec<FilterValue>,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter {
    pub fn new() -> Self {
        Self {
            expr: String::new(),
            comb: Combinator::And,
            channels: Vec::new(),
            params: Vec::new(),
        }
    }

    fn push_combinator(&mut self) {
        if !self.expr.is_empty() {
            self.expr.push(' ');
            self.expr.push_str(self.comb.sql());
            self.expr.push(' ');
        }
    }

    /// Append `datapoint.<channel> <op> ?` with `value` bound.
    pub fn compare(mut self, channel: &str, op: Comparison, value: impl Into<FilterValue>) -> Self {
        self.push_combinator();
        self.channels.push(channel.trim().to_string());
        self.expr.push_str(&format!("{} {} ?", column_ref(channel), op.sql()));
        self.params.push(value.into());
        self
    }

    pub fn eq(self, channel: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(channel, Comparison::Eq, value)
    }

    pub fn neq(self, channel: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(channel, Comparison::Neq, value)
    }

    pub fn lt(self, channel: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(channel, Comparison::Lt, value)
    }

    pub fn gt(self, channel: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(channel, Comparison::Gt, value)
    }

    pub fn lteq(self, channel: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(channel, Comparison::LtEq, value)
    }

    pub fn gteq(self, channel: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(channel, Comparison::GtEq, value)
    }

    pub fn and_(mut self) -> Self {
        self.comb = Combinator::And;
        self
    }

    pub fn or_(mut self) -> Self {
        self.comb = Combinator::Or;
        self
    }

    /// Parenthesize `other` and append it; its parameters follow ours.
    pub fn group(mut self, other: Filter) -> Self {
        self.push_combinator();
        self.expr.push('(');
        self.expr.push_str(other.expr.trim());
        self.expr.push(')');
        self.channels.extend(other.channels);
        self.params.extend(other.params);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_empty()
    }

    /// Channels referenced, in the order they were added.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Bound values, in placeholder order.
    pub fn params(&self) -> &[FilterValue] {
        &self.params
    }

    /// Human-readable form with the values spliced in. For logs and
    /// `--explain` output only; never executed.
    pub fn describe(&self) -> String {
        let mut out = String::with_capacity(self.expr.len());
        let mut params = self.params.iter();
        for c in self.expr.chars() {
            if c != '?' {
                out.push(c);
                continue;
            }
            match params.next() {
                Some(p) => out.push_str(&p.to_string()),
                None => out.push('?'),
            }
        }
        out
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_filter() {
        let f = Filter::new().lt("LapCount", 1);
        assert_eq!(f.to_string(), "datapoint.LapCount < ?");
        assert_eq!(f.params(), &[FilterValue::Integer(1)]);
        assert_eq!(f.describe(), "datapoint.LapCount < 1");
    }

    #[test]
    fn not_equal_filter() {
        let f = Filter::new().neq("LapCount", 1);
        assert_eq!(f.to_string(), "datapoint.LapCount != ?");
        assert_eq!(f.params(), &[FilterValue::Integer(1)]);
    }

    #[test]
    fn chained_filter_defaults_to_and() {
        let f = Filter::new()
            .lt("LapCount", 1)
            .gt("Coolant", 212)
            .or_()
            .eq("RPM", 9001);
        assert_eq!(
            f.to_string(),
            "datapoint.LapCount < ? AND datapoint.Coolant > ? OR datapoint.RPM = ?"
        );
        assert_eq!(
            f.params(),
            &[
                FilterValue::Integer(1),
                FilterValue::Integer(212),
                FilterValue::Integer(9001)
            ]
        );
    }

    #[test]
    fn combinator_is_not_retroactive() {
        let f = Filter::new().gt("A", 1).or_().gt("B", 2).and_().gt("C", 3);
        assert_eq!(
            f.to_string(),
            "datapoint.A > ? OR datapoint.B > ? AND datapoint.C > ?"
        );
    }

    #[test]
    fn grouped_filter() {
        let f = Filter::new()
            .lt("LapCount", 1)
            .group(Filter::new().gt("Coolant", 212).or_().gt("RPM", 9000));
        assert_eq!(
            f.to_string(),
            "datapoint.LapCount < ? AND (datapoint.Coolant > ? OR datapoint.RPM > ?)"
        );
        assert_eq!(
            f.params(),
            &[
                FilterValue::Integer(1),
                FilterValue::Integer(212),
                FilterValue::Integer(9000)
            ]
        );
        assert_eq!(f.channels(), &["LapCount", "Coolant", "RPM"]);
    }

    #[test]
    fn odd_channel_names_are_quoted_not_spliced() {
        let f = Filter::new().gteq("Oil Temp", 90.5).lteq("x\" OR 1=1 --", 2);
        assert_eq!(
            f.to_string(),
            "datapoint.\"Oil Temp\" >= ? AND datapoint.\"x OR 1=1 --\" <= ?"
        );
    }

    #[test]
    fn text_values_stay_bound() {
        let f = Filter::new().eq("Name", "'; DROP TABLE session; --");
        assert_eq!(f.to_string(), "datapoint.Name = ?");
        assert_eq!(f.describe(), "datapoint.Name = '''; DROP TABLE session; --'");
    }

    #[test]
    fn operator_tokens() {
        assert_eq!(Comparison::parse(">="), Some(Comparison::GtEq));
        assert_eq!(Comparison::parse("neq"), Some(Comparison::Neq));
        assert_eq!(Comparison::parse("~"), None);
    }
}
