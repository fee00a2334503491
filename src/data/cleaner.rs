//! Data Cleaner Module
//! Applies the declared column kinds to raw text tables and derives the
//! bucket columns used by the queries.

use crate::data::loader::RawTable;
use crate::data::quality::TableQuality;
use crate::data::schema::{Bucket, ColumnKind, TableSchema};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Derived column '{derived}' needs missing source column '{source_column}'")]
    MissingDerivedSource {
        derived: String,
        source_column: String,
    },
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Strip one currency symbol and all thousands separators, then parse.
/// Anything that is not a finite number afterwards yields `None`.
pub fn clean_currency(raw: &str) -> Option<f64> {
    let stripped = raw.trim().replacen('$', "", 1).replace(',', "");
    let value = stripped.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Exact, case-sensitive `"Yes"` is true; everything else is false.
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw == Some("Yes")
}

/// Integer parse that also accepts whole-number float renderings (`"42.0"`).
pub fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    let v = trimmed.parse::<f64>().ok()?;
    (v.is_finite() && v.fract() == 0.0).then_some(v as i64)
}

pub fn parse_float(raw: &str) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn bucket_age(age: i64) -> i64 {
    age.div_euclid(10) * 10
}

pub fn bucket_credit_score(score: i64) -> i64 {
    score.div_euclid(100) * 100
}

/// Nearest multiple of 10,000, ties to even (45,000 -> 40,000).
pub fn income_bracket(income: f64) -> i64 {
    ((income / 10_000.0).round_ties_even() * 10_000.0) as i64
}

/// A cleaned table: typed columns plus its quality tally.
#[derive(Debug, Clone)]
pub struct CleanTable {
    pub schema: &'static TableSchema,
    pub path: PathBuf,
    pub df: DataFrame,
    pub quality: TableQuality,
}

/// Typed values for one column while the table is being rebuilt.
enum Cleaned {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
    /// Milliseconds since the epoch
    Timestamp(Vec<Option<i64>>),
}

impl Cleaned {
    fn into_column(self, name: &str) -> PolarsResult<Column> {
        let name = PlSmallStr::from(name);
        Ok(match self {
            Cleaned::Int(v) => Column::new(name, v),
            Cleaned::Float(v) => Column::new(name, v),
            Cleaned::Bool(v) => Column::new(name, v),
            Cleaned::Text(v) => Column::new(name, v),
            Cleaned::Timestamp(v) => Column::new(name, v)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        })
    }
}

/// Coerce every value with `parse`, counting non-empty values it rejects.
fn coerce<T>(values: &[Option<&str>], parse: impl Fn(&str) -> Option<T>) -> (Vec<Option<T>>, usize) {
    let mut failures = 0;
    let out = values
        .iter()
        .map(|v| match v {
            Some(s) if !s.trim().is_empty() => {
                let parsed = parse(s);
                if parsed.is_none() {
                    failures += 1;
                }
                parsed
            }
            _ => None,
        })
        .collect();
    (out, failures)
}

/// Handles type coercion and bucket derivation.
pub struct DataCleaner;

impl DataCleaner {
    pub fn clean_table(raw: &RawTable) -> Result<CleanTable, CleanError> {
        let schema = raw.schema;
        let mut quality = TableQuality::new(schema.name, raw.df.height());
        let mut order: Vec<String> = Vec::new();
        let mut cleaned: HashMap<String, Cleaned> = HashMap::new();

        for column in raw.df.get_columns() {
            let name = column.name().to_string();
            let ca = column.as_materialized_series().str()?;
            let values: Vec<Option<&str>> = ca.into_iter().collect();
            let kind = schema.kind_of(&name);

            let (typed, failures) = match kind {
                ColumnKind::Identifier | ColumnKind::Integer => {
                    let (v, f) = coerce(&values, parse_integer);
                    (Cleaned::Int(v), f)
                }
                ColumnKind::Float => {
                    let (v, f) = coerce(&values, parse_float);
                    (Cleaned::Float(v), f)
                }
                ColumnKind::Currency => {
                    let (v, f) = coerce(&values, clean_currency);
                    (Cleaned::Float(v), f)
                }
                ColumnKind::Flag => {
                    let unrecognised = values
                        .iter()
                        .filter(|v| matches!(v, Some(s) if *s != "Yes" && *s != "No"))
                        .count();
                    let flags = values.iter().map(|v| Some(parse_flag(*v))).collect();
                    (Cleaned::Bool(flags), unrecognised)
                }
                ColumnKind::DateString => {
                    let (v, f) = Self::coerce_dates(schema.name, &name, &values);
                    (Cleaned::Timestamp(v), f)
                }
                ColumnKind::Categorical => (
                    Cleaned::Text(values.iter().map(|v| v.map(str::to_string)).collect()),
                    0,
                ),
            };

            if failures > 0 {
                debug!(
                    table = schema.name,
                    column = %name,
                    kind = %kind,
                    failures,
                    "values replaced by null"
                );
            }
            quality.record(&name, failures);
            order.push(name.clone());
            cleaned.insert(name, typed);
        }

        let mut derived_columns = Vec::with_capacity(schema.derived.len());
        for derived in schema.derived {
            let values = match (derived.bucket, cleaned.get(derived.source)) {
                (Bucket::AgeGroup, Some(Cleaned::Int(v))) => {
                    v.iter().map(|x| x.map(bucket_age)).collect()
                }
                (Bucket::CreditScoreGroup, Some(Cleaned::Int(v))) => {
                    v.iter().map(|x| x.map(bucket_credit_score)).collect()
                }
                (Bucket::IncomeBracket, Some(Cleaned::Float(v))) => {
                    v.iter().map(|x| x.map(income_bracket)).collect()
                }
                _ => {
                    return Err(CleanError::MissingDerivedSource {
                        derived: derived.name.to_string(),
                        source_column: derived.source.to_string(),
                    })
                }
            };
            derived_columns.push(Cleaned::Int(values).into_column(derived.name)?);
        }

        let mut columns = Vec::with_capacity(order.len() + derived_columns.len());
        for name in &order {
            if let Some(typed) = cleaned.remove(name) {
                columns.push(typed.into_column(name)?);
            }
        }
        columns.extend(derived_columns);

        let df = DataFrame::new(columns)?;

        Ok(CleanTable {
            schema,
            path: raw.path.clone(),
            df,
            quality,
        })
    }

    fn coerce_dates(table: &str, column: &str, values: &[Option<&str>]) -> (Vec<Option<i64>>, usize) {
        let mut failures = 0;
        let out = values
            .iter()
            .enumerate()
            .map(|(row, v)| match v {
                Some(s) if !s.trim().is_empty() => match parse_timestamp(s) {
                    Some(dt) => Some(dt.and_utc().timestamp_millis()),
                    None => {
                        debug!(table, column, row, value = %s, "unparseable date");
                        failures += 1;
                        None
                    }
                },
                _ => None,
            })
            .collect();

        if failures > 0 {
            warn!("{}.{}: {} dates could not be parsed and were set to null", table, column, failures);
        }
        (out, failures)
    }
}
