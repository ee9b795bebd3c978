//! A module for inferring per-column SQL schemas from token streams.
//!
//! Each [`ColumnInfo`] starts with every candidate type still possible and
//! narrows as tokens arrive: a candidate flag, once cleared, is never set
//! again. Because narrowing is monotone, two `ColumnInfo`s built from
//! disjoint subsets of a file's lines can be [merged](ColumnInfo::merge) in
//! any order and any grouping with the same final result, which is what lets
//! analyzer threads work on private copies and publish their deltas.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use deepsize::DeepSizeOf;
use serde::{Deserialize, Serialize};

/// A plain enumeration of the column types the inference can produce.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize, DeepSizeOf)]
pub enum ColumnType {
    /// The fallback type; any token is a string.
    String,
    /// A floating-point number that fits neither `Int` nor `Decimal`.
    Float,
    /// A plain decimal number with bounded digits around the point.
    Decimal,
    /// A signed 64-bit integer.
    Int,
    /// A `YYYY-MM-DD hh:mm:ss[.fractional]` timestamp.
    TimeStamp,
    /// A `YYYY-MM-DD` calendar date.
    Date,
    /// An `hh:mm:ss[.fractional]` time of day.
    Time,
    /// Exactly the lowercase literals `true` and `false`.
    Bool,
}

/// Per-column type-inference state.
///
/// `analyze_token` refines the state with one raw (untrimmed) token;
/// `merge` combines two states produced from disjoint line subsets.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, DeepSizeOf)]
pub struct ColumnInfo {
    name: String,
    analyzed: bool,
    is_float: bool,
    is_decimal: bool,
    is_int: bool,
    is_bool: bool,
    is_date: bool,
    is_time: bool,
    is_time_stamp: bool,
    has_null: bool,
    min_length: Option<usize>,
    max_length: usize,
    digits_before: Option<usize>,
    digits_after: Option<usize>,
    min_value: Option<f64>,
    max_value: Option<f64>,
}

fn matches_date(token: &str) -> bool {
    NaiveDate::parse_from_str(token, "%Y-%m-%d").is_ok()
}

// The time-of-day part is optional: a bare date stays a timestamp candidate.
fn matches_time_stamp(token: &str) -> bool {
    matches_date(token) || NaiveDateTime::parse_from_str(token, "%Y-%m-%d %H:%M:%S%.f").is_ok()
}

fn matches_time(token: &str) -> bool {
    NaiveTime::parse_from_str(token, "%H:%M:%S%.f").is_ok()
}

// MonetDB does not accept hex floats on import, so a hex-float shaped token
// disqualifies the column from every numeric type even though strtod-style
// parsers would read it.
fn looks_hexadecimal(token: &str) -> bool {
    let prefix = token.get(..2);
    prefix == Some("0x") || prefix == Some("0X") || token.contains(|c| c == 'p' || c == 'P')
}

impl ColumnInfo {
    /// Creates the fully-open state for a column: every candidate type is
    /// still possible and nothing has been analyzed.
    pub fn new(name: &str) -> Self {
        ColumnInfo {
            name: name.to_string(),
            analyzed: false,
            is_float: true,
            is_decimal: true,
            is_int: true,
            is_bool: true,
            is_date: true,
            is_time: true,
            is_time_stamp: true,
            has_null: false,
            min_length: None,
            max_length: 0,
            digits_before: None,
            digits_after: None,
            min_value: None,
            max_value: None,
        }
    }

    /// The column name as taken from the header line.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Refines the inference state with one raw token.
    ///
    /// Length bookkeeping uses the raw token; everything else looks at the
    /// whitespace-trimmed form. An empty-after-trim token only records a
    /// null and narrows nothing.
    pub fn analyze_token(&mut self, token: &str) {
        let raw_length = token.chars().count();
        self.max_length = self.max_length.max(raw_length);
        self.min_length = Some(match self.min_length {
            Some(min) => min.min(raw_length),
            None => raw_length,
        });

        let trimmed = token.trim();
        if trimmed.is_empty() {
            self.has_null = true;
            return;
        }
        self.analyzed = true;

        if self.is_float {
            self.analyze_number(trimmed);
        }

        if self.is_time_stamp {
            if matches_time_stamp(trimmed) {
                if self.is_date && !matches_date(trimmed) {
                    self.is_date = false;
                }
            } else {
                self.is_time_stamp = false;
                self.is_date = false;
            }
        }
        if self.is_time && !matches_time(trimmed) {
            self.is_time = false;
        }

        if self.is_bool && trimmed != "true" && trimmed != "false" {
            self.is_bool = false;
        }
    }

    fn analyze_number(&mut self, trimmed: &str) {
        if looks_hexadecimal(trimmed) {
            self.is_float = false;
            self.is_decimal = false;
            self.is_int = false;
            return;
        }
        let value = match trimmed.parse::<f64>() {
            Ok(value) => value,
            Err(_) => {
                self.is_float = false;
                self.is_decimal = false;
                self.is_int = false;
                return;
            }
        };
        self.min_value = Some(match self.min_value {
            Some(min) => min.min(value),
            None => value,
        });
        self.max_value = Some(match self.max_value {
            Some(max) => max.max(value),
            None => value,
        });

        if !self.is_decimal {
            return;
        }
        if trimmed.contains(|c| c == 'e' || c == 'E') {
            // Scientific notation is float-only.
            self.is_decimal = false;
            self.is_int = false;
            return;
        }
        if self.is_int && trimmed.parse::<i64>().is_err() {
            self.is_int = false;
        }

        let length = trimmed.chars().count();
        let (mut before, after) = match trimmed.chars().position(|c| c == '.') {
            Some(point) => (point, length - point - 1),
            None => (length, 0),
        };
        if value < 0.0 {
            // The sign is not a digit.
            before -= 1;
        }
        self.digits_before = Some(match self.digits_before {
            Some(digits) => digits.max(before),
            None => before,
        });
        self.digits_after = Some(match self.digits_after {
            Some(digits) => digits.max(after),
            None => after,
        });
    }

    /// The narrowest type still viable for this column.
    pub fn column_type(&self) -> ColumnType {
        if !self.analyzed {
            return ColumnType::String;
        }
        if self.is_float {
            if self.is_int {
                ColumnType::Int
            } else if self.is_decimal {
                ColumnType::Decimal
            } else {
                ColumnType::Float
            }
        } else if self.is_time_stamp {
            if self.is_date {
                ColumnType::Date
            } else {
                ColumnType::TimeStamp
            }
        } else if self.is_time {
            ColumnType::Time
        } else if self.is_bool {
            ColumnType::Bool
        } else {
            ColumnType::String
        }
    }

    /// Whether the column must be nullable. A column that never saw a
    /// non-empty token reports `true`.
    pub fn is_null(&self) -> bool {
        !self.analyzed || self.has_null
    }

    /// Length of the shortest raw token seen, in code points.
    pub fn min_length(&self) -> Option<usize> {
        self.min_length
    }

    /// Length of the longest raw token seen, in code points.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Most digits seen before the decimal point (sign excluded).
    pub fn digits_before_decimal_point(&self) -> Option<usize> {
        self.digits_before
    }

    /// Most digits seen after the decimal point.
    pub fn digits_after_decimal_point(&self) -> Option<usize> {
        self.digits_after
    }

    /// Smallest numeric value seen.
    pub fn min_value(&self) -> Option<f64> {
        self.min_value
    }

    /// Largest numeric value seen.
    pub fn max_value(&self) -> Option<f64> {
        self.max_value
    }

    /// Combines the state built from another subset of the column's tokens.
    ///
    /// Candidate flags AND together, `has_null` and `analyzed` OR, extrema
    /// take the min/max over the values present. Commutative and
    /// associative, so partial results may be merged in any bracketing.
    pub fn merge(&mut self, other: &ColumnInfo) {
        self.analyzed |= other.analyzed;
        self.is_float &= other.is_float;
        self.is_decimal &= other.is_decimal;
        self.is_int &= other.is_int;
        self.is_bool &= other.is_bool;
        self.is_date &= other.is_date;
        self.is_time &= other.is_time;
        self.is_time_stamp &= other.is_time_stamp;
        self.has_null |= other.has_null;

        self.max_length = self.max_length.max(other.max_length);
        self.min_length = merge_present(self.min_length, other.min_length, usize::min);
        self.digits_before = merge_present(self.digits_before, other.digits_before, usize::max);
        self.digits_after = merge_present(self.digits_after, other.digits_after, usize::max);
        self.min_value = merge_present(self.min_value, other.min_value, f64::min);
        self.max_value = merge_present(self.max_value, other.max_value, f64::max);
    }
}

fn merge_present<T: Copy>(a: Option<T>, b: Option<T>, pick: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

/// The header-ordered inference results for a whole file.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize, DeepSizeOf)]
pub struct ParsingResults {
    columns: Vec<ColumnInfo>,
    num_lines: u64,
    num_malformed_lines: u64,
}

impl ParsingResults {
    pub fn new() -> Self {
        ParsingResults::default()
    }

    /// Appends a fresh column. Called once per header field, before any
    /// data line is analyzed.
    pub fn add_column(&mut self, name: &str) {
        self.columns.push(ColumnInfo::new(name));
    }

    /// The per-column inference states, in header order.
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub(crate) fn column_mut(&mut self, index: usize) -> &mut ColumnInfo {
        &mut self.columns[index]
    }

    /// Data lines seen, header excluded. Malformed lines are included.
    pub fn num_lines(&self) -> u64 {
        self.num_lines
    }

    /// Data lines whose token count differed from the column count.
    pub fn num_malformed_lines(&self) -> u64 {
        self.num_malformed_lines
    }

    pub(crate) fn count_line(&mut self) {
        self.num_lines += 1;
    }

    pub(crate) fn count_malformed_line(&mut self) {
        self.num_malformed_lines += 1;
    }

    /// A copy to accumulate a private delta into: same columns, zeroed
    /// counters. Starting from the current column states keeps the hot loop
    /// from re-testing candidates that are already dead; zeroing the
    /// counters keeps [`update`](Self::update)'s summing correct.
    pub fn snapshot(&self) -> ParsingResults {
        ParsingResults {
            columns: self.columns.clone(),
            num_lines: 0,
            num_malformed_lines: 0,
        }
    }

    /// Merges another result set produced from a disjoint subset of the
    /// file's lines: element-wise column merge plus counter sums.
    pub fn update(&mut self, other: &ParsingResults) {
        assert_eq!(
            self.columns.len(),
            other.columns.len(),
            "merging results with different column counts"
        );
        for (column, delta) in self.columns.iter_mut().zip(other.columns.iter()) {
            column.merge(delta);
        }
        self.num_lines += other.num_lines;
        self.num_malformed_lines += other.num_malformed_lines;
    }
}
