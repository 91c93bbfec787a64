//! `polars` bridge.
//!
//! A series becomes one `time` column plus one `Float64` column per flattened
//! channel element. Scalar channels keep their name; other channels get one
//! column per element, named with the element index, e.g. `Pos[0]`, `Pos[1]`
//! for a vector channel or `Rot[1,2]` for a matrix channel.
//!
//! Events and metadata have no tabular form and are not exported.

use std::collections::BTreeMap;

use ndarray::{ArrayD, IxDyn};
use polars::prelude::{Column, DataFrame, DataType, NamedFrom};

use crate::timeseries::util::Columns;
use crate::timeseries::{TimeSeries, default_time_info};
use crate::KinetraceError;

/// Conversion into a `polars` [`DataFrame`].
pub trait ToDataFrame {
    /// Build the frame.
    ///
    /// # Errors
    /// - `InvalidArg` if a channel is named `time`, or has a zero-length
    ///   per-sample axis and would produce no column.
    /// - `Data` if `polars` rejects the columns.
    fn to_dataframe(&self) -> Result<DataFrame, KinetraceError>;
}

fn polars_err(e: impl std::fmt::Display) -> KinetraceError {
    KinetraceError::Data(format!("polars: {e}"))
}

fn element_suffix(index: usize, trailing: &[usize]) -> String {
    let mut parts = vec![0usize; trailing.len()];
    let mut rem = index;
    for (k, &dim) in trailing.iter().enumerate().rev() {
        parts[k] = rem % dim;
        rem /= dim;
    }
    let joined: Vec<String> = parts.iter().map(ToString::to_string).collect();
    format!("[{}]", joined.join(","))
}

impl ToDataFrame for TimeSeries {
    fn to_dataframe(&self) -> Result<DataFrame, KinetraceError> {
        if self.has_data("time") {
            return Err(KinetraceError::invalid_arg(
                "channel named 'time' collides with the time column",
            ));
        }
        let mut columns = vec![Column::new("time".into(), self.time.clone())];
        for (name, arr) in &self.data {
            let cols = Columns::from_array(arr);
            let trailing = &arr.shape()[1..];
            if cols.cols == 0 {
                return Err(KinetraceError::invalid_arg(format!(
                    "channel '{name}' has shape {:?} and no element to export",
                    arr.shape()
                )));
            }
            for j in 0..cols.cols {
                let col_name = if trailing.is_empty() {
                    name.clone()
                } else {
                    format!("{name}{}", element_suffix(j, trailing))
                };
                columns.push(Column::new(col_name.into(), cols.column(j)));
            }
        }
        DataFrame::new(columns).map_err(polars_err)
    }
}

/// Split `Name[1,2]` into `("Name", [1, 2])`; a name without brackets is scalar.
fn parse_column_name(name: &str) -> Result<(String, Vec<usize>), KinetraceError> {
    let Some(open) = name.find('[') else {
        return Ok((name.to_string(), Vec::new()));
    };
    let inner = name[open + 1..].strip_suffix(']').ok_or_else(|| {
        KinetraceError::Data(format!("column '{name}' has an unterminated index"))
    })?;
    let index = inner
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<usize>()
                .map_err(|_| KinetraceError::Data(format!("column '{name}' has a bad index")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name[..open].to_string(), index))
}

fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, KinetraceError> {
    let col = df.column(name).map_err(polars_err)?;
    let cast = col.cast(&DataType::Float64).map_err(polars_err)?;
    let values = cast.f64().map_err(polars_err)?;
    Ok(values
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

impl TimeSeries {
    /// Rebuild a series from a frame produced by [`ToDataFrame::to_dataframe`]
    /// (or any frame following the same column naming).
    ///
    /// Nulls become NaN. Every element of a non-scalar channel must be present.
    ///
    /// # Errors
    /// - `NotFound` if `time_column` is missing.
    /// - `Data` if a column cannot be read as `f64` or a channel's elements
    ///   are incomplete or inconsistent.
    pub fn from_dataframe(df: &DataFrame, time_column: &str) -> Result<Self, KinetraceError> {
        if df.column(time_column).is_err() {
            return Err(KinetraceError::not_found(format!(
                "time column '{time_column}'"
            )));
        }
        let time = column_values(df, time_column)?;
        let n = time.len();

        let mut grouped: BTreeMap<String, Vec<(Vec<usize>, Vec<f64>)>> = BTreeMap::new();
        for col in df.get_columns() {
            let col_name = col.name().as_str();
            if col_name == time_column {
                continue;
            }
            let (base, index) = parse_column_name(col_name)?;
            let values = column_values(df, col_name)?;
            grouped.entry(base).or_default().push((index, values));
        }

        let mut data = BTreeMap::new();
        for (name, elements) in grouped {
            let arr = assemble_channel(&name, n, elements)?;
            data.insert(name, arr);
        }
        Self::from_parts(time, data, BTreeMap::new(), Vec::new(), default_time_info())
    }
}

fn assemble_channel(
    name: &str,
    rows: usize,
    elements: Vec<(Vec<usize>, Vec<f64>)>,
) -> Result<ArrayD<f64>, KinetraceError> {
    let rank = elements.first().map_or(0, |(idx, _)| idx.len());
    if elements.iter().any(|(idx, _)| idx.len() != rank) {
        return Err(KinetraceError::Data(format!(
            "channel '{name}' mixes element ranks"
        )));
    }
    let mut trailing = vec![0usize; rank];
    for (idx, _) in &elements {
        for (d, &i) in idx.iter().enumerate() {
            trailing[d] = trailing[d].max(i + 1);
        }
    }
    let cols: usize = trailing.iter().product();
    if elements.len() != cols {
        return Err(KinetraceError::Data(format!(
            "channel '{name}' has {} element columns, expected {cols}",
            elements.len()
        )));
    }
    let mut values = vec![f64::NAN; rows * cols];
    let mut seen = vec![false; cols];
    for (idx, col) in elements {
        let j = idx
            .iter()
            .zip(&trailing)
            .fold(0usize, |acc, (&i, &dim)| acc * dim + i);
        if std::mem::replace(&mut seen[j], true) {
            return Err(KinetraceError::Data(format!(
                "channel '{name}' has a duplicate element column"
            )));
        }
        for (i, v) in col.into_iter().enumerate() {
            values[i * cols + j] = v;
        }
    }
    let mut shape = vec![rows];
    shape.extend(trailing);
    ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| KinetraceError::Data(format!("channel '{name}': {e}")))
}
