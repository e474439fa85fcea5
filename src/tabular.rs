use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;

pub use polars::frame::DataFrame;

pub const DEPARTMENT: &str = "DEPT_ROLLUP_NAME";
pub const BUDGET: &str = "BUDGET";
pub const EXPENDITURES: &str = "EXPENDITURES";
pub const MONTH_KEY: &str = "month_key";

/// Budget and spending summed over one department.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentTotal {
    pub department: String,
    pub budget: f64,
    pub expenditures: f64,
}

/// One point of a monthly series.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPoint {
    pub month_key: String,
    pub value: f64,
}

/// Read CSV bytes with a header row. Without dynamic typing every column stays text.
pub fn read_csv(bytes: &[u8], dynamic_typing: bool) -> Result<DataFrame> {
    let options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(if dynamic_typing { Some(100) } else { Some(0) });
    let df = CsvReader::new(Cursor::new(bytes))
        .with_options(options)
        .finish()
        .context("Failed to parse CSV")?;
    Ok(df)
}

/// Parse a number, tolerating currency symbols, thousands separators and whitespace.
fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
    cleaned.parse().ok()
}

/// Read a column as numbers; text columns are parsed leniently, unparseable cells become null.
fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = df.column(name).with_context(|| format!("missing column {name:?}"))?;
    if col.dtype() == &DataType::String {
        return Ok(col.str()?.into_iter().map(|v| v.and_then(parse_amount)).collect());
    }
    let cast = col.cast(&DataType::Float64)
        .with_context(|| format!("column {name:?} is not numeric"))?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Read a column as text, whatever its inferred type.
fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let col = df.column(name).with_context(|| format!("missing column {name:?}"))?;
    let cast = col.cast(&DataType::String)?;
    Ok(cast.str()?.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Sum BUDGET and EXPENDITURES per DEPT_ROLLUP_NAME, largest budget first.
/// Rows without a department are dropped; missing amounts count as zero.
pub fn budget_by_department(df: &DataFrame) -> Result<Vec<DepartmentTotal>> {
    let departments = text_column(df, DEPARTMENT)?;
    let budget = numeric_column(df, BUDGET)?;
    let spent = numeric_column(df, EXPENDITURES)?;

    let clean = DataFrame::new(vec![
        Column::new("department".into(), departments),
        Column::new("budget".into(), budget),
        Column::new("expenditures".into(), spent),
    ])?;

    let out = clean.lazy()
        .filter(col("department").is_not_null())
        .group_by([col("department")])
        .agg([
            col("budget").fill_null(lit(0.0)).sum().alias("budget"),
            col("expenditures").fill_null(lit(0.0)).sum().alias("expenditures"),
        ])
        .sort(
            ["budget", "department"],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()?;

    let names = out.column("department")?.str()?;
    let budgets = out.column("budget")?.f64()?;
    let spent = out.column("expenditures")?.f64()?;

    (0..out.height())
        .map(|i| Ok(DepartmentTotal {
            department: names.get(i).ok_or_else(|| anyhow!("null department at row {i}"))?.to_string(),
            budget: budgets.get(i).unwrap_or(0.0),
            expenditures: spent.get(i).unwrap_or(0.0),
        }))
        .collect()
}

/// Sum `value_col` per `month_key`, in ascending month order.
pub fn monthly_series(df: &DataFrame, value_col: &str) -> Result<Vec<MonthlyPoint>> {
    let clean = DataFrame::new(vec![
        Column::new(MONTH_KEY.into(), text_column(df, MONTH_KEY)?),
        Column::new("value".into(), numeric_column(df, value_col)?),
    ])?;

    let out = clean.lazy()
        .filter(col(MONTH_KEY).is_not_null())
        .group_by([col(MONTH_KEY)])
        .agg([col("value").fill_null(lit(0.0)).sum().alias("value")])
        .sort([MONTH_KEY], SortMultipleOptions::default())
        .collect()?;

    let months = out.column(MONTH_KEY)?.str()?;
    let values = out.column("value")?.f64()?;

    (0..out.height())
        .map(|i| Ok(MonthlyPoint {
            month_key: months.get(i).ok_or_else(|| anyhow!("null month at row {i}"))?.to_string(),
            value: values.get(i).unwrap_or(0.0),
        }))
        .collect()
}

/// Count rows per year of `date_col`, in ascending year order.
/// The year is the leading four digits of the cell (e.g. "2021-05-03", "2021/05/03 10:00").
pub fn count_by_year(df: &DataFrame, date_col: &str) -> Result<Vec<(i32, usize)>> {
    let dates: Vec<Option<String>> = text_column(df, date_col)?
        .into_iter()
        .map(|d| d.map(|d| d.trim().to_string()))
        .collect();
    let clean = DataFrame::new(vec![Column::new("date".into(), dates)])?;

    let out = clean.lazy()
        .select([col("date").str().slice(lit(0), lit(4)).cast(DataType::Int32).alias("year")])
        .filter(col("year").is_not_null())
        .group_by([col("year")])
        .agg([len().alias("count")])
        .sort(["year"], SortMultipleOptions::default())
        .collect()?;

    let years = out.column("year")?.i32()?;
    let counts = out.column("count")?.cast(&DataType::UInt64)?;
    let counts = counts.u64()?;

    (0..out.height())
        .map(|i| {
            let year = years.get(i).ok_or_else(|| anyhow!("null year at row {i}"))?;
            Ok((year, counts.get(i).unwrap_or(0) as usize))
        })
        .collect()
}
