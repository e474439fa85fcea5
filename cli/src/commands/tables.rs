use anyhow::Result;
use atxmap::{open_source, tabular};

use crate::cli::{Cli, CsvArgs, SeriesArgs, YearsArgs};

fn read(cli: &Cli, args: &CsvArgs) -> Result<tabular::DataFrame> {
    let mut config = super::base_config(cli)?;
    if args.no_typing { config.dynamic_typing = false }
    let source = open_source(&args.data, &config)?;
    let bytes = source.fetch(&args.file)?;
    tabular::read_csv(&bytes, config.dynamic_typing)
}

pub fn budget(cli: &Cli, args: &CsvArgs) -> Result<()> {
    let df = read(cli, args)?;
    for row in tabular::budget_by_department(&df)? {
        println!("{:<40} {:>16.2} {:>16.2}", row.department, row.budget, row.expenditures);
    }
    Ok(())
}

pub fn series(cli: &Cli, args: &SeriesArgs) -> Result<()> {
    let df = read(cli, &args.csv)?;
    for point in tabular::monthly_series(&df, &args.value)? {
        println!("{}\t{}", point.month_key, point.value);
    }
    Ok(())
}

pub fn years(cli: &Cli, args: &YearsArgs) -> Result<()> {
    let df = read(cli, &args.csv)?;
    for (year, count) in tabular::count_by_year(&df, &args.column)? {
        println!("{year}\t{count}");
    }
    Ok(())
}
