//! Core tables, footprint model, chart specs, and update graph for the
//! GreenTrace emissions dashboard.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bindings;
pub mod chart;
pub mod footprint;

pub use bindings::{DashboardState, InputChange, InputId, Output, UpdateGraph};
pub use chart::{DoughnutChart, LineChart, Series};
pub use footprint::{FootprintBreakdown, FootprintInputs, FootprintSummary};

#[derive(Error, Debug)]
pub enum GtError {
    #[error("failed to read source file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse CSV: {0}")]
    Csv(String),
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("invalid numeric value '{value}' in column '{column}'")]
    InvalidNumber { column: String, value: String },
    #[error("source table has no usable rows")]
    EmptyTable,
}

/// First year retained from the historical emissions source.
pub const YEAR_MIN: i32 = 1998;
/// Last year present in the historical emissions source.
pub const YEAR_MAX: i32 = 2018;
/// Year span covered by the world sector-average source.
pub const SECTOR_YEAR_MIN: i32 = 2008;
pub const SECTOR_YEAR_MAX: i32 = 2018;

const COUNTRY_COLUMN: &str = "Country";
const SECTOR_COLUMN: &str = "Sector";

/// Per-country historical emissions, transposed so each kept year is a row
/// and each country a column. Loaded once at startup and immutable after.
#[derive(Clone, Debug)]
pub struct EmissionsTable {
    years: Vec<i32>,
    countries: Vec<String>,
    values: Array2<f64>,
}

impl EmissionsTable {
    /// Parse the wide per-country CSV (metadata columns plus year columns
    /// 1990-2018). Metadata columns and years before [`YEAR_MIN`] are
    /// dropped; rows come out sorted by year ascending.
    pub fn parse(input: &[u8]) -> Result<Self, GtError> {
        let mut reader = csv::Reader::from_reader(input);
        let headers = reader
            .headers()
            .map_err(|e| GtError::Csv(e.to_string()))?
            .clone();
        let country_idx = headers
            .iter()
            .position(|h| h == COUNTRY_COLUMN)
            .ok_or_else(|| GtError::MissingColumn(COUNTRY_COLUMN.to_string()))?;

        // Year columns are the numeric headers; everything else is metadata.
        let mut year_cols: Vec<(i32, usize)> = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| h.trim().parse::<i32>().ok().map(|year| (year, idx)))
            .filter(|(year, _)| *year >= YEAR_MIN)
            .collect();
        year_cols.sort_by_key(|(year, _)| *year);
        if year_cols.is_empty() {
            return Err(GtError::EmptyTable);
        }

        let mut countries: Vec<String> = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| GtError::Csv(e.to_string()))?;
            let country = record.get(country_idx).unwrap_or("").to_string();
            let mut column = Vec::with_capacity(year_cols.len());
            for (_, idx) in &year_cols {
                column.push(parse_cell(record.get(*idx).unwrap_or(""), &country)?);
            }
            countries.push(country);
            columns.push(column);
        }
        if countries.is_empty() {
            return Err(GtError::EmptyTable);
        }

        let years: Vec<i32> = year_cols.iter().map(|(year, _)| *year).collect();
        let mut values = Array2::<f64>::zeros((years.len(), countries.len()));
        for (col, series) in columns.iter().enumerate() {
            for (row, value) in series.iter().enumerate() {
                values[[row, col]] = *value;
            }
        }
        Ok(Self {
            years,
            countries,
            values,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GtError> {
        let data = fs::read(path)?;
        Self::parse(&data)
    }

    /// Kept years, ascending, one table row per year.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn contains_country(&self, name: &str) -> bool {
        self.country_index(name).is_some()
    }

    fn country_index(&self, name: &str) -> Option<usize> {
        self.countries.iter().position(|c| c == name)
    }

    /// Full (year, emission) series for one country, or None if absent.
    pub fn country_series(&self, name: &str) -> Option<Vec<(i32, f64)>> {
        let col = self.country_index(name)?;
        Some(
            self.years
                .iter()
                .zip(self.values.column(col).iter())
                .map(|(&year, &value)| (year, value))
                .collect(),
        )
    }

    pub fn value(&self, year: i32, country: &str) -> Option<f64> {
        let row = self.years.iter().position(|&y| y == year)?;
        let col = self.country_index(country)?;
        Some(self.values[[row, col]])
    }
}

/// One (sector, year) observation from the melted sector-average table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectorAverageRow {
    pub sector: String,
    pub year: i32,
    pub emissions: f64,
}

/// World per-sector average emissions in long form, one row per
/// sector x year. Loaded once at startup and immutable after.
#[derive(Clone, Debug)]
pub struct SectorAverageTable {
    rows: Vec<SectorAverageRow>,
}

impl SectorAverageTable {
    /// Parse the fixed projection: `Sector` plus the eleven `"<year>,avg"`
    /// columns for 2008-2018, each renamed to its bare year, then unpivoted
    /// wide-to-long. Row order is value-column-major: every sector for one
    /// year column, then the next, with year columns in source order.
    pub fn parse(input: &[u8]) -> Result<Self, GtError> {
        let mut reader = csv::Reader::from_reader(input);
        let headers = reader
            .headers()
            .map_err(|e| GtError::Csv(e.to_string()))?
            .clone();
        let sector_idx = headers
            .iter()
            .position(|h| h == SECTOR_COLUMN)
            .ok_or_else(|| GtError::MissingColumn(SECTOR_COLUMN.to_string()))?;

        let mut year_cols: Vec<(i32, usize)> = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(year) = header
                .strip_suffix(",avg")
                .and_then(|prefix| prefix.trim().parse::<i32>().ok())
            {
                if (SECTOR_YEAR_MIN..=SECTOR_YEAR_MAX).contains(&year) {
                    year_cols.push((year, idx));
                }
            }
        }
        for year in SECTOR_YEAR_MIN..=SECTOR_YEAR_MAX {
            if !year_cols.iter().any(|(y, _)| *y == year) {
                return Err(GtError::MissingColumn(format!("{year},avg")));
            }
        }

        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record.map_err(|e| GtError::Csv(e.to_string()))?);
        }
        if records.is_empty() {
            return Err(GtError::EmptyTable);
        }

        let mut rows = Vec::with_capacity(records.len() * year_cols.len());
        for (year, idx) in &year_cols {
            for record in &records {
                let sector = record.get(sector_idx).unwrap_or("").to_string();
                let column = format!("{year},avg");
                let emissions = parse_cell(record.get(*idx).unwrap_or(""), &column)?;
                rows.push(SectorAverageRow {
                    sector,
                    year: *year,
                    emissions,
                });
            }
        }
        Ok(Self { rows })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GtError> {
        let data = fs::read(path)?;
        Self::parse(&data)
    }

    pub fn rows(&self) -> &[SectorAverageRow] {
        &self.rows
    }

    /// Distinct sector names in first-appearance order.
    pub fn sectors(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.sector.as_str()) {
                seen.push(row.sector.as_str());
            }
        }
        seen
    }

    /// (year, emissions) pairs for one sector in table row order.
    pub fn sector_series(&self, name: &str) -> Vec<(i32, f64)> {
        self.rows
            .iter()
            .filter(|row| row.sector == name)
            .map(|row| (row.year, row.emissions))
            .collect()
    }
}

// Missing cells pass through as NaN; anything else must parse as a float.
fn parse_cell(cell: &str, column: &str) -> Result<f64, GtError> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|_| GtError::InvalidNumber {
        column: column.to_string(),
        value: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const EMISSIONS_CSV: &str = "\
Data source,Country,Sector,Gas,Unit,1996,1997,1998,1999,2000
CW,World,Total,All GHG,MtCO2e,8.0,9.0,10.0,12.0,14.0
CW,Canada,Total,All GHG,MtCO2e,0.5,0.8,1.0,1.5,2.0
";

    pub(crate) const SECTOR_CSV: &str = "\
Sector,\"2018,avg\",\"2017,avg\",\"2016,avg\",\"2015,avg\",\"2014,avg\",\"2013,avg\",\"2012,avg\",\"2011,avg\",\"2010,avg\",\"2009,avg\",\"2008,avg\"
Energy,38.0,37.5,37.0,36.5,36.0,35.5,35.0,34.5,34.0,33.5,33.0
Agriculture,6.1,6.0,5.9,5.8,5.7,5.6,5.5,5.4,5.3,5.2,5.1
Waste,1.6,1.6,1.5,1.5,1.4,1.4,1.3,1.3,1.2,1.2,1.1
";

    #[test]
    fn emissions_drops_metadata_and_pre_1998_columns() {
        let table = EmissionsTable::parse(EMISSIONS_CSV.as_bytes()).unwrap();
        assert_eq!(table.years(), &[1998, 1999, 2000]);
        assert_eq!(table.countries(), &["World".to_string(), "Canada".to_string()]);
    }

    #[test]
    fn emissions_rows_sorted_by_year() {
        let csv = "\
Country,2000,1998,1999
World,14.0,10.0,12.0
";
        let table = EmissionsTable::parse(csv.as_bytes()).unwrap();
        assert_eq!(table.years(), &[1998, 1999, 2000]);
        assert_eq!(
            table.country_series("World").unwrap(),
            vec![(1998, 10.0), (1999, 12.0), (2000, 14.0)]
        );
    }

    #[test]
    fn emissions_missing_country_column_is_fatal() {
        let csv = "Region,1998\nWorld,10.0\n";
        match EmissionsTable::parse(csv.as_bytes()) {
            Err(GtError::MissingColumn(column)) => assert_eq!(column, "Country"),
            other => panic!("expected missing column error, got {other:?}"),
        }
    }

    #[test]
    fn emissions_empty_cell_passes_through_as_nan() {
        let csv = "Country,1998,1999\nWorld,10.0,\n";
        let table = EmissionsTable::parse(csv.as_bytes()).unwrap();
        assert!(table.value(1999, "World").unwrap().is_nan());
    }

    #[test]
    fn emissions_garbage_cell_is_a_load_failure() {
        let csv = "Country,1998\nWorld,n/a\n";
        assert!(matches!(
            EmissionsTable::parse(csv.as_bytes()),
            Err(GtError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn emissions_lookup_by_year_and_country() {
        let table = EmissionsTable::parse(EMISSIONS_CSV.as_bytes()).unwrap();
        assert_eq!(table.value(1999, "Canada"), Some(1.5));
        assert_eq!(table.value(1999, "Atlantis"), None);
        assert_eq!(table.value(1997, "Canada"), None);
    }

    #[test]
    fn sector_table_melts_value_column_major() {
        let table = SectorAverageTable::parse(SECTOR_CSV.as_bytes()).unwrap();
        assert_eq!(table.rows().len(), 3 * 11);
        // First block is every sector for the first source year column (2018).
        assert_eq!(
            table.rows()[0],
            SectorAverageRow {
                sector: "Energy".to_string(),
                year: 2018,
                emissions: 38.0
            }
        );
        assert_eq!(table.rows()[1].sector, "Agriculture");
        assert_eq!(table.rows()[2].sector, "Waste");
        assert_eq!(table.rows()[3].year, 2017);
    }

    #[test]
    fn sector_table_missing_projection_column_is_fatal() {
        let csv = "Sector,\"2018,avg\"\nEnergy,38.0\n";
        match SectorAverageTable::parse(csv.as_bytes()) {
            Err(GtError::MissingColumn(column)) => assert_eq!(column, "2017,avg"),
            other => panic!("expected missing column error, got {other:?}"),
        }
    }

    #[test]
    fn sector_names_in_first_appearance_order() {
        let table = SectorAverageTable::parse(SECTOR_CSV.as_bytes()).unwrap();
        assert_eq!(table.sectors(), vec!["Energy", "Agriculture", "Waste"]);
    }

    #[test]
    fn sector_series_length_matches_row_count() {
        let table = SectorAverageTable::parse(SECTOR_CSV.as_bytes()).unwrap();
        for sector in table.sectors() {
            assert_eq!(table.sector_series(sector).len(), 11);
        }
    }
}
