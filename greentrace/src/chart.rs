//! Declarative chart specs. Renderers are pure: table slices and footprint
//! breakdowns in, serializable specs out. Empty series sets are a valid
//! "no data" state, never an error.

use serde::{Deserialize, Serialize};

use crate::footprint::{FootprintBreakdown, CATEGORY_LABELS};
use crate::{EmissionsTable, SectorAverageTable, YEAR_MAX, YEAR_MIN};

/// Hole fraction of the footprint doughnut.
pub const DOUGHNUT_HOLE: f64 = 0.6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<(i32, f64)>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoughnutChart {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub hole: f64,
    pub center_caption: String,
}

/// Single `World` series over all kept years. A table without a `World`
/// column yields zero series.
pub fn world_trend(table: &EmissionsTable) -> LineChart {
    let series = table
        .country_series("World")
        .map(|points| Series {
            name: "World".to_string(),
            points,
        })
        .into_iter()
        .collect();
    LineChart {
        title: format!("World CO2 Emission from {YEAR_MIN}-{YEAR_MAX}"),
        x_label: format!("Year ({YEAR_MIN}-{YEAR_MAX})"),
        y_label: "World CO2 Emission (in MtCO₂e)".to_string(),
        series,
    }
}

/// One series per requested country, filtered to the inclusive year range.
/// Countries absent from the table are skipped; an empty selection yields a
/// chart with zero series.
pub fn country_trend(
    table: &EmissionsTable,
    countries: &[String],
    year_range: (i32, i32),
) -> LineChart {
    let (min_year, max_year) = year_range;
    let series = countries
        .iter()
        .filter_map(|name| {
            let points: Vec<(i32, f64)> = table
                .country_series(name)?
                .into_iter()
                .filter(|(year, _)| *year >= min_year && *year <= max_year)
                .collect();
            Some(Series {
                name: name.clone(),
                points,
            })
        })
        .collect();
    LineChart {
        title: format!("CO2 Emission (in MtCO₂e) between {min_year} and {max_year}"),
        x_label: "Year".to_string(),
        y_label: "CO2 Emission (in MtCO₂e)".to_string(),
        series,
    }
}

/// One series per distinct sector, points sorted by year so the line is
/// drawn chronologically regardless of source column order.
pub fn sector_averages(table: &SectorAverageTable) -> LineChart {
    let series = table
        .sectors()
        .into_iter()
        .map(|sector| {
            let mut points = table.sector_series(sector);
            points.sort_by_key(|(year, _)| *year);
            Series {
                name: sector.to_string(),
                points,
            }
        })
        .collect();
    LineChart {
        title: "World Average Historical Emissions".to_string(),
        x_label: "Year".to_string(),
        y_label: "Emissions".to_string(),
        series,
    }
}

/// Eight fixed slices over the weighted breakdown, hole fraction 0.6, with
/// the centered caption the dashboard shows inside the doughnut.
pub fn footprint_doughnut(breakdown: &FootprintBreakdown) -> DoughnutChart {
    DoughnutChart {
        title: "Personal Carbon Footprint Percentage".to_string(),
        labels: CATEGORY_LABELS.iter().map(|label| label.to_string()).collect(),
        values: breakdown.magnitudes().to_vec(),
        hole: DOUGHNUT_HOLE,
        center_caption: "Your Carbon Footprint".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::{self, FootprintInputs};
    use crate::tests::{EMISSIONS_CSV, SECTOR_CSV};

    fn emissions() -> EmissionsTable {
        EmissionsTable::parse(EMISSIONS_CSV.as_bytes()).unwrap()
    }

    #[test]
    fn world_trend_is_a_single_full_span_series() {
        let chart = world_trend(&emissions());
        assert_eq!(chart.series.len(), 1);
        assert_eq!(
            chart.series[0].points,
            vec![(1998, 10.0), (1999, 12.0), (2000, 14.0)]
        );
        assert_eq!(chart.title, "World CO2 Emission from 1998-2018");
    }

    #[test]
    fn world_trend_without_world_column_is_empty_not_an_error() {
        let csv = "Country,1998\nCanada,1.0\n";
        let table = EmissionsTable::parse(csv.as_bytes()).unwrap();
        assert!(world_trend(&table).series.is_empty());
    }

    #[test]
    fn country_trend_filters_inclusive_year_range() {
        let chart = country_trend(&emissions(), &["Canada".to_string()], (1998, 1999));
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].name, "Canada");
        assert_eq!(chart.series[0].points, vec![(1998, 1.0), (1999, 1.5)]);
        assert_eq!(chart.title, "CO2 Emission (in MtCO₂e) between 1998 and 1999");
    }

    #[test]
    fn country_trend_years_are_exactly_the_range_ascending() {
        let table = emissions();
        for min_year in 1998..=2000 {
            for max_year in min_year..=2000 {
                let chart =
                    country_trend(&table, &["World".to_string()], (min_year, max_year));
                let years: Vec<i32> =
                    chart.series[0].points.iter().map(|(year, _)| *year).collect();
                let expected: Vec<i32> = (min_year..=max_year).collect();
                assert_eq!(years, expected);
            }
        }
    }

    #[test]
    fn country_trend_empty_selection_yields_zero_series() {
        let chart = country_trend(&emissions(), &[], (1998, 2018));
        assert!(chart.series.is_empty());
    }

    #[test]
    fn country_trend_skips_unknown_countries() {
        let chart = country_trend(
            &emissions(),
            &["Atlantis".to_string(), "Canada".to_string()],
            (1998, 2000),
        );
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].name, "Canada");
    }

    #[test]
    fn sector_chart_has_one_sorted_series_per_sector() {
        let table = SectorAverageTable::parse(SECTOR_CSV.as_bytes()).unwrap();
        let chart = sector_averages(&table);
        assert_eq!(chart.series.len(), 3);
        for series in &chart.series {
            assert_eq!(series.points.len(), 11);
            let years: Vec<i32> = series.points.iter().map(|(year, _)| *year).collect();
            let mut sorted = years.clone();
            sorted.sort_unstable();
            assert_eq!(years, sorted);
        }
        assert_eq!(chart.series[0].name, "Energy");
        assert_eq!(chart.series[0].points[0], (2008, 33.0));
    }

    #[test]
    fn doughnut_spec_from_zero_breakdown_has_eight_zero_slices() {
        let zero = FootprintInputs {
            electric_bill: 0.0,
            gas_bill: 0.0,
            oil_bill: 0.0,
            mileage: 0.0,
            short_flights: 0.0,
            long_flights: 0.0,
            recycle_aluminum: 0.0,
            recycle_paper: 0.0,
        };
        let chart = footprint_doughnut(&footprint::compute(&zero));
        assert_eq!(chart.labels.len(), 8);
        assert!(chart.values.iter().all(|&value| value == 0.0));
        assert_eq!(chart.hole, 0.6);
        assert_eq!(chart.center_caption, "Your Carbon Footprint");
    }
}
