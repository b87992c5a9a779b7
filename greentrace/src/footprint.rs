//! Personal carbon footprint model: a fixed linear formula over eight
//! user-supplied numbers, in pounds of CO2 per year.

use serde::{Deserialize, Serialize};

/// Pounds of CO2 per dollar of monthly electric bill.
pub const ELECTRIC_FACTOR: f64 = 105.0;
/// Pounds of CO2 per dollar of monthly gas bill.
pub const GAS_FACTOR: f64 = 105.0;
/// Pounds of CO2 per dollar of monthly oil bill.
pub const OIL_FACTOR: f64 = 113.0;
/// Pounds of CO2 per mile driven per year.
pub const MILEAGE_FACTOR: f64 = 0.79;
/// Pounds of CO2 per short-haul flight (4 hours or less).
pub const SHORT_FLIGHT_FACTOR: f64 = 1100.0;
/// Pounds of CO2 per long-haul flight (4 hours or more).
pub const LONG_FLIGHT_FACTOR: f64 = 4400.0;
// The two recycling inputs enter the total unweighted even though the
// questionnaire frames them as category codes (0 when recycling, 166/184
// when not). Kept exactly as the source model computes it.

/// Doughnut slice labels, in breakdown order.
pub const CATEGORY_LABELS: [&str; 8] = [
    "Electric",
    "Gas",
    "Oil",
    "Miles Driven",
    "Short Flight",
    "Long Flight",
    "Recycle(Aluminum and Tin)",
    "Recycle(Paper)",
];

/// Fixed guidance lines shown under every footprint total.
pub const GUIDANCE: [&str; 3] = [
    "Ideal carbon footprint: 6,000 ~ 15,999 pounds per year.",
    "Average carbon footprint 16,000 ~ 22,000 pounds per year.",
    "Over 22,000 you may want to take some of these \"living green\" practices into consideration.",
];

/// The eight questionnaire answers. Unconstrained and unvalidated: the
/// surrounding shell is responsible for rejecting non-numeric input.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FootprintInputs {
    pub electric_bill: f64,
    pub gas_bill: f64,
    pub oil_bill: f64,
    pub mileage: f64,
    pub short_flights: f64,
    pub long_flights: f64,
    pub recycle_aluminum: f64,
    pub recycle_paper: f64,
}

impl Default for FootprintInputs {
    fn default() -> Self {
        Self {
            electric_bill: 1.0,
            gas_bill: 1.0,
            oil_bill: 1.0,
            mileage: 1.0,
            short_flights: 1.0,
            long_flights: 1.0,
            recycle_aluminum: 1.0,
            recycle_paper: 1.0,
        }
    }
}

/// Weighted per-category magnitudes and their sum. Ephemeral: recomputed in
/// full on every input change, never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FootprintBreakdown {
    pub electric: f64,
    pub gas: f64,
    pub oil: f64,
    pub driving: f64,
    pub short_flights: f64,
    pub long_flights: f64,
    pub recycle_aluminum: f64,
    pub recycle_paper: f64,
    pub total: f64,
}

impl FootprintBreakdown {
    /// Slice magnitudes in [`CATEGORY_LABELS`] order.
    pub fn magnitudes(&self) -> [f64; 8] {
        [
            self.electric,
            self.gas,
            self.oil,
            self.driving,
            self.short_flights,
            self.long_flights,
            self.recycle_aluminum,
            self.recycle_paper,
        ]
    }
}

/// Apply the per-unit factors to each input. Pure and stateless; linear
/// with no cross terms, so superposition over single inputs holds exactly.
pub fn compute(inputs: &FootprintInputs) -> FootprintBreakdown {
    let electric = inputs.electric_bill * ELECTRIC_FACTOR;
    let gas = inputs.gas_bill * GAS_FACTOR;
    let oil = inputs.oil_bill * OIL_FACTOR;
    let driving = inputs.mileage * MILEAGE_FACTOR;
    let short_flights = inputs.short_flights * SHORT_FLIGHT_FACTOR;
    let long_flights = inputs.long_flights * LONG_FLIGHT_FACTOR;
    let recycle_aluminum = inputs.recycle_aluminum;
    let recycle_paper = inputs.recycle_paper;
    let total = electric
        + gas
        + oil
        + driving
        + short_flights
        + long_flights
        + recycle_aluminum
        + recycle_paper;
    FootprintBreakdown {
        electric,
        gas,
        oil,
        driving,
        short_flights,
        long_flights,
        recycle_aluminum,
        recycle_paper,
        total,
    }
}

/// Text output for the footprint binding: a headline with the total plus
/// the fixed guidance lines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FootprintSummary {
    pub headline: String,
    pub guidance: Vec<String>,
}

pub fn summarize(breakdown: &FootprintBreakdown) -> FootprintSummary {
    FootprintSummary {
        headline: format!("Your total carbon footprint is: {}", breakdown.total),
        guidance: GUIDANCE.iter().map(|line| line.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_ones_matches_the_factor_sum() {
        let breakdown = compute(&FootprintInputs::default());
        assert_eq!(
            breakdown.total,
            105.0 + 105.0 + 113.0 + 0.79 + 1100.0 + 4400.0 + 1.0 + 1.0
        );
    }

    #[test]
    fn all_zeros_yields_zero_everywhere() {
        let inputs = FootprintInputs {
            electric_bill: 0.0,
            gas_bill: 0.0,
            oil_bill: 0.0,
            mileage: 0.0,
            short_flights: 0.0,
            long_flights: 0.0,
            recycle_aluminum: 0.0,
            recycle_paper: 0.0,
        };
        let breakdown = compute(&inputs);
        assert_eq!(breakdown.total, 0.0);
        assert!(breakdown.magnitudes().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn superposition_over_single_inputs_is_exact() {
        let inputs = FootprintInputs {
            electric_bill: 2.0,
            gas_bill: 3.0,
            oil_bill: 5.0,
            mileage: 7.0,
            short_flights: 11.0,
            long_flights: 13.0,
            recycle_aluminum: 17.0,
            recycle_paper: 19.0,
        };
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
        let singles = [
            FootprintInputs {
                electric_bill: inputs.electric_bill,
                ..zero
            },
            FootprintInputs {
                gas_bill: inputs.gas_bill,
                ..zero
            },
            FootprintInputs {
                oil_bill: inputs.oil_bill,
                ..zero
            },
            FootprintInputs {
                mileage: inputs.mileage,
                ..zero
            },
            FootprintInputs {
                short_flights: inputs.short_flights,
                ..zero
            },
            FootprintInputs {
                long_flights: inputs.long_flights,
                ..zero
            },
            FootprintInputs {
                recycle_aluminum: inputs.recycle_aluminum,
                ..zero
            },
            FootprintInputs {
                recycle_paper: inputs.recycle_paper,
                ..zero
            },
        ];
        let summed: f64 = singles.iter().map(|single| compute(single).total).sum();
        assert_eq!(compute(&inputs).total, summed);
    }

    #[test]
    fn negative_inputs_are_accepted_unchanged() {
        let inputs = FootprintInputs {
            mileage: -100.0,
            ..FootprintInputs::default()
        };
        let breakdown = compute(&inputs);
        assert_eq!(breakdown.driving, -79.0);
    }

    #[test]
    fn summary_carries_total_and_guidance() {
        let breakdown = compute(&FootprintInputs::default());
        let summary = summarize(&breakdown);
        assert_eq!(
            summary.headline,
            format!("Your total carbon footprint is: {}", breakdown.total)
        );
        assert_eq!(summary.guidance.len(), 3);
    }
}
