//! Explicit observer table replacing framework-managed callback dispatch:
//! each binding declares the input identifiers it watches and a handler
//! recomputed in full, synchronously, on every change to one of them.

use crate::chart::{self, DoughnutChart, LineChart};
use crate::footprint::{self, FootprintInputs, FootprintSummary};
use crate::{EmissionsTable, YEAR_MAX, YEAR_MIN};

/// Identifiers for every watchable dashboard input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputId {
    Countries,
    YearRange,
    ElectricBill,
    GasBill,
    OilBill,
    Mileage,
    ShortFlights,
    LongFlights,
    RecycleAluminum,
    RecyclePaper,
}

/// The eight footprint inputs, shared by the doughnut and summary bindings.
pub const FOOTPRINT_INPUTS: [InputId; 8] = [
    InputId::ElectricBill,
    InputId::GasBill,
    InputId::OilBill,
    InputId::Mileage,
    InputId::ShortFlights,
    InputId::LongFlights,
    InputId::RecycleAluminum,
    InputId::RecyclePaper,
];

/// A single observed input change, carrying the new value.
#[derive(Clone, Debug, PartialEq)]
pub enum InputChange {
    Countries(Vec<String>),
    YearRange(i32, i32),
    ElectricBill(f64),
    GasBill(f64),
    OilBill(f64),
    Mileage(f64),
    ShortFlights(f64),
    LongFlights(f64),
    RecycleAluminum(f64),
    RecyclePaper(f64),
}

impl InputChange {
    pub fn input_id(&self) -> InputId {
        match self {
            InputChange::Countries(_) => InputId::Countries,
            InputChange::YearRange(..) => InputId::YearRange,
            InputChange::ElectricBill(_) => InputId::ElectricBill,
            InputChange::GasBill(_) => InputId::GasBill,
            InputChange::OilBill(_) => InputId::OilBill,
            InputChange::Mileage(_) => InputId::Mileage,
            InputChange::ShortFlights(_) => InputId::ShortFlights,
            InputChange::LongFlights(_) => InputId::LongFlights,
            InputChange::RecycleAluminum(_) => InputId::RecycleAluminum,
            InputChange::RecyclePaper(_) => InputId::RecyclePaper,
        }
    }
}

/// Current value of every input. `countries` stays unset until the shell
/// first supplies a selection, which keeps the country-trend binding silent
/// on initial page load.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardState {
    pub countries: Option<Vec<String>>,
    pub year_range: (i32, i32),
    pub footprint: FootprintInputs,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            countries: None,
            year_range: (YEAR_MIN, YEAR_MAX),
            footprint: FootprintInputs::default(),
        }
    }
}

impl DashboardState {
    fn update(&mut self, change: InputChange) {
        match change {
            InputChange::Countries(countries) => self.countries = Some(countries),
            InputChange::YearRange(min, max) => self.year_range = (min, max),
            InputChange::ElectricBill(value) => self.footprint.electric_bill = value,
            InputChange::GasBill(value) => self.footprint.gas_bill = value,
            InputChange::OilBill(value) => self.footprint.oil_bill = value,
            InputChange::Mileage(value) => self.footprint.mileage = value,
            InputChange::ShortFlights(value) => self.footprint.short_flights = value,
            InputChange::LongFlights(value) => self.footprint.long_flights = value,
            InputChange::RecycleAluminum(value) => self.footprint.recycle_aluminum = value,
            InputChange::RecyclePaper(value) => self.footprint.recycle_paper = value,
        }
    }
}

/// One recomputed output from a dispatched binding.
#[derive(Clone, Debug, PartialEq)]
pub enum Output {
    CountryTrend(LineChart),
    FootprintChart(DoughnutChart),
    FootprintSummary(FootprintSummary),
}

type Handler<'t> = Box<dyn Fn(&DashboardState) -> Option<Output> + 't>;

struct Binding<'t> {
    watches: Vec<InputId>,
    handler: Handler<'t>,
}

/// The reactive layer: a list of (watched ids, handler) bindings over a
/// single state value. Dispatch is synchronous and stateless per binding;
/// rapid-fire changes are last-write-wins because each `apply` replaces the
/// watched value before recomputing.
#[derive(Default)]
pub struct UpdateGraph<'t> {
    state: DashboardState,
    bindings: Vec<Binding<'t>>,
}

impl<'t> UpdateGraph<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    /// All three standard dashboard bindings.
    pub fn standard(emissions: &'t EmissionsTable) -> Self {
        let mut graph = Self::new();
        graph.register_country_trend(emissions);
        graph.register_footprint_outputs();
        graph
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Register an arbitrary binding. Handlers run in registration order.
    pub fn register(
        &mut self,
        watches: &[InputId],
        handler: impl Fn(&DashboardState) -> Option<Output> + 't,
    ) {
        self.bindings.push(Binding {
            watches: watches.to_vec(),
            handler: Box::new(handler),
        });
    }

    /// Country selection or year range -> country trend chart. Produces
    /// nothing until the first country selection arrives.
    pub fn register_country_trend(&mut self, emissions: &'t EmissionsTable) {
        self.register(&[InputId::Countries, InputId::YearRange], move |state| {
            let countries = state.countries.as_deref()?;
            Some(Output::CountryTrend(chart::country_trend(
                emissions,
                countries,
                state.year_range,
            )))
        });
    }

    /// The two independent footprint bindings: doughnut chart and text
    /// summary. Each computes the footprint itself, as the source dashboard
    /// does; at O(1) per change the duplicate work is irrelevant.
    pub fn register_footprint_outputs(&mut self) {
        self.register(&FOOTPRINT_INPUTS, |state| {
            let breakdown = footprint::compute(&state.footprint);
            Some(Output::FootprintChart(chart::footprint_doughnut(&breakdown)))
        });
        self.register(&FOOTPRINT_INPUTS, |state| {
            let breakdown = footprint::compute(&state.footprint);
            Some(Output::FootprintSummary(footprint::summarize(&breakdown)))
        });
    }

    /// Record one input change and synchronously run every binding watching
    /// it, collecting the recomputed outputs.
    pub fn apply(&mut self, change: InputChange) -> Vec<Output> {
        let id = change.input_id();
        self.state.update(change);
        self.bindings
            .iter()
            .filter(|binding| binding.watches.contains(&id))
            .filter_map(|binding| (binding.handler)(&self.state))
            .collect()
    }
}
