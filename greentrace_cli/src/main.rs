use std::fs;
use std::fs::File;
use std::io;
use std::panic;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use greentrace::chart::{self, DoughnutChart, LineChart};
use greentrace::footprint::FootprintSummary;
use greentrace::{
    EmissionsTable, InputChange, Output, SectorAverageTable, UpdateGraph, YEAR_MAX, YEAR_MIN,
};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "GreenTrace emissions dashboard CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the dashboard charts from the two source CSVs
    Charts(ChartsArgs),
    /// Compute a personal carbon footprint and render the doughnut chart
    Footprint(FootprintArgs),
    /// Inspect a source CSV and write a diagnostics report
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ChartsArgs {
    /// Per-country historical emissions CSV
    #[arg(long, default_value = "assets/historical_emissions.csv", value_hint = ValueHint::FilePath)]
    emissions: PathBuf,

    /// World sector-average emissions CSV
    #[arg(long, default_value = "assets/world_historical_emissions.csv", value_hint = ValueHint::FilePath)]
    sectors: PathBuf,

    /// Output directory for rendered charts
    #[arg(short, long, default_value = "charts", value_hint = ValueHint::DirPath)]
    out_dir: PathBuf,

    /// Countries for the trend chart (comma separated)
    #[arg(long)]
    countries: Option<String>,

    /// First year of the trend range
    #[arg(long, default_value_t = YEAR_MIN)]
    from: i32,

    /// Last year of the trend range
    #[arg(long, default_value_t = YEAR_MAX)]
    to: i32,

    /// Render SVG instead of PNG
    #[arg(long, action = ArgAction::SetTrue)]
    svg: bool,

    /// Optional CSV to write the filtered trend table
    #[arg(long, value_hint = ValueHint::FilePath)]
    trend_csv: Option<PathBuf>,

    /// Optional JSON dump of the produced chart specs
    #[arg(long, value_hint = ValueHint::FilePath)]
    spec_json: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct FootprintArgs {
    /// Monthly electric bill
    #[arg(long, default_value_t = 1.0)]
    electric_bill: f64,

    /// Monthly gas bill
    #[arg(long, default_value_t = 1.0)]
    gas_bill: f64,

    /// Monthly oil bill
    #[arg(long, default_value_t = 1.0)]
    oil_bill: f64,

    /// Total yearly mileage on your car
    #[arg(long, default_value_t = 1.0)]
    mileage: f64,

    /// Flights taken in the past year, 4 hours or less
    #[arg(long, default_value_t = 1.0)]
    short_flights: f64,

    /// Flights taken in the past year, 4 hours or more
    #[arg(long, default_value_t = 1.0)]
    long_flights: f64,

    /// Recycling aluminum and tin? Yes: 0, No: 166
    #[arg(long, default_value_t = 1.0)]
    recycle_aluminum: f64,

    /// Recycling paper? Yes: 0, No: 184
    #[arg(long, default_value_t = 1.0)]
    recycle_paper: f64,

    /// Output path for the doughnut chart
    #[arg(short, long, default_value = "footprint.png", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Render SVG instead of PNG
    #[arg(long, action = ArgAction::SetTrue)]
    svg: bool,

    /// Optional JSON dump of the doughnut spec
    #[arg(long, value_hint = ValueHint::FilePath)]
    spec_json: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Source CSV to inspect
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output report path
    #[arg(short, long, default_value = "csv_diagnostics.txt", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Command::Charts(args) => args.verbose,
        Command::Footprint(args) => args.verbose,
        Command::Inspect(args) => args.verbose,
    };
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Charts(args) => handle_charts(args),
        Command::Footprint(args) => handle_footprint(args),
        Command::Inspect(args) => handle_inspect(args),
    }
}

fn handle_charts(args: ChartsArgs) -> Result<()> {
    if args.to < args.from {
        return Err(anyhow!("--to must not precede --from"));
    }

    let emissions = EmissionsTable::load(&args.emissions)
        .with_context(|| format!("failed to load {}", args.emissions.display()))?;
    info!(
        "Emissions table: {} years x {} countries",
        emissions.years().len(),
        emissions.countries().len()
    );
    let sectors = SectorAverageTable::load(&args.sectors)
        .with_context(|| format!("failed to load {}", args.sectors.display()))?;
    info!(
        "Sector averages: {} rows, {} sectors",
        sectors.rows().len(),
        sectors.sectors().len()
    );

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;
    let kind = if args.svg {
        ChartKind::Svg
    } else {
        ChartKind::Png
    };

    let world = chart::world_trend(&emissions);
    if world.series.is_empty() {
        warn!("No 'World' column in the emissions table; world trend will be empty");
    }
    let sector_chart = chart::sector_averages(&sectors);

    let selection: Vec<String> = args
        .countries
        .as_deref()
        .map(parse_country_list)
        .unwrap_or_default();
    for name in &selection {
        if !emissions.contains_country(name) {
            warn!("Country not in table: {}", name);
        }
    }

    // The CLI plays the UI shell here: the selection and year range arrive
    // as two observed input changes, and the trend chart is whatever the
    // last dispatch recomputed.
    let trend: Option<LineChart> = if selection.is_empty() {
        None
    } else {
        let mut graph = UpdateGraph::standard(&emissions);
        graph.apply(InputChange::Countries(selection.clone()));
        graph
            .apply(InputChange::YearRange(args.from, args.to))
            .into_iter()
            .find_map(|output| match output {
                Output::CountryTrend(chart) => Some(chart),
                _ => None,
            })
    };

    let world_path = chart_path(&args.out_dir, "world_trend", kind);
    match render_chart_guard(|| render_line_chart(&world, &world_path, kind)) {
        Ok(()) => info!("Wrote chart: {}", world_path.display()),
        Err(err) => warn!("Skipping chart render ({}): {}", world_path.display(), err),
    }

    let sector_path = chart_path(&args.out_dir, "sector_averages", kind);
    match render_chart_guard(|| render_line_chart(&sector_chart, &sector_path, kind)) {
        Ok(()) => info!("Wrote chart: {}", sector_path.display()),
        Err(err) => warn!("Skipping chart render ({}): {}", sector_path.display(), err),
    }

    if let Some(trend) = trend.as_ref() {
        let trend_path = chart_path(&args.out_dir, "country_trend", kind);
        match render_chart_guard(|| render_line_chart(trend, &trend_path, kind)) {
            Ok(()) => info!("Wrote chart: {}", trend_path.display()),
            Err(err) => warn!("Skipping chart render ({}): {}", trend_path.display(), err),
        }
        if let Some(csv_path) = args.trend_csv.as_ref() {
            write_trend_csv(trend, csv_path)?;
            info!("Wrote trend table: {}", csv_path.display());
        }
    } else if args.trend_csv.is_some() {
        warn!("--trend-csv requires --countries; skipping");
    }

    if let Some(json_path) = args.spec_json.as_ref() {
        let payload = serde_json::json!({
            "world_trend": world,
            "sector_averages": sector_chart,
            "country_trend": trend,
        });
        fs::write(json_path, serde_json::to_string_pretty(&payload)?)
            .with_context(|| format!("failed to write {}", json_path.display()))?;
        info!("Wrote chart specs: {}", json_path.display());
    }

    Ok(())
}

fn handle_footprint(args: FootprintArgs) -> Result<()> {
    let mut graph = UpdateGraph::new();
    graph.register_footprint_outputs();

    // Feed each answer through the update graph as an observed change; the
    // dispatch for the final change carries the fully-updated outputs.
    let changes = [
        InputChange::ElectricBill(args.electric_bill),
        InputChange::GasBill(args.gas_bill),
        InputChange::OilBill(args.oil_bill),
        InputChange::Mileage(args.mileage),
        InputChange::ShortFlights(args.short_flights),
        InputChange::LongFlights(args.long_flights),
        InputChange::RecycleAluminum(args.recycle_aluminum),
        InputChange::RecyclePaper(args.recycle_paper),
    ];
    let mut outputs = Vec::new();
    for change in changes {
        outputs = graph.apply(change);
    }

    let mut doughnut: Option<DoughnutChart> = None;
    let mut summary: Option<FootprintSummary> = None;
    for output in outputs {
        match output {
            Output::FootprintChart(chart) => doughnut = Some(chart),
            Output::FootprintSummary(text) => summary = Some(text),
            Output::CountryTrend(_) => {}
        }
    }
    let doughnut = doughnut.ok_or_else(|| anyhow!("footprint bindings produced no chart"))?;
    let summary = summary.ok_or_else(|| anyhow!("footprint bindings produced no summary"))?;

    let total: f64 = doughnut.values.iter().sum();
    info!("Total carbon footprint: {:.2} lb CO2/yr", total);

    println!("{}", summary.headline);
    for line in &summary.guidance {
        println!("{line}");
    }

    let mut output = args.output.clone();
    let kind = if args.svg {
        output.set_extension("svg");
        ChartKind::Svg
    } else {
        ChartKind::Png
    };
    match render_chart_guard(|| render_doughnut(&doughnut, &output, kind)) {
        Ok(()) => info!("Wrote chart: {}", output.display()),
        Err(err) => warn!("Skipping chart render ({}): {}", output.display(), err),
    }

    if let Some(json_path) = args.spec_json.as_ref() {
        fs::write(json_path, serde_json::to_string_pretty(&doughnut)?)
            .with_context(|| format!("failed to write {}", json_path.display()))?;
        info!("Wrote chart spec: {}", json_path.display());
    }

    Ok(())
}

fn handle_inspect(args: InspectArgs) -> Result<()> {
    let data = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let mut report = String::new();
    report.push_str(&format!("FILE: {}\n", args.input.display()));

    if let Ok(table) = EmissionsTable::parse(&data) {
        emissions_report(&mut report, &table);
    } else if let Ok(table) = SectorAverageTable::parse(&data) {
        sector_report(&mut report, &table);
    } else {
        return Err(anyhow!(
            "{} is neither a historical-emissions nor a sector-average CSV",
            args.input.display()
        ));
    }

    fs::write(&args.output, report)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("Diagnostic report written: {}", args.output.display());
    Ok(())
}

#[derive(Default, Clone)]
struct ColumnStats {
    count: usize,
    min: Option<f64>,
    max: Option<f64>,
    last: Option<f64>,
}

impl ColumnStats {
    fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.count += 1;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self.last = Some(value);
    }
}

fn format_stat(value: Option<f64>) -> String {
    value.map_or("n/a".into(), |v| format!("{:.3}", v))
}

fn emissions_report(report: &mut String, table: &EmissionsTable) {
    report.push_str("  kind: historical emissions\n");
    let years = table.years();
    if let (Some(first), Some(last)) = (years.first(), years.last()) {
        report.push_str(&format!("  years: {}-{} ({} rows)\n", first, last, years.len()));
    }
    report.push_str(&format!("  countries: {}\n", table.countries().len()));

    let mut stats: Vec<(String, ColumnStats)> = table
        .countries()
        .iter()
        .map(|name| {
            let mut column = ColumnStats::default();
            if let Some(series) = table.country_series(name) {
                for (_, value) in series {
                    column.push(value);
                }
            }
            (name.clone(), column)
        })
        .collect();
    stats.sort_by(|a, b| {
        b.1.last
            .unwrap_or(f64::NEG_INFINITY)
            .partial_cmp(&a.1.last.unwrap_or(f64::NEG_INFINITY))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    report.push_str("  top emitters (final year):\n");
    for (name, column) in stats.into_iter().take(10) {
        report.push_str(&format!(
            "    - {}: last={}, min={}, max={}, numeric={}\n",
            name,
            format_stat(column.last),
            format_stat(column.min),
            format_stat(column.max),
            column.count
        ));
    }
}

fn sector_report(report: &mut String, table: &SectorAverageTable) {
    report.push_str("  kind: world sector averages\n");
    report.push_str(&format!("  rows: {}\n", table.rows().len()));
    report.push_str("  sectors:\n");
    for sector in table.sectors() {
        let mut column = ColumnStats::default();
        for (_, value) in table.sector_series(sector) {
            column.push(value);
        }
        report.push_str(&format!(
            "    - {}: min={}, max={}, numeric={}\n",
            sector,
            format_stat(column.min),
            format_stat(column.max),
            column.count
        ));
    }
}

fn parse_country_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn write_trend_csv(chart: &LineChart, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec!["Year".to_string()];
    header.extend(chart.series.iter().map(|series| series.name.clone()));
    writer.write_record(&header)?;

    let years: Vec<i32> = chart
        .series
        .first()
        .map(|series| series.points.iter().map(|(year, _)| *year).collect())
        .unwrap_or_default();
    for (row, year) in years.iter().enumerate() {
        let mut record = vec![year.to_string()];
        for series in &chart.series {
            record.push(
                series
                    .points
                    .get(row)
                    .map(|(_, value)| format!("{value:.3}"))
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Clone, Copy)]
enum ChartKind {
    Png,
    Svg,
}

fn chart_path(dir: &Path, stem: &str, kind: ChartKind) -> PathBuf {
    let ext = match kind {
        ChartKind::Png => "png",
        ChartKind::Svg => "svg",
    };
    dir.join(format!("{stem}.{ext}"))
}

fn render_chart_guard<F>(render: F) -> Result<(), String>
where
    F: FnOnce() -> Result<()>,
{
    panic::catch_unwind(panic::AssertUnwindSafe(|| {
        render().map_err(|e| format!("plotting error: {e}"))
    }))
    .map_err(|_| "plotting backend panicked".to_string())?
}

fn render_line_chart(spec: &LineChart, path: &Path, kind: ChartKind) -> Result<()> {
    match kind {
        ChartKind::Png => {
            let root = BitMapBackend::new(path, (1280, 760)).into_drawing_area();
            draw_line_chart(root, spec)
        }
        ChartKind::Svg => {
            let root = SVGBackend::new(path, (1280, 760)).into_drawing_area();
            draw_line_chart(root, spec)
        }
    }
}

fn render_doughnut(spec: &DoughnutChart, path: &Path, kind: ChartKind) -> Result<()> {
    match kind {
        ChartKind::Png => {
            let root = BitMapBackend::new(path, (960, 720)).into_drawing_area();
            draw_doughnut(root, spec)
        }
        ChartKind::Svg => {
            let root = SVGBackend::new(path, (960, 720)).into_drawing_area();
            draw_doughnut(root, spec)
        }
    }
}

fn line_chart_ranges(spec: &LineChart) -> (std::ops::Range<i32>, std::ops::Range<f64>) {
    let mut x_min = i32::MAX;
    let mut x_max = i32::MIN;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for series in &spec.series {
        for (year, value) in &series.points {
            x_min = x_min.min(*year);
            x_max = x_max.max(*year);
            if value.is_finite() {
                y_min = y_min.min(*value);
                y_max = y_max.max(*value);
            }
        }
    }
    if x_min > x_max {
        x_min = YEAR_MIN;
        x_max = YEAR_MAX;
    }
    if x_min == x_max {
        x_max += 1;
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }
    let y_low = y_min.min(0.0);
    let y_high = if y_max <= y_low { y_low + 1.0 } else { y_max };
    (x_min..x_max, y_low..y_high + (y_high - y_low) * 0.1)
}

fn draw_line_chart<DB>(root: DrawingArea<DB, Shift>, spec: &LineChart) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let (x_range, y_range) = line_chart_ranges(spec);

    let title_font = FontDesc::new(FontFamily::SansSerif, 24.0, FontStyle::Normal);
    let axis_font = FontDesc::new(FontFamily::SansSerif, 18.0, FontStyle::Normal);

    let mut chart = ChartBuilder::on(&root)
        .margin(25)
        .caption(&spec.title, title_font)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .x_label_formatter(&|v| v.to_string())
        .y_label_formatter(&|v| format!("{:.0}", v))
        .label_style(axis_font.clone().color(&BLACK.mix(0.85)))
        .axis_desc_style(axis_font)
        .draw()?;

    for (idx, series) in spec.series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        // NaN cells from the source would draw stray segments; skip them.
        let points: Vec<(i32, f64)> = series
            .points
            .iter()
            .copied()
            .filter(|(_, value)| value.is_finite())
            .collect();
        chart
            .draw_series(LineSeries::new(points.into_iter(), color.stroke_width(2)))?
            .label(series.name.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(2))
            });
    }

    if !spec.series.is_empty() {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.7))
            .border_style(&BLACK.mix(0.3))
            .label_font(FontDesc::new(FontFamily::SansSerif, 16.0, FontStyle::Normal).color(&BLACK))
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn draw_doughnut<DB>(root: DrawingArea<DB, Shift>, spec: &DoughnutChart) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let (width, height) = root.dim_in_pixel();

    let title_style = FontDesc::new(FontFamily::SansSerif, 24.0, FontStyle::Normal)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    root.draw(&Text::new(
        spec.title.clone(),
        (width as i32 / 2, 15),
        title_style,
    ))?;

    let cx = f64::from(width) * 0.38;
    let cy = f64::from(height) * 0.55;
    let radius = f64::from(width.min(height)) * 0.32;
    let inner = radius * spec.hole;
    let total: f64 = spec.values.iter().filter(|v| v.is_finite()).sum();

    // Start at twelve o'clock and sweep clockwise, like the dashboard pie.
    let mut start = -std::f64::consts::FRAC_PI_2;
    for (idx, value) in spec.values.iter().enumerate() {
        if total > 0.0 && value.is_finite() && *value > 0.0 {
            let sweep = value / total * std::f64::consts::TAU;
            let color = Palette99::pick(idx).to_rgba();
            root.draw(&Polygon::new(
                wedge_points(cx, cy, inner, radius, start, start + sweep),
                color.filled(),
            ))?;
            start += sweep;
        }
    }

    let legend_font = FontDesc::new(FontFamily::SansSerif, 15.0, FontStyle::Normal);
    let legend_x = (f64::from(width) * 0.70) as i32;
    let mut legend_y = (f64::from(height) * 0.28) as i32;
    for (idx, label) in spec.labels.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let value = spec.values.get(idx).copied().unwrap_or(0.0);
        let pct = if total > 0.0 { value / total * 100.0 } else { 0.0 };
        root.draw(&Rectangle::new(
            [(legend_x, legend_y), (legend_x + 14, legend_y + 14)],
            color.filled(),
        ))?;
        root.draw(&Text::new(
            format!("{label} ({pct:.1}%)"),
            (legend_x + 20, legend_y + 2),
            legend_font.clone().color(&BLACK),
        ))?;
        legend_y += 24;
    }

    let caption_style = FontDesc::new(FontFamily::SansSerif, 14.0, FontStyle::Normal)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    root.draw(&Text::new(
        spec.center_caption.clone(),
        (cx as i32, cy as i32),
        caption_style,
    ))?;

    root.present()?;
    Ok(())
}

// Wedge outline: outer arc forward, inner arc back, sampled about one
// degree per step so the polygon stays smooth at chart sizes.
fn wedge_points(cx: f64, cy: f64, inner: f64, outer: f64, a0: f64, a1: f64) -> Vec<(i32, i32)> {
    let steps = ((a1 - a0).abs().to_degrees().ceil() as usize).max(2);
    let mut points = Vec::with_capacity((steps + 1) * 2);
    for i in 0..=steps {
        let angle = a0 + (a1 - a0) * i as f64 / steps as f64;
        points.push((
            (cx + angle.cos() * outer) as i32,
            (cy + angle.sin() * outer) as i32,
        ));
    }
    for i in (0..=steps).rev() {
        let angle = a0 + (a1 - a0) * i as f64 / steps as f64;
        points.push((
            (cx + angle.cos() * inner) as i32,
            (cy + angle.sin() * inner) as i32,
        ));
    }
    points
}
