mod data;
mod session;

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;

use data::aggregate::{self, TimeUnit};
use data::export;
use data::filter::FilterSpec;
use data::search;
use session::DashboardSession;

/// Text/JSON report over a collisions CSV: the same filtered KPIs, trend
/// series and factor rankings the dashboard panels render.
#[derive(Parser, Debug)]
#[command(name = "collision-scope", version, about)]
struct Args {
    /// Path to the collisions CSV
    path: PathBuf,

    /// Inclusive start of the date filter (YYYY-MM-DD); defaults to the
    /// earliest date in the file when only --end-date is given
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Inclusive end of the date filter (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Borough to keep (repeatable); defaults to every borough in the file
    #[arg(long = "borough")]
    boroughs: Vec<String>,

    /// Vehicle type to keep (repeatable); no flag means no vehicle filter
    #[arg(long = "vehicle-type")]
    vehicle_types: Vec<String>,

    /// Bucket for the collision trend series
    #[arg(long, default_value = "hour")]
    unit: TimeUnit,

    /// How many contributing factors to list
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Case-insensitive term searched across every column
    #[arg(long)]
    search: Option<String>,

    /// Write the filtered rows to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Emit one JSON document instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut session = DashboardSession::new();
    session
        .load_path(&args.path)
        .with_context(|| format!("loading {}", args.path.display()))?;

    let spec = build_filter(&args, &session)?;
    session.set_filter(spec);
    let view = session.view().context("no dataset loaded")?;

    let kpis = aggregate::kpis(&view);
    let breakdown = aggregate::group_breakdown(&view);
    let series = aggregate::time_series(&view, args.unit);
    let factors = aggregate::top_factors(&view, args.top);
    let boroughs = aggregate::borough_comparison(&view);
    let matches = args
        .search
        .as_deref()
        .map(|term| search::search(&view, term).len());

    if args.json {
        let report = serde_json::json!({
            "kpis": kpis,
            "group_breakdown": breakdown,
            "time_series": { "unit": args.unit, "counts": series },
            "top_factors": factors,
            "borough_comparison": boroughs,
            "search_matches": matches,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&args, kpis, &breakdown, &series, &factors, &boroughs, matches);
    }

    if let Some(out) = &args.export {
        let file =
            File::create(out).with_context(|| format!("creating {}", out.display()))?;
        export::write_csv(&view, file)?;
        eprintln!("exported {} rows to {}", view.len(), out.display());
    }

    Ok(())
}

fn build_filter(args: &Args, session: &DashboardSession) -> Result<FilterSpec> {
    let dataset = session.current_dataset().context("no dataset loaded")?;

    let mut spec = FilterSpec::all_boroughs(dataset);
    if args.start_date.is_some() || args.end_date.is_some() {
        let (min, max) = dataset
            .date_bounds
            .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        spec.date_range = Some((
            args.start_date.unwrap_or(min),
            args.end_date.unwrap_or(max),
        ));
    }
    if !args.boroughs.is_empty() {
        spec.boroughs = args.boroughs.iter().cloned().collect();
    }
    spec.vehicle_types = args.vehicle_types.iter().cloned().collect();
    Ok(spec)
}

fn print_report(
    args: &Args,
    kpis: aggregate::Kpis,
    breakdown: &[(&str, u64)],
    series: &[(i32, u64)],
    factors: &[(String, u64)],
    boroughs: &std::collections::BTreeMap<String, aggregate::BoroughTotals>,
    matches: Option<usize>,
) {
    println!("Total collisions: {}", kpis.total_collisions);
    println!("Total injuries:   {}", kpis.total_injuries);
    println!("Total fatalities: {}", kpis.total_fatalities);

    println!("\nInjuries and fatalities by group:");
    for (label, count) in breakdown {
        println!("  {label:<20} {count}");
    }

    println!("\nCollisions by {:?}:", args.unit);
    for (value, count) in series {
        println!("  {value:>4}  {count}");
    }

    if !factors.is_empty() {
        println!("\nTop {} contributing factors:", factors.len());
        for (factor, count) in factors {
            println!("  {count:>5}  {factor}");
        }
    }

    if !boroughs.is_empty() {
        println!("\nBy borough:");
        for (borough, totals) in boroughs {
            println!(
                "  {borough:<15} {} injured, {} killed",
                totals.injuries, totals.fatalities
            );
        }
    }

    if let (Some(term), Some(n)) = (&args.search, matches) {
        println!("\nSearch {term:?}: {n} matching rows");
    }
}
