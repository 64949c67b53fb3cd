// demos/map_report.rs
//
// Usage: cargo run --example map_report -- <monitoring.csv> <site_coordinates.csv> [config.json]
use hab_monitor::{HabMonitor, HabMonitorError, MonitorConfig};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=info (or debug) to see load and filter messages
    env_logger::init();

    let mut args = env::args().skip(1);
    let (Some(records), Some(coordinates)) = (args.next(), args.next()) else {
        eprintln!("usage: map_report <monitoring.csv> <site_coordinates.csv> [config.json]");
        std::process::exit(2);
    };
    let config = match args.next() {
        Some(path) => MonitorConfig::from_json_file(path).map_err(HabMonitorError::from)?,
        None => MonitorConfig::default(),
    };

    let mut monitor = HabMonitor::new(config)?;
    let dataset = monitor.load(&records, &coordinates)?;
    let report = dataset.report();
    println!(
        "Loaded {} records ({} without a site, {} with bad dates, {} without coordinates)",
        dataset.len(),
        report.dropped_missing_site,
        report.dropped_bad_dates,
        report.without_coordinates
    );

    let view = monitor.map_view().dataset(&dataset).call()?;
    println!("{} of {} records shown", view.shown, view.total);
    println!("{}", serde_json::to_string_pretty(&view)?);

    let trend = monitor.trend().dataset(&dataset).call()?;
    println!("{}", serde_json::to_string_pretty(&trend)?);

    Ok(())
}
