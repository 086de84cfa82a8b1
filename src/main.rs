mod cli;

use agrodash::config::Config;
use agrodash::datasources::{load_combined_many, load_weather};
use agrodash::logic::dashboard::{build_dashboard, Dashboard, DashboardOptions};
use agrodash::logic::normalize::parse_instant;
use agrodash::logic::summarize_daily;
use agrodash::models::{DailyWeather, Timeline};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => {
            let path = Config::write_default(cli.config).context("failed to write config")?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
        Commands::Check => {
            let config = Config::load(cli.config).context("configuration check failed")?;
            println!("Configuration OK");
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
        command => {
            let config = Config::load_or_default(cli.config).context("failed to load config")?;
            run(command, &config)
        }
    }
}

fn run(command: Commands, config: &Config) -> Result<()> {
    let tz = config.tz()?;

    match command {
        Commands::Report {
            inputs,
            weather,
            as_of,
            json,
        } => {
            let as_of = match as_of {
                Some(raw) => parse_instant(&raw, tz)
                    .with_context(|| format!("invalid --as-of '{}'", raw))?,
                None => Utc::now(),
            };
            let opts = DashboardOptions::from_config(config, as_of)?;
            let hours = match weather {
                Some(path) => read_weather(&path)?,
                None => Vec::new(),
            };
            let dashboard = build_dashboard(&read_combined(&inputs)?, &hours, &opts)?;
            if json {
                print_json(&dashboard)
            } else {
                print_report(&dashboard);
                Ok(())
            }
        }
        Commands::Spray {
            inputs,
            season,
            json,
        } => {
            let opts = DashboardOptions::from_config(config, Utc::now())?;
            let dashboard = build_dashboard(&read_combined(&inputs)?, &[], &opts)?;
            let seasons: Vec<_> = dashboard
                .seasons
                .into_iter()
                .filter(|s| season.as_deref().map_or(true, |id| s.season_uuid == id))
                .collect();
            if json {
                return print_json(&seasons);
            }
            for s in &seasons {
                println!("{} / {}", s.field_name, s.crop_name.as_deref().unwrap_or("-"));
                if s.spray_plans.is_empty() {
                    println!("  no spray forecast");
                }
                for plan in &s.spray_plans {
                    let windows: Vec<String> = plan
                        .windows
                        .iter()
                        .map(|w| format!("{} {}", w.label(), w.window_type))
                        .collect();
                    let windows = if windows.is_empty() {
                        "none".to_string()
                    } else {
                        windows.join(", ")
                    };
                    println!("  {}  {}", plan.date, windows);
                }
            }
            Ok(())
        }
        Commands::Clusters {
            inputs,
            radius,
            json,
        } => {
            let mut opts = DashboardOptions::from_config(config, Utc::now())?;
            opts.radius_km = Some(radius.unwrap_or(config.clustering.radius_km));
            let dashboard = build_dashboard(&read_combined(&inputs)?, &[], &opts)?;
            if json {
                print_json(&dashboard.partition)
            } else {
                print_clusters(&dashboard);
                Ok(())
            }
        }
        Commands::Timeline {
            inputs,
            stages,
            by_cluster,
            json,
        } => {
            let mut opts = DashboardOptions::from_config(config, Utc::now())?;
            if !stages.is_empty() {
                opts.enabled_stages = stages;
            }
            if by_cluster {
                opts.average_by_cluster = true;
                if opts.radius_km.is_none() {
                    opts.radius_km = Some(config.clustering.radius_km);
                }
            }
            let dashboard = build_dashboard(&read_combined(&inputs)?, &[], &opts)?;
            if json {
                print_json(&dashboard.timeline)
            } else {
                print_timeline(&dashboard.timeline, &dashboard.timezone);
                Ok(())
            }
        }
        Commands::Weather { input, json } => {
            let days = summarize_daily(&read_weather(&input)?, tz);
            if json {
                print_json(&days)
            } else {
                print_weather(&days);
                Ok(())
            }
        }
        // handled in main before any config is loaded
        Commands::Init | Commands::Check => Ok(()),
    }
}

fn read_combined(paths: &[PathBuf]) -> Result<agrodash::models::CombinedData> {
    load_combined_many(paths).with_context(|| {
        let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        format!("failed to read {}", names.join(", "))
    })
}

fn read_weather(path: &Path) -> Result<Vec<agrodash::models::HourlyWeather>> {
    load_weather(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(dashboard: &Dashboard) {
    println!(
        "AgroDash report as of {} ({})",
        dashboard.as_of.format("%Y-%m-%d %H:%M UTC"),
        dashboard.timezone
    );
    println!();
    print_clusters(dashboard);
    println!();
    print_timeline(&dashboard.timeline, &dashboard.timezone);

    if !dashboard.weather.is_empty() {
        println!();
        print_weather(&dashboard.weather);
    }

    println!();
    println!("Recommendations:");
    if dashboard.recommendations.is_empty() {
        println!("  none");
    }
    for rec in &dashboard.recommendations {
        println!("  {} [{}] {}", rec.severity.symbol(), rec.severity, rec.title);
        println!("      {}", rec.description);
        if let Some(action) = &rec.suggested_action {
            println!("      -> {}", action);
        }
    }
}

fn print_clusters(dashboard: &Dashboard) {
    let partition = &dashboard.partition;
    println!("Clusters: {}", partition.clusters.len());
    for cluster in &partition.clusters {
        let center = cluster
            .center()
            .map(|(lat, lon)| format!(" @ {:.4}, {:.4}", lat, lon))
            .unwrap_or_default();
        let names: Vec<&str> = cluster.members.iter().map(|m| m.name.as_str()).collect();
        println!("  {} ({} fields){}: {}", cluster.id, cluster.len(), center, names.join(", "));
    }
    if !partition.unlocated.is_empty() {
        let names: Vec<&str> = partition.unlocated.iter().map(|f| f.name.as_str()).collect();
        println!("  unlocated: {}", names.join(", "));
    }
}

fn print_timeline(timeline: &Timeline, timezone: &str) {
    if timeline.is_empty() {
        println!("Growth stages: no predictions");
        return;
    }
    let tz: chrono_tz::Tz = timezone.parse().unwrap_or(chrono_tz::UTC);
    println!("Growth stages ({}):", timeline.indices.join(", "));
    for row in &timeline.rows {
        println!("  {}", row.label);
        for bar in timeline.bars_for(&row.key) {
            let averaged = if bar.is_averaged() {
                format!(" (avg of {})", bar.source_count)
            } else {
                String::new()
            };
            println!(
                "    BBCH {:>3} {}  {} .. {}{}",
                bar.bbch_index,
                bar.stage_name,
                bar.start.with_timezone(&tz).format("%Y-%m-%d"),
                bar.end.with_timezone(&tz).format("%Y-%m-%d"),
                averaged
            );
        }
    }
}

fn print_weather(days: &[DailyWeather]) {
    fn fmt(v: Option<f64>) -> String {
        v.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".into())
    }

    println!("Weather:");
    println!("  date        hours  min    max    rain   wind   rh     wet");
    for day in days {
        println!(
            "  {}  {:>5}  {:>5}  {:>5}  {:>5}  {:>5}  {:>5}  {:>3}",
            day.date,
            day.hours,
            fmt(day.temp_min_c),
            fmt(day.temp_max_c),
            fmt(Some(day.total_precipitation_mm)),
            fmt(day.avg_wind_speed_m_s),
            fmt(day.avg_humidity_pct),
            day.leaf_wet_hours
        );
    }
}
