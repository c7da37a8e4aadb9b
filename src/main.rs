use anyhow::Result;
use clap::Parser;
use geoplot::geoplot_core::{
    AggregatorConfig, CanonicalTable, Cli, Commands, ExtractLimits, GeoAggregator, MediaFormat,
    SkipReason, discover_media_files, format_table, resolve_roots,
};
use simplelog::{CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, WriteLogger};
use std::fs::{self, File};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize loggers
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )];

    if cli.log {
        loggers.push(WriteLogger::new(
            cli.log_level,
            Config::default(),
            File::create("geoplot.log")?,
        ));
    }

    CombinedLogger::init(loggers)?;

    match cli.command {
        Commands::Scan {
            media_path,
            output,
            format,
            jobs,
            max_file_size,
            max_pixels,
            quiet,
        } => {
            let roots = resolve_roots(&media_path);
            if roots.is_empty() {
                anyhow::bail!("No valid media directories in '{}'", media_path);
            }

            let files = discover_media_files(&roots)?;
            let aggregator = GeoAggregator::new(AggregatorConfig {
                jobs,
                progress: !quiet,
                limits: ExtractLimits {
                    max_file_size,
                    max_pixels,
                },
            });

            let mut table = CanonicalTable::new();
            let mut skipped = Vec::new();
            for format in MediaFormat::ALL {
                for extension in format.extensions() {
                    let (partial, notices) = aggregator.aggregate_with_diagnostics(&files, extension);
                    table.append(partial);
                    skipped.extend(notices);
                }
            }
            table.sort_chronologically();

            let rendered = format_table(&table, &format)?;
            match &output {
                Some(path) => {
                    fs::write(path, format!("{}\n", rendered))?;
                    eprintln!("Wrote {} records to {}", table.len(), path.display());
                }
                None => println!("{}", rendered),
            }

            let failed: Vec<_> = skipped
                .iter()
                .filter(|n| matches!(n.reason, SkipReason::Failed(_)))
                .collect();
            eprintln!(
                "{} files with geodata, {} without, {} unreadable",
                table.len(),
                skipped.len() - failed.len(),
                failed.len()
            );
            for notice in failed {
                eprintln!("  {}: {}", notice.path.display(), notice.reason);
            }
            if let Some((lat, lon)) = table.centre() {
                eprintln!("Map centre: {:.6}, {:.6}", lat, lon);
            }
        }

        Commands::Inspect { file } => {
            let aggregator = GeoAggregator::new(AggregatorConfig::default());
            let record = aggregator.extract_one(&file)?;

            println!("File:      {}", record.source_path().display());
            println!("Format:    {}", record.format());
            println!(
                "Created:   {}",
                record.creation_timestamp().unwrap_or("-")
            );
            match record.geolocation() {
                Some(fix) => {
                    println!("Latitude:  {:.6}", fix.latitude);
                    println!("Longitude: {:.6}", fix.longitude);
                    println!("Altitude:  {:.1} m", fix.altitude);
                    let style = record.format().marker_style();
                    println!("Marker:    {} {}", style.colour, style.icon);
                }
                None => println!("No geodata"),
            }
        }
    }

    Ok(())
}
