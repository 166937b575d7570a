//! ROAS CLI binary.
//!
//! Trains per-channel models from a CSV export and serves predictions from
//! the persisted artifacts.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use roas::data::CsvRecordSource;
use roas::output::{ExportFormat, Exporter, format_currency, format_roas};
use roas::{Channel, PredictionRequest, PredictionResponse, PredictionService, RoasConfig, Trainer};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roas")]
#[command(about = "Per-channel ROAS prediction", long_about = None)]
#[command(version)]
struct Cli {
    /// CSV export of daily campaign metrics
    #[arg(long, global = true, default_value = "data/campaigns.csv")]
    data: PathBuf,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the model directory
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Override the lookback window in days
    #[arg(long, global = true)]
    lookback: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Markdown,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Train, select and persist one model per channel
    Train {
        /// Report format
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Predict ROAS for a campaign
    Predict {
        /// Campaign identifier
        campaign_id: String,

        /// Channel (google_ads or meta_ads)
        #[arg(long)]
        channel: String,

        /// Planned impressions
        #[arg(long, default_value = "0")]
        impressions: f64,

        /// Planned clicks
        #[arg(long, default_value = "0")]
        clicks: f64,

        /// Planned spend
        #[arg(long, default_value = "0")]
        cost: f64,

        /// Day of week, 1 = Sunday through 7 = Saturday
        #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=7))]
        day_of_week: u32,

        /// Month, 1 through 12
        #[arg(long, default_value = "11", value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// List campaigns by historical ROAS
    Top {
        /// Restrict to one channel
        #[arg(long)]
        channel: Option<String>,

        /// Number of campaigns
        #[arg(long, default_value = "10")]
        top_n: usize,

        /// Export as csv or json instead of a table
        #[arg(long)]
        export: Option<String>,
    },

    /// Show how each channel is served
    Summary,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roas=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RoasConfig::from_json_file(path)?,
        None => RoasConfig::default(),
    };
    if let Some(dir) = &cli.model_dir {
        config = config.with_model_dir(dir);
    }
    if let Some(days) = cli.lookback {
        config = config.with_lookback_days(days);
    }
    config.validate()?;
    debug!(?config, "configuration");

    let source = Arc::new(CsvRecordSource::new(&cli.data));

    match cli.command {
        Commands::Train { format } => train(config, source, format)?,
        Commands::Predict {
            campaign_id,
            channel,
            impressions,
            clicks,
            cost,
            day_of_week,
            month,
            json,
        } => {
            let request = PredictionRequest::new(campaign_id, channel)
                .with_traffic(impressions, clicks, cost)
                .with_date(day_of_week, month);
            predict(PredictionService::new(config, source), &request, json)?;
        }
        Commands::Top {
            channel,
            top_n,
            export,
        } => {
            let channel = channel.map(|c| c.parse::<Channel>()).transpose()?;
            let format = export.map(|f| f.parse::<ExportFormat>()).transpose()?;
            top(PredictionService::new(config, source), channel, top_n, format)?;
        }
        Commands::Summary => summary(PredictionService::new(config, source))?,
    }

    Ok(())
}

fn train(
    config: RoasConfig,
    source: Arc<CsvRecordSource>,
    format: ReportFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let lookback = config.lookback_days;
    let trainer = Trainer::new(config, source);

    let pb = ProgressBar::new(Channel::all().len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(StdDuration::from_millis(100));
    pb.set_message(format!("Training ({} day lookback)...", lookback));

    let report = match trainer.train_all_with(lookback, |channel, outcome| {
        pb.set_message(format!("{}: {}", channel.as_str(), outcome.status()));
        pb.inc(1);
    }) {
        Ok(report) => {
            pb.finish_with_message(format!("Trained {} channel(s)", report.trained_count()));
            report
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    match format {
        ReportFormat::Text => println!("{}", report.to_ascii_table()),
        ReportFormat::Markdown => println!("{}", report.to_markdown()),
        ReportFormat::Json => println!("{}", report.to_json()?),
        ReportFormat::Csv => print!("{}", report.export_to_string(ExportFormat::Csv)?),
    }
    println!("Metrics saved: {}", trainer.store().report_path().display());

    Ok(())
}

fn predict(
    service: PredictionService,
    request: &PredictionRequest,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = service.predict(request)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match response {
        PredictionResponse::Unrecognized { error } => return Err(error.into()),
        PredictionResponse::Prediction(p) => {
            println!("\nROAS Prediction: {} ({})", p.campaign_id, p.channel.name());
            println!("{}", "=".repeat(60));
            println!("  Predicted ROAS:  {}", format_roas(p.predicted_roas));
            println!("  Method:          {:?}", p.method);
            println!("  Confidence:      {:?}", p.confidence);
            if let Some(kind) = p.model_kind {
                println!("  Model:           {}", kind.name());
            }
            if let Some(source) = p.source {
                println!("  Source:          {}", source);
            }
            if let Some(performance) = &p.model_performance {
                println!("  Performance:     {}", performance);
            }
            if let Some(note) = &p.note {
                println!("  Note:            {}", note);
            }
        }
    }

    Ok(())
}

fn top(
    service: PredictionService,
    channel: Option<Channel>,
    top_n: usize,
    format: Option<ExportFormat>,
) -> Result<(), Box<dyn std::error::Error>> {
    let campaigns = service.top_campaigns(channel, top_n)?;
    if let Some(format) = format {
        print!("{}", campaigns.export_to_string(format)?);
        return Ok(());
    }

    if campaigns.is_empty() {
        println!("No campaigns with spend in the lookback window.");
        return Ok(());
    }

    println!(
        "\n{:<40} {:<12} {:>8} {:>14} {:>14}",
        "Campaign", "Channel", "ROAS", "Cost", "Revenue"
    );
    println!("{}", "-".repeat(92));
    for c in &campaigns {
        let name: String = c.campaign_name.chars().take(40).collect();
        println!(
            "{:<40} {:<12} {:>8} {:>14} {:>14}",
            name,
            c.channel,
            format_roas(c.predicted_roas),
            format_currency(c.total_cost),
            format_currency(c.total_revenue)
        );
    }

    Ok(())
}

fn summary(service: PredictionService) -> Result<(), Box<dyn std::error::Error>> {
    println!("ROAS Prediction System");
    println!("======================\n");

    for s in service.summary()? {
        println!("{}", s.channel.name());
        println!("  Model:        {}", s.model);
        println!(
            "  Performance:  {}",
            s.performance.as_deref().unwrap_or("N/A")
        );
        if let Some(trained_at) = s.trained_at {
            println!("  Trained at:   {}", trained_at.format("%Y-%m-%d %H:%M:%S"));
        }
        println!("  Status:       {}\n", s.status);
    }

    Ok(())
}
