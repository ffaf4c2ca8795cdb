use std::path::PathBuf;
use std::process;
use std::time::Instant;

use chrono::Utc;
use clap::{ArgAction, Args, Parser, ValueEnum};
use serde::Serialize;

use sentinel_pipeline::analysis::group_stats;
use sentinel_pipeline::candidate_pipeline::{CandidatePipeline, PipelineResult};
use sentinel_pipeline::config::{load_thresholds, ThresholdConfig};
use sentinel_pipeline::pipelines::weekly_trend_digest::WeeklyTrendDigestPipeline;
use sentinel_pipeline::record_loader::{load_records_file, InputFormat};
use sentinel_pipeline::types::{
    Alert, CurrentWindow, PointComparison, SalesRecord, Severity, TrendQuery, WeeklyDetail,
    YoyComparison,
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "sentinel-server",
    about = "Detect declining weekly sales trends and report ranked alerts",
    version
)]
struct Cli {
    /// Weekly sales export (JSON envelope or CSV).
    input: PathBuf,

    /// Input format; guessed from the file extension when omitted.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// TOML file with threshold overrides (camelCase keys).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ThresholdOverrides,

    /// Comma-separated store codes to analyze.
    #[arg(long, value_delimiter = ',')]
    stores: Vec<String>,

    #[arg(long, value_enum, default_value_t = SeverityArg::Warning)]
    min_severity: SeverityArg,

    /// Keep only the N highest-ranked alerts.
    #[arg(long)]
    top: Option<usize>,

    #[arg(long, action = ArgAction::SetTrue, help = "Output the JSON response envelope")]
    json: bool,

    #[arg(short, long, action = ArgAction::SetTrue, help = "Enable debug logging")]
    verbose: bool,
}

/// Per-threshold overrides, applied on top of `--config` (or the defaults).
#[derive(Args)]
struct ThresholdOverrides {
    #[arg(long, allow_negative_numbers = true, help = "Normalized units slope floor")]
    slope_floor: Option<f64>,

    #[arg(long, help = "Minimum average weekly units for volume-sensitive rules")]
    min_volume: Option<f64>,

    #[arg(long, allow_negative_numbers = true, help = "YoY units change floor")]
    yoy_drop_floor: Option<f64>,

    #[arg(long, help = "Consecutive declining weeks that raise an alert")]
    min_weeks_down: Option<usize>,

    #[arg(long, help = "Return rate ceiling")]
    return_ratio_ceiling: Option<f64>,

    #[arg(long, allow_negative_numbers = true, help = "Normalized returns slope ceiling")]
    returns_slope_ceiling: Option<f64>,

    #[arg(long, allow_negative_numbers = true, help = "Week-over-week units change floor")]
    wow_drop_floor: Option<f64>,

    #[arg(long, allow_negative_numbers = true, help = "Same-week YoY units change floor")]
    yoy_same_week_drop_floor: Option<f64>,

    #[arg(long, help = "Trailing window length in weeks")]
    window_weeks: Option<usize>,
}

impl ThresholdOverrides {
    fn apply(&self, thresholds: &mut ThresholdConfig) {
        if let Some(v) = self.slope_floor {
            thresholds.slope_floor = v;
        }
        if let Some(v) = self.min_volume {
            thresholds.min_volume = v;
        }
        if let Some(v) = self.yoy_drop_floor {
            thresholds.yoy_drop_floor = v;
        }
        if let Some(v) = self.min_weeks_down {
            thresholds.min_weeks_down = v;
        }
        if let Some(v) = self.return_ratio_ceiling {
            thresholds.return_ratio_ceiling = v;
        }
        if let Some(v) = self.returns_slope_ceiling {
            thresholds.returns_slope_ceiling = v;
        }
        if let Some(v) = self.wow_drop_floor {
            thresholds.wow_drop_floor = v;
        }
        if let Some(v) = self.yoy_same_week_drop_floor {
            thresholds.yoy_same_week_drop_floor = v;
        }
        if let Some(v) = self.window_weeks {
            thresholds.window_weeks = v;
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
}

impl From<FormatArg> for InputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => InputFormat::Json,
            FormatArg::Csv => InputFormat::Csv,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SeverityArg {
    Warning,
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(value: SeverityArg) -> Self {
        match value {
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseJson<'a> {
    success: bool,
    generated_at: String,
    summary: SummaryJson,
    thresholds: &'a ThresholdConfig,
    alerts: Vec<AlertJson>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryJson {
    total_records_processed: usize,
    total_alerts: usize,
    critical_alerts: usize,
    warning_alerts: usize,
    groups_analyzed: usize,
    groups_skipped: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AlertJson {
    product_id: String,
    title: String,
    brand: String,
    store_code: String,
    severity: Severity,
    reasons: Vec<String>,
    current_window: CurrentWindowJson,
    yoy_comparison: YoyComparisonJson,
    point_comparison: PointComparisonJson,
    weekly_detail: Vec<WeeklyDetail>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrentWindowJson {
    avg_units_per_week: f64,
    total_units: u64,
    total_revenue: f64,
    total_returns: u64,
    return_rate: f64,
    units_trend_per_week_pct: f64,
    returns_trend_per_week_pct: f64,
    window_weeks: usize,
    start_week: String,
    end_week: String,
    start_date: String,
    end_date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct YoyComparisonJson {
    units_change: f64,
    revenue_change: f64,
    data_available: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PointComparisonJson {
    /// `null` when the previous week sold nothing.
    wow_units_change: Option<f64>,
    /// `null` without a matching prior-year week.
    yoy_same_week_units_change: Option<f64>,
    yoy_same_week_data_available: bool,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl From<&CurrentWindow> for CurrentWindowJson {
    fn from(w: &CurrentWindow) -> Self {
        Self {
            avg_units_per_week: round_to(w.avg_units_per_week, 2),
            total_units: w.total_units,
            total_revenue: round_to(w.total_revenue, 2),
            total_returns: w.total_returns,
            return_rate: round_to(w.return_rate, 4),
            // Trends are reported as percentages per week.
            units_trend_per_week_pct: round_to(w.units_trend_per_week * 100.0, 2),
            returns_trend_per_week_pct: round_to(w.returns_trend_per_week * 100.0, 2),
            window_weeks: w.window_weeks,
            start_week: w.start_week.clone(),
            end_week: w.end_week.clone(),
            start_date: w.start_date.clone(),
            end_date: w.end_date.clone(),
        }
    }
}

impl From<&YoyComparison> for YoyComparisonJson {
    fn from(y: &YoyComparison) -> Self {
        Self {
            units_change: round_to(y.units_change, 4),
            revenue_change: round_to(y.revenue_change, 4),
            data_available: y.data_available,
        }
    }
}

impl From<&PointComparison> for PointComparisonJson {
    fn from(p: &PointComparison) -> Self {
        Self {
            wow_units_change: p.wow_units_change.map(|v| round_to(v, 4)),
            yoy_same_week_units_change: p.yoy_same_week_units_change.map(|v| round_to(v, 4)),
            yoy_same_week_data_available: p.yoy_same_week_data_available,
        }
    }
}

impl From<&Alert> for AlertJson {
    fn from(a: &Alert) -> Self {
        Self {
            product_id: a.product_id.clone(),
            title: a.title.clone(),
            brand: a.brand.clone(),
            store_code: a.store_code.clone(),
            severity: a.severity,
            reasons: a.reasons.clone(),
            current_window: CurrentWindowJson::from(&a.current_window),
            yoy_comparison: YoyComparisonJson::from(&a.yoy_comparison),
            point_comparison: PointComparisonJson::from(&a.point_comparison),
            weekly_detail: a.weekly_detail.clone(),
        }
    }
}

fn count_severity(alerts: &[Alert], severity: Severity) -> usize {
    alerts.iter().filter(|a| a.severity == severity).count()
}

fn build_json<'a>(
    result: &'a PipelineResult<TrendQuery, Alert>,
    total_records: usize,
    groups: (usize, usize),
) -> ResponseJson<'a> {
    let alerts = &result.selected_candidates;
    ResponseJson {
        success: true,
        generated_at: Utc::now().to_rfc3339(),
        summary: SummaryJson {
            total_records_processed: total_records,
            total_alerts: alerts.len(),
            critical_alerts: count_severity(alerts, Severity::Critical),
            warning_alerts: count_severity(alerts, Severity::Warning),
            groups_analyzed: groups.0,
            groups_skipped: groups.1,
        },
        thresholds: &result.query.thresholds,
        alerts: alerts.iter().map(AlertJson::from).collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

fn format_change(change: Option<f64>) -> String {
    match change {
        Some(v) => format!("{:+.1}%", v * 100.0),
        None => "n/a".into(),
    }
}

fn print_human(
    result: &PipelineResult<TrendQuery, Alert>,
    total_records: usize,
    groups: (usize, usize),
    load_ms: u128,
    pipeline_ms: u128,
) {
    let rule = "\u{2550}".repeat(62);
    println!();
    println!("  \u{2554}{}\u{2557}", rule);
    println!("  \u{2551}{:^62}\u{2551}", "SALES SENTINEL - Weekly Trend Digest");
    println!("  \u{255a}{}\u{255d}", rule);
    println!();

    let alerts = &result.selected_candidates;
    println!(
        "  {} records processed  \u{00b7}  {} series analyzed  \u{00b7}  {} skipped (short history)",
        total_records, groups.0, groups.1
    );
    println!(
        "  {} alerts raised  \u{00b7}  {} below severity floor  \u{00b7}  {} shown ({} critical)",
        result.retrieved_candidates.len(),
        result.filtered_candidates.len(),
        alerts.len(),
        count_severity(alerts, Severity::Critical)
    );
    println!();

    if alerts.is_empty() {
        println!("  No declining trends detected. All clear!");
    } else {
        println!("  {:\u{2500}<64}", "");
        for (i, a) in alerts.iter().enumerate() {
            let icon = match a.severity {
                Severity::Critical => "!!",
                Severity::Warning => "! ",
                Severity::Info => "  ",
            };
            let yoy = if a.yoy_comparison.data_available {
                format_change(Some(a.yoy_comparison.units_change))
            } else {
                "n/a".into()
            };
            println!(
                "  {} {}. {:12} {:6} {:8}  avg {:.1}/wk  yoy {}  wow {}",
                icon,
                i + 1,
                a.product_id,
                a.store_code,
                a.severity.as_str(),
                a.current_window.avg_units_per_week,
                yoy,
                format_change(a.point_comparison.wow_units_change),
            );
            if !a.title.is_empty() {
                println!("       {}", a.title);
            }
            for reason in &a.reasons {
                println!("       - {}", reason);
            }
            println!();
        }
        println!("  {:\u{2500}<64}", "");
    }

    println!();
    println!(
        "  \u{23f1}  Input loaded in {}ms \u{00b7} Pipeline ran in {}ms \u{00b7} Total {}ms",
        load_ms,
        pipeline_ms,
        load_ms + pipeline_ms
    );
    println!();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn resolve_thresholds(cli: &Cli) -> ThresholdConfig {
    let mut thresholds = match &cli.config {
        Some(path) => match load_thresholds(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error loading thresholds from {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => ThresholdConfig::default(),
    };

    cli.overrides.apply(&mut thresholds);

    if let Err(e) = thresholds.validate() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    thresholds
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let thresholds = resolve_thresholds(&cli);

    let load_start = Instant::now();
    let records: Vec<SalesRecord> = match load_records_file(&cli.input, cli.format.map(Into::into)) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error loading {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    };
    let load_ms = load_start.elapsed().as_millis();
    let total_records = records.len();

    let mut query = TrendQuery::new(format!("digest-{}", Utc::now().timestamp()), thresholds);
    query.store_codes = cli
        .stores
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    query.min_severity = cli.min_severity.into();

    if !query.store_codes.is_empty() && !records.iter().any(|r| query.includes_store(&r.store_code)) {
        eprintln!("Error: no matching stores found in the data");
        eprintln!("  Requested: {:?}", query.store_codes);
        process::exit(1);
    }

    let groups = group_stats(
        records.iter().filter(|r| query.includes_store(&r.store_code)),
        query.thresholds.window_weeks,
    );

    let pipeline_start = Instant::now();
    let pipeline = match cli.top {
        Some(limit) => WeeklyTrendDigestPipeline::with_records_and_limit(records, limit),
        None => WeeklyTrendDigestPipeline::with_records(records),
    };
    let result = pipeline.execute(query).await;
    let pipeline_ms = pipeline_start.elapsed().as_millis();
    log::debug!("pipeline finished in {}ms", pipeline_ms);

    if cli.json {
        let response = build_json(&result, total_records, groups);
        match serde_json::to_string_pretty(&response) {
            Ok(body) => println!("{}", body),
            Err(e) => {
                eprintln!("Error serializing response: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_human(&result, total_records, groups, load_ms, pipeline_ms);
    }
}
