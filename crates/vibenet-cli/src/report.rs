//! Read-only report over the last completed run.

use std::fmt::Write as _;

use vibenet_core::AppConfig;
use vibenet_sentiment::{ArtifactStore, DashboardSummary, MonthlyAggregate, RunStage};

/// Prints the dashboard summary and monthly table.
///
/// # Errors
///
/// Returns an error if the artifacts cannot be read.
pub(crate) fn run_report(config: &AppConfig) -> anyhow::Result<()> {
    let store = ArtifactStore::new(&config.data_dir);

    let manifest = match store.read_manifest()? {
        Some(m) if m.stage == RunStage::Complete => m,
        _ => {
            println!(
                "no completed run in {}; run `vibenet run <topic> <year>` first",
                store.dir().display()
            );
            return Ok(());
        }
    };

    let monthly = store.read_monthly()?;
    let posts = store.read_scored()?;
    let summary = DashboardSummary::build(&manifest.topic, manifest.year, &monthly, &posts);

    print!("{}", render_summary(&summary, &monthly));
    Ok(())
}

pub(crate) fn render_summary(summary: &DashboardSummary, monthly: &[MonthlyAggregate]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}: {}", summary.topic, summary.year, summary.signal);
    let _ = writeln!(out, "{}", summary.interpretation);
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<22}{}", "avg sentiment", fmt_score(summary.avg_sentiment));
    let _ = writeln!(
        out,
        "{:<22}{}",
        "weighted sentiment",
        fmt_score(summary.weighted_sentiment)
    );
    let _ = writeln!(out, "{:<22}{}", "mentions", summary.mentions);
    let _ = writeln!(
        out,
        "{:<22}+{} / ={} / -{}",
        "labels",
        summary.distribution.positive,
        summary.distribution.neutral,
        summary.distribution.negative
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<10}{:<10}{:<12}{:<10}POSTS",
        "MONTH", "MEAN", "ENGAGEMENT", "WEIGHTED"
    );
    for month in monthly {
        let _ = writeln!(
            out,
            "{:<10}{:<10}{:<12}{:<10}{}",
            month.period,
            fmt_score(month.mean_sentiment),
            month.total_engagement,
            fmt_score(month.weighted_sentiment),
            month.post_count
        );
    }
    out
}

fn fmt_score(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:+.3}")
    }
}
