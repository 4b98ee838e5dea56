//! Terminal and JSON rendering of transitions and clip rankings.

use crate::error::Result;
use crate::pipeline::observer::TransitionObserver;
use crate::pipeline::single_shot::ClipReport;
use crate::pipeline::types::{RunSummary, TransitionEvent};
use owo_colors::OwoColorize;
use serde_json::json;
use std::io::{self, Write};

/// `Emotion → HAPPY`
pub fn format_transition(event: &TransitionEvent, color: bool) -> String {
    let label = event.label.as_str().to_uppercase();
    if color {
        format!("Emotion → {}", label.bold().green())
    } else {
        format!("Emotion → {}", label)
    }
}

/// One JSON object per transition, timestamp in RFC 3339.
pub fn transition_json(event: &TransitionEvent) -> serde_json::Value {
    json!({
        "label": event.label,
        "previous": event.previous,
        "confidence": event.confidence,
        "sequence": event.sequence,
        "timestamp": humantime::format_rfc3339_millis(event.timestamp).to_string(),
    })
}

/// Ranked percentages followed by the top emotion.
pub fn format_clip_report(report: &ClipReport, color: bool) -> String {
    let mut out = String::from("Detected emotions:\n");
    for prediction in &report.predictions {
        out.push_str(&format!(
            "{:>10}: {:.2}%\n",
            prediction.label.as_str(),
            prediction.confidence * 100.0
        ));
    }
    if let Some(top) = report.top() {
        let label = top.label.as_str();
        if color {
            out.push_str(&format!("\nTop emotion: {}\n", label.bold().green()));
        } else {
            out.push_str(&format!("\nTop emotion: {}\n", label));
        }
    }
    out
}

pub fn clip_json(report: &ClipReport) -> serde_json::Value {
    json!({
        "top": report.top().map(|p| &p.label),
        "predictions": report.predictions,
        "input_secs": report.input_duration.as_secs_f64(),
        "window_secs": report.window.as_secs_f64(),
    })
}

/// Short human summary of a finished run, for stderr.
pub fn format_summary(summary: &RunSummary) -> String {
    format!(
        "{} frames ({} silent, {} classified, {} skipped), {} transitions, last: {}",
        summary.frames,
        summary.silent,
        summary.classified,
        summary.skipped,
        summary.transitions,
        summary
            .last_label
            .as_ref()
            .map(|l| l.as_str())
            .unwrap_or("none"),
    )
}

/// Prints each transition to stdout, as text or JSON lines.
pub struct StdoutObserver {
    json: bool,
    color: bool,
}

impl StdoutObserver {
    pub fn new(json: bool, color: bool) -> Self {
        Self { json, color }
    }
}

impl TransitionObserver for StdoutObserver {
    fn on_transition(&mut self, event: &TransitionEvent) -> Result<()> {
        let line = if self.json {
            transition_json(event).to_string()
        } else {
            format_transition(event, self.color)
        };
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}
