//! Value shaping for table cells.
//!
//! Pure conversions from API values to display strings. Nothing here does IO.

use chrono::{Local, TimeZone};
use serde_json::Value;

const UNITS: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

/// Placeholder for an absent duration or id.
pub const DASH: &str = "—";

/// Human-readable byte count: `512 B`, `1.5 KB`, `3.2 GB`.
pub fn size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}B", UNITS[unit])
}

/// `yes` or `no`.
pub const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Render a *disable* flag as whether the thing is enabled.
pub const fn enabled(disable: bool) -> &'static str {
    yes_no(!disable)
}

/// Loose truthiness of an API value.
///
/// `true`, the number 1 and the strings `"1"`/`"true"` are yes; everything
/// else, including null, is no.
pub fn boolish(value: &Value) -> &'static str {
    let truthy = match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| (f - 1.0).abs() < f64::EPSILON),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true"),
        _ => false,
    };
    yes_no(truthy)
}

/// Local time `YYYY-MM-DD HH:MM:SS` for an epoch; empty for none or `<= 0`.
pub fn timestamp(epoch: Option<i64>) -> String {
    match epoch {
        Some(secs) if secs > 0 => Local
            .timestamp_opt(secs, 0)
            .earliest()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Ratio as a percentage with one decimal. Not clamped.
pub fn percentage(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Text bar graph of `used / total`, e.g. `[███░░░░░░░] 25.0%`.
///
/// Returns `n/a` when `total` is zero.
pub fn usage_bar(used: u64, total: u64, width: usize) -> String {
    if total == 0 {
        return "n/a".to_string();
    }
    let ratio = used as f64 / total as f64;
    let filled = ((ratio * width as f64).round().max(0.0) as usize).min(width);
    format!(
        "[{}{}] {:.1}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        ratio * 100.0
    )
}

/// Coarse duration: `3d 4h 5m`, `4h 5m` or `5m`. Zero is a dash.
pub fn duration(seconds: u64) -> String {
    if seconds == 0 {
        return DASH.to_string();
    }
    let days = seconds / 86_400;
    let hours = (seconds / 3_600) % 24;
    let minutes = (seconds / 60) % 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Default string form of any API value. Null is empty, strings unquoted.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Load averages as `a / b / c`, or `n/a` with fewer than three values.
pub fn load_avg(values: &[f64]) -> String {
    match values {
        [one, five, fifteen, ..] => format!("{one:.2} / {five:.2} / {fifteen:.2}"),
        _ => "n/a".to_string(),
    }
}

/// Comma list with a space after each comma.
pub fn content_list(content: &str) -> String {
    content
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Guest id, or a dash for none/zero.
pub fn id_or_dash(id: Option<u64>) -> String {
    match id {
        Some(id) if id > 0 => id.to_string(),
        _ => DASH.to_string(),
    }
}

/// Account expiry date, or `never` for none/zero.
pub fn expiry(epoch: Option<i64>) -> String {
    match epoch {
        Some(secs) if secs > 0 => timestamp(Some(secs)),
        _ => "never".to_string(),
    }
}

/// Cut `s` to at most `max` characters, ending in `…` when shortened.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
