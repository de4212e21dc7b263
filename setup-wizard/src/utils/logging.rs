// Logging utilities
// Structured logging with JSON and human-readable formats
//
// Messages follow the `[PHASE: <phase>] [STEP: <step>] text` convention; the prefix is
// lifted out into dedicated fields before a line is written.

use log::Level;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Parse phase and step from log message
/// Extracts [PHASE: ...] and [STEP: ...] patterns
pub fn parse_log_metadata(message: &str) -> (Option<String>, Option<String>, String) {
    let (phase, rest) = extract_tag(message, "[PHASE:");
    let (step, rest) = extract_tag(&rest, "[STEP:");
    (phase, step, rest)
}

fn extract_tag(message: &str, open: &str) -> (Option<String>, String) {
    let Some(start) = message.find(open) else {
        return (None, message.to_string());
    };
    let Some(len) = message[start..].find(']') else {
        return (None, message.to_string());
    };
    let value = message[start + open.len()..start + len].trim().to_string();
    let cleaned = format!("{} {}", &message[..start], &message[start + len + 1..])
        .trim()
        .to_string();
    (Some(value), cleaned)
}

/// Format log entry as one JSON line
pub fn format_json_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_entry = json!({
        "timestamp": timestamp,
        "level": level.as_str(),
        "target": target,
        "message": message,
    });

    if let Some(phase) = phase {
        log_entry["phase"] = json!(phase);
    }

    if let Some(step) = step {
        log_entry["step"] = json!(step);
    }

    serde_json::to_string(&log_entry).unwrap_or_else(|_| "{}".to_string())
}

/// Format log entry as human-readable text
pub fn format_human_readable_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_line = format!("[{}] [{}]", timestamp, level.as_str());

    if let Some(phase) = phase {
        log_line.push_str(&format!(" [PHASE: {}]", phase));
    }

    if let Some(step) = step {
        log_line.push_str(&format!(" [STEP: {}]", step));
    }

    log_line.push_str(&format!(" [{}] {}", target, message));
    log_line
}

/// `(json_log, text_log)` file paths for a run started at `stamp`.
pub fn log_file_paths(log_dir: &Path, stamp: &str) -> (PathBuf, PathBuf) {
    (
        log_dir.join(format!("installer-{}.log", stamp)),
        log_dir.join(format!("installer-{}.txt", stamp)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_phase_and_step() {
        let (phase, step, msg) =
            parse_log_metadata("[PHASE: copy] [STEP: chunk] 42% complete");
        assert_eq!(phase.as_deref(), Some("copy"));
        assert_eq!(step.as_deref(), Some("chunk"));
        assert_eq!(msg, "42% complete");
    }

    #[test]
    fn parse_without_tags_keeps_message() {
        let (phase, step, msg) = parse_log_metadata("plain message");
        assert!(phase.is_none());
        assert!(step.is_none());
        assert_eq!(msg, "plain message");
    }

    #[test]
    fn parse_ignores_unterminated_tag() {
        let (phase, _, msg) = parse_log_metadata("[PHASE: wizard no close");
        assert!(phase.is_none());
        assert_eq!(msg, "[PHASE: wizard no close");
    }

    #[test]
    fn json_line_carries_metadata() {
        let line = format_json_log(
            "2025-01-01T00:00:00Z",
            Level::Info,
            "setup_wizard::wizard",
            "advanced",
            Some("wizard"),
            None,
        );
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["level"], "INFO");
        assert_eq!(v["phase"], "wizard");
        assert!(v.get("step").is_none());
    }

    #[test]
    fn human_line_layout() {
        let line = format_human_readable_log(
            "t",
            Level::Warn,
            "tgt",
            "msg",
            Some("install"),
            Some("chmod"),
        );
        assert_eq!(line, "[t] [WARN] [PHASE: install] [STEP: chmod] [tgt] msg");
    }

    #[test]
    fn log_files_share_stamp() {
        let (json, txt) = log_file_paths(Path::new("/tmp/x"), "2025-01-01-000000");
        assert_eq!(json, Path::new("/tmp/x/installer-2025-01-01-000000.log"));
        assert_eq!(txt, Path::new("/tmp/x/installer-2025-01-01-000000.txt"));
    }
}
