//! Terminal rendering of feed frames.
//!
//! Each chat entry becomes one line: badges in render order, then the
//! username in the entry's display color, then the message. Colors are
//! emitted as 24-bit ANSI escapes and can be turned off for pipes.

use frames::Frame;
use serde_json::Value;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const HEART: &str = "\u{2665}";

/// Parse `#rrggbb` (or `rrggbb`) into its components.
#[must_use]
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Badge labels for an entry's `badges` object, in render order MOD, #3, SUB.
#[must_use]
pub fn badge_labels(badges: &Value) -> Vec<&'static str> {
    let flag = |key: &str| badges.get(key).and_then(Value::as_bool).unwrap_or(false);
    let mut labels = Vec::with_capacity(3);
    if flag("moderator") {
        labels.push("MOD");
    }
    if flag("member") {
        labels.push("#3");
    }
    if flag("subscriber") {
        labels.push("SUB");
    }
    labels
}

/// One chat entry as a terminal line.
#[must_use]
pub fn render_entry(entry: &Value, color: bool) -> String {
    let username = entry.get("username").and_then(Value::as_str).unwrap_or("?");
    let message = entry.get("message").and_then(Value::as_str).unwrap_or("");
    let badges = entry.get("badges").map(badge_labels).unwrap_or_default();

    let mut line = String::new();
    for label in badges {
        if color {
            line.push_str(&format!("{DIM}[{label}]{RESET} "));
        } else {
            line.push_str(&format!("[{label}] "));
        }
    }

    let rgb = entry.get("color").and_then(Value::as_str).and_then(parse_hex_color);
    match (color, rgb) {
        (true, Some((r, g, b))) => line.push_str(&format!("{BOLD}\x1b[38;2;{r};{g};{b}m{username}{RESET}")),
        (true, None) => line.push_str(&format!("{BOLD}{username}{RESET}")),
        (false, _) => line.push_str(username),
    }
    line.push_str(": ");
    line.push_str(message);
    line
}

/// Lines to print for one frame from the event stream. Frames that carry
/// nothing worth showing yield no lines.
#[must_use]
pub fn render_frame(frame: &Frame, color: bool) -> Vec<String> {
    match frame.syscall.as_str() {
        frames::CHAT_ENTRY => vec![render_entry(&frame.data, color)],
        frames::FEED_SNAPSHOT => {
            let mut lines = Vec::new();
            if let Some(controls) = frame.data.get("controls") {
                lines.push(render_controls(controls));
            }
            if let Some(entries) = frame.data.get("entries").and_then(Value::as_array) {
                lines.extend(entries.iter().map(|e| render_entry(e, color)));
            }
            lines
        }
        frames::HEART_SPAWN => {
            let origin = frame.data_str("origin").unwrap_or("auto");
            if color {
                vec![format!("\x1b[38;2;255;64;129m{HEART}{RESET} {DIM}({origin}){RESET}")]
            } else {
                vec![format!("{HEART} ({origin})")]
            }
        }
        frames::CONTROL_CHANGED => vec![render_controls(&frame.data)],
        _ => Vec::new(),
    }
}

/// Panel parameters on one line.
#[must_use]
pub fn render_controls(controls: &Value) -> String {
    let num = |key: &str| controls.get(key).and_then(Value::as_u64).unwrap_or(0);
    let mood = controls.get("mood").and_then(Value::as_str).unwrap_or("?");
    let hearts = match num("heart_cadence_ms") {
        0 => "off".to_owned(),
        ms => format!("{ms}ms"),
    };
    format!("-- cadence {}ms, hearts {hearts}, mood {mood} --", num("cadence_ms"))
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
