use crate::types::{Stat, StatValues};

/// Render an integer with English thousands separators: `1234567` → `1,234,567`.
pub fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Render a delta with an explicit sign. Zero is `±0`.
pub fn format_delta(n: i64) -> String {
    if n == 0 {
        "±0".to_string()
    } else {
        format!("{n:+}")
    }
}

/// Build the post body: one `"<label>: <value> (<delta>)"` line per stat, in
/// config order. Names missing from either map count as zero.
pub fn format_post(current: &StatValues, previous: &StatValues, stats: &[Stat]) -> String {
    stats
        .iter()
        .map(|stat| {
            let now = current.get(&stat.name).copied().unwrap_or(0);
            let before = previous.get(&stat.name).copied().unwrap_or(0);
            format!(
                "{}: {} ({})",
                stat.display,
                format_number(now),
                format_delta(now.saturating_sub(before))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
