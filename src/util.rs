/// Wrap a possibly-negative index into `0..len`, so navigation can walk off
/// either end of the panel list and come back around. `len` must be non-zero.
pub fn wrap(index: isize, len: usize) -> usize {
    index.rem_euclid(len as isize) as usize
}

/// Get the last `n` characters of a string. The API hands us full URLs for
/// things like zones and radar stations, but only the tail is meaningful.
pub fn suffix(s: &str, n: usize) -> &str {
    let start = s
        .char_indices()
        .rev()
        .nth(n.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    if n == 0 {
        ""
    } else {
        &s[start..]
    }
}

/// Greedy word wrap. Words longer than the width get a line to themselves
/// rather than being split.
pub fn word_wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Convert a compass bearing to a 16-point direction label
pub fn direction_to_nsew(degrees: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW",
        "WSW", "W", "WNW", "NW", "NNW",
    ];
    let index = (degrees / 22.5).round() as isize;
    POINTS[wrap(index, POINTS.len())]
}
