//! Wheel colours and label wrapping

/// Segment colours, cycled by segment index
pub const PALETTE: [&str; 8] = [
    "#ff6b6b", "#feca57", "#48dbfb", "#1dd1a1", "#ff9ff3", "#54a0ff", "#5f27cd", "#ff9f43",
];

pub const TEXT_COLOR: &str = "#1e1e2e";
pub const HUB_COLOR: &str = "#ffffff";
pub const RIM_COLOR: &str = "#2d3436";
pub const POINTER_COLOR: &str = "#e84118";
pub const EMPTY_COLOR: &str = "#dfe6e9";

/// Lines per label before the rest collapses into one ellipsized line
pub const MAX_LABEL_LINES: usize = 3;
pub const ELLIPSIS: char = '…';

/// Colour of segment `index`
pub fn segment_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Width of rendered text in the current font
pub trait TextMeasure {
    fn measure_text(&self, text: &str) -> f64;
}

/// Greedy word wrap to `max_width`. Lines past the third are joined into a
/// single line, trimmed a character at a time until it fits with an ellipsis.
pub fn wrap_label<M: TextMeasure + ?Sized>(measure: &M, text: &str, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure.measure_text(&candidate) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > MAX_LABEL_LINES {
        let tail = lines.split_off(MAX_LABEL_LINES - 1).join(" ");
        lines.push(ellipsize(measure, &tail, max_width));
    }
    lines
}

fn ellipsize<M: TextMeasure + ?Sized>(measure: &M, text: &str, max_width: f64) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    loop {
        let mut candidate: String = chars.iter().collect::<String>().trim_end().to_string();
        candidate.push(ELLIPSIS);
        if chars.is_empty() || measure.measure_text(&candidate) <= max_width {
            return candidate;
        }
        chars.pop();
    }
}
