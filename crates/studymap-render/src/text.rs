use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f64,
    pub font_weight: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: 14.0,
            font_weight: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;

    fn line_height(&self, style: &TextStyle) -> f64 {
        self.measure("M", style).height
    }
}

/// Font-free measurer: every display column is `char_width_factor` em wide, so wide (CJK)
/// characters count double. Output is identical on every platform.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl DeterministicTextMeasurer {
    fn factors(&self) -> (f64, f64) {
        let cw = if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        };
        let lh = if self.line_height_factor == 0.0 {
            1.2
        } else {
            self.line_height_factor
        };
        (cw, lh)
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let (char_width_factor, line_height_factor) = self.factors();
        let font_size = style.font_size.max(1.0);

        let mut columns = 0usize;
        let mut line_count = 0usize;
        for line in text.split('\n') {
            columns = columns.max(UnicodeWidthStr::width(line));
            line_count += 1;
        }

        TextMetrics {
            width: columns as f64 * font_size * char_width_factor,
            height: line_count as f64 * font_size * line_height_factor,
            line_count,
        }
    }
}

/// Greedy word wrap to `max_width`. Words wider than the limit get a line of their own rather
/// than being split, so the box may overflow; explicit newlines are kept.
pub fn wrap_lines(
    text: &str,
    style: &TextStyle,
    max_width: f64,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    let mut out = Vec::new();
    for raw_line in text.split('\n') {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measurer.measure(&candidate, style).width <= max_width {
                current = candidate;
            } else {
                out.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_characters_count_double() {
        let m = DeterministicTextMeasurer::default();
        let style = TextStyle::default();
        let latin = m.measure("ab", &style).width;
        let cjk = m.measure("细胞", &style).width;
        assert_eq!(cjk, latin * 2.0);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let m = DeterministicTextMeasurer::default();
        let style = TextStyle {
            font_size: 10.0,
            ..TextStyle::default()
        };
        // 6px per column: 10 columns fit in 60px.
        let lines = wrap_lines("the cell membrane controls transport", &style, 60.0, &m);
        assert_eq!(lines, vec!["the cell", "membrane", "controls", "transport"]);
    }

    #[test]
    fn long_word_overflows_on_its_own_line() {
        let m = DeterministicTextMeasurer::default();
        let lines = wrap_lines("a photosynthesis b", &TextStyle::default(), 30.0, &m);
        assert_eq!(lines, vec!["a", "photosynthesis", "b"]);
    }
}
