//! UI helper functions

/// Word-wrap `text` to lines of at most `max_width` characters. Words longer
/// than the width are split.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            let rest = word.split_off(max_width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        if current_len == 0 {
            current_line = word.iter().collect();
            current_len = word.len();
        } else if current_len + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.extend(word.iter());
            current_len += 1 + word.len();
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line = word.iter().collect();
            current_len = word.len();
        }
    }

    if current_len > 0 {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}
