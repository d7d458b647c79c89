//! Small text-scanning utilities shared by the line-oriented rules.
//!
//! The string masker is a character state machine over single-, double-,
//! and backtick-delimited spans (backtick spans may cross lines, as Go raw
//! strings do). Masked output keeps every line the same length so byte
//! columns stay valid.

/// Replace the contents of string literals with spaces, line by line.
/// Delimiters are kept so the shape of the code is preserved.
pub fn mask_strings(text: &str) -> Vec<String> {
    let mut masked = Vec::new();
    let mut state = MaskState::default();

    for line in text.lines() {
        masked.push(state.mask_line(line));
    }

    masked
}

#[derive(Default)]
struct MaskState {
    /// Set when inside a multi-line backtick string.
    in_backtick: bool,
}

impl MaskState {
    fn mask_line(&mut self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut delimiter: Option<char> = if self.in_backtick { Some('`') } else { None };
        let mut escaped = false;

        for c in line.chars() {
            match delimiter {
                Some(d) => {
                    if escaped {
                        escaped = false;
                        out.push(' ');
                    } else if c == '\\' && d != '`' {
                        escaped = true;
                        out.push(' ');
                    } else if c == d {
                        delimiter = None;
                        out.push(c);
                    } else {
                        out.push(' ');
                    }
                }
                None => {
                    if c == '"' || c == '\'' || c == '`' {
                        delimiter = Some(c);
                    }
                    out.push(c);
                }
            }
        }

        // Only backtick spans survive the end of a line; quote spans are
        // implicitly closed (a lone apostrophe must not poison the rest of
        // the file).
        self.in_backtick = delimiter == Some('`');
        out
    }
}

/// Find the line index of the closing brace matching the first `{` at or
/// after `start`, over string-masked lines. Returns `None` when the block
/// never closes (truncated file).
pub fn find_block_end(masked: &[String], start: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut opened = false;

    for (idx, line) in masked.iter().enumerate().skip(start) {
        for c in line.chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => {
                    depth -= 1;
                    if opened && depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
    }

    None
}

/// Find the last line of an indentation-delimited block (python): the block
/// runs until the first non-blank line indented at or left of `head_indent`.
pub fn find_indent_block_end(lines: &[&str], start: usize, head_indent: usize) -> usize {
    let mut end = start;
    for (idx, line) in lines.iter().enumerate().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        if indent <= head_indent {
            break;
        }
        end = idx;
    }
    end
}

/// Shannon entropy of a string in bits per character.
pub fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut counts = std::collections::HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0usize) += 1;
    }

    let len = s.chars().count() as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_double_quoted() {
        let masked = mask_strings("let q = \"SELECT 18\"; val = 999;");
        assert_eq!(masked[0], "let q = \"         \"; val = 999;");
    }

    #[test]
    fn test_mask_backtick_multiline() {
        let masked = mask_strings("q := `SELECT *\nFROM t WHERE x = 1`\nval := 999\n");
        assert!(!masked[0].contains("SELECT"));
        assert!(!masked[1].contains('1'));
        assert!(masked[2].contains("999"));
    }

    #[test]
    fn test_mask_escaped_quote() {
        let masked = mask_strings(r#"s = "he said \"42\"" + 7"#);
        assert!(!masked[0].contains("42"));
        assert!(masked[0].contains('7'));
    }

    #[test]
    fn test_find_block_end() {
        let masked = mask_strings("function f() {\n  if (x) {\n    y();\n  }\n}\nrest();\n");
        assert_eq!(find_block_end(&masked, 0), Some(4));
    }

    #[test]
    fn test_find_block_end_unclosed() {
        let masked = mask_strings("function f() {\n  y();\n");
        assert_eq!(find_block_end(&masked, 0), None);
    }

    #[test]
    fn test_find_indent_block_end() {
        let source = "def f():\n    a = 1\n\n    b = 2\nc = 3\n";
        let lines: Vec<&str> = source.lines().collect();
        assert_eq!(find_indent_block_end(&lines, 0, 0), 3);
    }

    #[test]
    fn test_shannon_entropy() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert_eq!(shannon_entropy("aaaa"), 0.0);
        // Uniform over 4 symbols = 2 bits/char.
        assert!((shannon_entropy("abcd") - 2.0).abs() < 1e-9);
        // A realistic random key clears 4.5; repeated text does not.
        assert!(shannon_entropy("kX9#mP2$vL5@qR8!wT3%yU6^zA1&bC4g") > 4.5);
        assert!(shannon_entropy("aaaaaaaabbbbbbbbaaaaaaaabbbbbbbb") < 2.0);
    }
}
