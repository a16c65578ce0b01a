//! Delimiter collisions in generated Python f-strings.
//!
//! Before Python 3.12 an f-string replacement field may not reuse the literal's own quote
//! character: `f"got {data["key"]}"` ends the string at the inner `"` and the module no
//! longer parses. The synthesizer prompt forbids this and [`find_quote_collisions`] checks it.

/// One offending f-string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteCollision {
    /// 1-based line of the f-string
    pub line: usize,
    pub delimiter: char,
    /// Source line, trimmed
    pub snippet: String,
}

/// Scan Python source for single-line f-strings whose replacement fields use the
/// outer delimiter. Comments, plain strings and triple-quoted strings are skipped.
pub fn find_quote_collisions(code: &str) -> Vec<QuoteCollision> {
    let chars: Vec<char> = code.chars().collect();
    let mut collisions = Vec::new();
    let mut line = 1usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                line += 1;
                i += 1;
            }
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '\'' | '"' => {
                let prefix_f = is_fstring_prefix(&chars, i);
                let triple = i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c;
                if triple {
                    i = skip_triple(&chars, i + 3, c, &mut line);
                } else if prefix_f {
                    let (next, collided) = scan_fstring(&chars, i + 1, c);
                    if collided {
                        collisions.push(QuoteCollision {
                            line,
                            delimiter: c,
                            snippet: line_text(code, line),
                        });
                    }
                    i = next;
                } else {
                    i = skip_plain(&chars, i + 1, c);
                }
            }
            _ => i += 1,
        }
    }

    collisions
}

/// Whether the literal opening at `quote` carries an `f` prefix (alone or with `r`).
fn is_fstring_prefix(chars: &[char], quote: usize) -> bool {
    let mut start = quote;
    while start > 0 && chars[start - 1].is_ascii_alphabetic() {
        start -= 1;
    }
    // Letters glued to an identifier (e.g. `x_f"`) are not a prefix.
    if start > 0 && (chars[start - 1].is_ascii_alphanumeric() || chars[start - 1] == '_') {
        return false;
    }
    let prefix: String = chars[start..quote].iter().collect::<String>().to_ascii_lowercase();
    if prefix.len() > 2 || !prefix.chars().all(|p| matches!(p, 'f' | 'r' | 'b' | 'u')) {
        return false;
    }
    prefix.contains('f')
}

fn skip_triple(chars: &[char], mut i: usize, quote: char, line: &mut usize) -> usize {
    while i < chars.len() {
        if chars[i] == '\n' {
            *line += 1;
        }
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i] == quote
            && i + 2 < chars.len()
            && chars[i + 1] == quote
            && chars[i + 2] == quote
        {
            return i + 3;
        }
        i += 1;
    }
    i
}

fn skip_plain(chars: &[char], mut i: usize, quote: char) -> usize {
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '\n' => return i,
            ch if ch == quote => return i + 1,
            _ => i += 1,
        }
    }
    i
}

/// Returns the index after the literal and whether a field reused `quote`.
fn scan_fstring(chars: &[char], mut i: usize, quote: char) -> (usize, bool) {
    let mut depth = 0usize;
    let mut collided = false;

    while i < chars.len() {
        let ch = chars[i];
        if depth == 0 {
            match ch {
                '\\' => i += 2,
                '\n' => return (i, collided),
                '{' if chars.get(i + 1) == Some(&'{') => i += 2,
                '{' => {
                    depth = 1;
                    i += 1;
                }
                c if c == quote => return (i + 1, collided),
                _ => i += 1,
            }
        } else {
            match ch {
                '{' => {
                    depth += 1;
                    i += 1;
                }
                '}' => {
                    depth -= 1;
                    i += 1;
                }
                '\n' => return (i, collided),
                c if c == quote => {
                    collided = true;
                    // Skip the inner literal so its closing quote is not read as ours.
                    i += 1;
                    while i < chars.len() && chars[i] != quote && chars[i] != '\n' {
                        i += 1;
                    }
                    i += 1;
                }
                '\'' | '"' => {
                    i = skip_plain(chars, i + 1, ch);
                }
                _ => i += 1,
            }
        }
    }
    (i, collided)
}

fn line_text(code: &str, line: usize) -> String {
    code.lines()
        .nth(line.saturating_sub(1))
        .unwrap_or_default()
        .trim()
        .to_string()
}
