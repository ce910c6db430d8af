//! The formatting step generated text goes through before it is returned.

use crate::error::FormatError;

/// Syntax profile the formatter parses generated text with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    #[default]
    Flow,
}

impl Syntax {
    pub fn name(&self) -> &'static str {
        match self {
            Syntax::Flow => "flow",
        }
    }
}

/// Re-prints generated source, or rejects it when it does not parse.
pub trait Formatter {
    fn format(&self, source: &str, syntax: Syntax) -> Result<String, FormatError>;
}

impl<F> Formatter for F
where
    F: Fn(&str, Syntax) -> Result<String, FormatError>,
{
    fn format(&self, source: &str, syntax: Syntax) -> Result<String, FormatError> {
        self(source, syntax)
    }
}

/// Checks that brackets and quotes balance, then normalizes whitespace:
/// trailing spaces are stripped, blank-line runs collapse to a single blank
/// line and the text ends with exactly one newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicFormatter;

impl Formatter for BasicFormatter {
    fn format(&self, source: &str, _syntax: Syntax) -> Result<String, FormatError> {
        check_balanced(source)?;
        Ok(normalize_whitespace(source))
    }
}

fn check_balanced(source: &str) -> Result<(), FormatError> {
    let mut open: Vec<(char, usize, usize)> = Vec::new();
    let mut quote: Option<(char, usize, usize)> = None;
    let mut escaped = false;
    let mut line = 1;
    let mut column = 0;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        column += 1;

        if let Some((q, start_line, start_column)) = quote {
            if c == '\n' {
                return Err(syntax_error(
                    start_line,
                    start_column,
                    format!("unterminated string literal opened with {q}"),
                ));
            }
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\n' => {
                line += 1;
                column = 0;
            }
            '\'' | '"' => quote = Some((c, line, column)),
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        line += 1;
                        column = 0;
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                let (start_line, start_column) = (line, column);
                chars.next();
                column += 1;
                let mut closed = false;
                while let Some(next) = chars.next() {
                    column += 1;
                    if next == '\n' {
                        line += 1;
                        column = 0;
                    } else if next == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        column += 1;
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(syntax_error(
                        start_line,
                        start_column,
                        "unterminated block comment".to_string(),
                    ));
                }
            }
            '(' | '[' | '{' => open.push((c, line, column)),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match open.pop() {
                    Some((opener, _, _)) if opener == expected => {}
                    Some((opener, open_line, open_column)) => {
                        return Err(syntax_error(
                            line,
                            column,
                            format!(
                                "unexpected `{c}`, `{opener}` opened at {open_line}:{open_column} is still open"
                            ),
                        ));
                    }
                    None => {
                        return Err(syntax_error(line, column, format!("unexpected `{c}`")));
                    }
                }
            }
            _ => {}
        }
    }

    if let Some((q, start_line, start_column)) = quote {
        return Err(syntax_error(
            start_line,
            start_column,
            format!("unterminated string literal opened with {q}"),
        ));
    }
    if let Some((opener, open_line, open_column)) = open.pop() {
        return Err(syntax_error(
            open_line,
            open_column,
            format!("`{opener}` is never closed"),
        ));
    }
    Ok(())
}

fn syntax_error(line: usize, column: usize, message: String) -> FormatError {
    FormatError::Syntax {
        line,
        column,
        message,
    }
}

fn normalize_whitespace(source: &str) -> String {
    let mut output = String::with_capacity(source.len());
    let mut pending_blank = false;

    for line in source.lines().map(str::trim_end) {
        if line.is_empty() {
            pending_blank = !output.is_empty();
            continue;
        }
        if pending_blank {
            output.push('\n');
            pending_blank = false;
        }
        output.push_str(line);
        output.push('\n');
    }

    output
}
