//! Host script tokenizer.

use crate::error::{SandboxError, SandboxResult};

/// Operators and punctuation, longest first so matching is greedy.
const SYMBOLS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "(", ")", "{", "}", "[", "]", ",", ".", ":",
    ";", "=", "<", ">", "+", "-", "*", "/", "%", "!",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Number(f64),
    Str(String),
    /// Identifiers and keywords alike; the parser tells them apart.
    Ident(String),
    Symbol(&'static str),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: u32,
}

/// Tokenize host script text. The result always ends with [`Tok::Eof`].
pub fn tokenize(code: &str) -> SandboxResult<Vec<Token>> {
    let chars: Vec<char> = code.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1u32;

    while pos < chars.len() {
        let ch = chars[pos];
        match ch {
            '\n' => {
                line += 1;
                pos += 1;
            }
            c if c.is_whitespace() => pos += 1,
            '/' if chars.get(pos + 1) == Some(&'/') => {
                while pos < chars.len() && chars[pos] != '\n' {
                    pos += 1;
                }
            }
            '"' | '\'' => {
                let start_line = line;
                pos += 1;
                let mut text = String::new();
                loop {
                    let Some(&c) = chars.get(pos) else {
                        return Err(syntax("unterminated string", start_line));
                    };
                    pos += 1;
                    match c {
                        '\n' => return Err(syntax("unterminated string", start_line)),
                        '\\' => {
                            let Some(&escaped) = chars.get(pos) else {
                                return Err(syntax("unterminated string", start_line));
                            };
                            pos += 1;
                            text.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                'r' => '\r',
                                other => other,
                            });
                        }
                        c if c == ch => break,
                        c => text.push(c),
                    }
                }
                tokens.push(Token {
                    tok: Tok::Str(text),
                    line: start_line,
                });
            }
            c if c.is_ascii_digit() => {
                let start = pos;
                let digits = |mut pos: usize| {
                    while chars.get(pos).is_some_and(char::is_ascii_digit) {
                        pos += 1;
                    }
                    pos
                };
                pos = digits(pos);
                // `xs[0].name`: the dot only belongs to the number before a digit.
                if chars.get(pos) == Some(&'.') && chars.get(pos + 1).is_some_and(char::is_ascii_digit) {
                    pos = digits(pos + 1);
                }
                let text: String = chars[start..pos].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| syntax(format!("invalid number '{text}'"), line))?;
                tokens.push(Token {
                    tok: Tok::Number(value),
                    line,
                });
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = pos;
                while pos < chars.len()
                    && (chars[pos].is_alphanumeric() || chars[pos] == '_' || chars[pos] == '$')
                {
                    pos += 1;
                }
                tokens.push(Token {
                    tok: Tok::Ident(chars[start..pos].iter().collect()),
                    line,
                });
            }
            _ => {
                let symbol = SYMBOLS.iter().find(|sym| {
                    sym.chars()
                        .enumerate()
                        .all(|(i, s)| chars.get(pos + i) == Some(&s))
                });
                match symbol {
                    Some(&sym) => {
                        pos += sym.chars().count();
                        tokens.push(Token {
                            tok: Tok::Symbol(sym),
                            line,
                        });
                    }
                    None => return Err(syntax(format!("unexpected character '{ch}'"), line)),
                }
            }
        }
    }

    tokens.push(Token { tok: Tok::Eof, line });
    Ok(tokens)
}

fn syntax(message: impl Into<String>, line: u32) -> SandboxError {
    SandboxError::Syntax {
        message: message.into(),
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(code: &str) -> Vec<Tok> {
        tokenize(code).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn test_symbols_are_greedy() {
        assert_eq!(
            toks("a === b !== c"),
            vec![
                Tok::Ident("a".into()),
                Tok::Symbol("==="),
                Tok::Ident("b".into()),
                Tok::Symbol("!=="),
                Tok::Ident("c".into()),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_and_lines() {
        let tokens = tokenize("// from a import b\nvar x = 1;\n").unwrap();
        assert_eq!(tokens[0].tok, Tok::Ident("var".into()));
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(toks(r#""a\nb\"c""#)[0], Tok::Str("a\nb\"c".into()));
    }

    #[test]
    fn test_member_after_index_keeps_dot() {
        assert_eq!(
            toks("a[0].b 2.5"),
            vec![
                Tok::Ident("a".into()),
                Tok::Symbol("["),
                Tok::Number(0.0),
                Tok::Symbol("]"),
                Tok::Symbol("."),
                Tok::Ident("b".into()),
                Tok::Number(2.5),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("var s = \"abc;\n").unwrap_err();
        assert!(matches!(err, SandboxError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("var x = 1;\nx # 2;").unwrap_err();
        assert!(matches!(err, SandboxError::Syntax { line: 2, .. }));
    }
}
