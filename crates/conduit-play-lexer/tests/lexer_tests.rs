//! Tokenizer tests.
//!
//! Covers: token classification, keyword set, greedy operators, string
//! escapes, comments, layout tokens (newline/indent/dedent), implicit line
//! joining inside brackets, and lexical errors with positions.

use conduit_play_lexer::{tokenize, Token, TokenKind};
use conduit_play_types::LexError;
use pretty_assertions::assert_eq;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn lex(source: &str) -> Vec<Token> {
    tokenize(source).unwrap_or_else(|e| panic!("unexpected lex error: {e}"))
}

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).into_iter().map(|t| t.kind).collect()
}

fn pairs(source: &str) -> Vec<(TokenKind, String)> {
    lex(source).into_iter().map(|t| (t.kind, t.text)).collect()
}

// ─────────────────────────────────────────────────────────────────────
// Empty input
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_whitespace_and_comments_only_yield_no_tokens() {
    assert!(lex("").is_empty());
    assert!(lex("   \n\t\n").is_empty());
    assert!(lex("# just a comment\n    # indented comment\n\n").is_empty());
}

// ─────────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_equality_is_three_tokens() {
    assert_eq!(
        pairs("a == b"),
        vec![
            (TokenKind::Identifier, "a".to_string()),
            (TokenKind::Operator, "==".to_string()),
            (TokenKind::Identifier, "b".to_string()),
        ]
    );
}

#[test]
fn test_all_keywords_classified() {
    for kw in conduit_play_lexer::KEYWORDS {
        let tokens = lex(kw);
        assert_eq!(tokens.len(), 1, "keyword '{kw}'");
        assert_eq!(tokens[0].kind, TokenKind::Keyword, "keyword '{kw}'");
    }
}

#[test]
fn test_keywords_are_case_sensitive() {
    assert_eq!(kinds("true none Def"), vec![TokenKind::Identifier; 3]);
    assert_eq!(kinds("True None def"), vec![TokenKind::Keyword; 3]);
}

#[test]
fn test_identifiers_with_underscores_and_digits() {
    assert_eq!(
        pairs("_private snake_case2"),
        vec![
            (TokenKind::Identifier, "_private".to_string()),
            (TokenKind::Identifier, "snake_case2".to_string()),
        ]
    );
}

#[test]
fn test_numbers_have_at_most_one_decimal_point() {
    assert_eq!(
        pairs("42 3.14 1.2.3"),
        vec![
            (TokenKind::Number, "42".to_string()),
            (TokenKind::Number, "3.14".to_string()),
            (TokenKind::Number, "1.2".to_string()),
            (TokenKind::Punctuation, ".".to_string()),
            (TokenKind::Number, "3".to_string()),
        ]
    );
}

#[test]
fn test_minus_is_not_part_of_a_number() {
    assert_eq!(
        kinds("-5"),
        vec![TokenKind::Operator, TokenKind::Number]
    );
}

#[test]
fn test_all_operators() {
    let ops: Vec<String> = lex("== != <= >= // ** -> + - * / % = < > !")
        .into_iter()
        .inspect(|t| assert_eq!(t.kind, TokenKind::Operator))
        .map(|t| t.text)
        .collect();
    assert_eq!(
        ops,
        ["==", "!=", "<=", ">=", "//", "**", "->", "+", "-", "*", "/", "%", "=", "<", ">", "!"]
    );
}

#[test]
fn test_all_punctuation() {
    let puncts: Vec<String> = lex("( ) [ ] { } , . : @")
        .into_iter()
        .inspect(|t| assert_eq!(t.kind, TokenKind::Punctuation))
        .map(|t| t.text)
        .collect();
    assert_eq!(puncts, ["(", ")", "[", "]", "{", "}", ",", ".", ":", "@"]);
}

// ─────────────────────────────────────────────────────────────────────
// Strings
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_escaped_newline_becomes_real_newline() {
    let tokens = lex(r#""a\nb""#);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].text, "a\nb");
}

#[test]
fn test_string_escapes() {
    let tokens = lex(r#""tab\tcr\rslash\\quote\"" 'it\'s'"#);
    assert_eq!(tokens[0].text, "tab\tcr\rslash\\quote\"");
    assert_eq!(tokens[1].text, "it's");
}

#[test]
fn test_triple_quoted_docstring_spans_lines() {
    let tokens = lex("\"\"\"Add two\nnumbers\"\"\"\nx");
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].text, "Add two\nnumbers");
    assert_eq!(tokens[1].kind, TokenKind::Newline);
    assert_eq!(tokens[2].text, "x");
    assert_eq!(tokens[2].line(), 3);
}

#[test]
fn test_unterminated_string_reports_starting_line() {
    let err = tokenize("x = 1\ny = \"abc\nz = 2\n").unwrap_err();
    assert_eq!(err, LexError::UnterminatedString { line: 2, column: 5 });
}

#[test]
fn test_unterminated_string_at_end_of_input() {
    let err = tokenize("\"abc").unwrap_err();
    assert_eq!(err, LexError::UnterminatedString { line: 1, column: 1 });
}

// ─────────────────────────────────────────────────────────────────────
// Positions & errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_line_feed_resets_column() {
    let tokens = lex("a\n  b");
    let b = tokens.iter().find(|t| t.text == "b").unwrap();
    assert_eq!((b.line(), b.column()), (2, 3));
}

#[test]
fn test_unexpected_character() {
    let err = tokenize("x = 1\ny = $").unwrap_err();
    assert_eq!(
        err,
        LexError::UnexpectedCharacter {
            character: '$',
            line: 2,
            column: 5
        }
    );
    assert!(err.to_string().contains("line 2, column 5"));
}

#[test]
fn test_comment_discards_rest_of_line() {
    assert_eq!(
        pairs("x = 1 # set x\n"),
        vec![
            (TokenKind::Identifier, "x".to_string()),
            (TokenKind::Operator, "=".to_string()),
            (TokenKind::Number, "1".to_string()),
            (TokenKind::Newline, "\n".to_string()),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Layout
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_indent_and_dedent_around_block() {
    use TokenKind::*;
    let source = "def f():\n    return 1\nx = f()\n";
    assert_eq!(
        kinds(source),
        vec![
            Keyword, Identifier, Punctuation, Punctuation, Punctuation, Newline, Indent, Keyword,
            Number, Newline, Dedent, Identifier, Operator, Identifier, Punctuation, Punctuation,
            Newline,
        ]
    );
}

#[test]
fn test_open_blocks_close_at_end_of_input() {
    let k = kinds("if a:\n    if b:\n        c");
    assert_eq!(&k[k.len() - 2..], &[TokenKind::Dedent, TokenKind::Dedent]);
}

#[test]
fn test_blank_lines_inside_blocks_are_ignored() {
    let k = kinds("if a:\n    b\n\n    # note\n    c\n");
    assert_eq!(k.iter().filter(|k| **k == TokenKind::Indent).count(), 1);
    assert_eq!(k.iter().filter(|k| **k == TokenKind::Dedent).count(), 1);
    assert_eq!(k.iter().filter(|k| **k == TokenKind::Newline).count(), 3);
}

#[test]
fn test_line_feeds_inside_brackets_are_joined() {
    let k = kinds("d = {\n    \"a\": 1,\n    \"b\": 2,\n}\n");
    assert_eq!(k.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
    assert!(!k.contains(&TokenKind::Indent));
}

#[test]
fn test_uniformly_indented_snippet_uses_first_line_as_base() {
    let k = kinds("    x = 1\n    y = 2\n");
    assert!(!k.contains(&TokenKind::Indent));
    assert!(!k.contains(&TokenKind::Dedent));
}

#[test]
fn test_inconsistent_dedent_is_an_error() {
    let err = tokenize("if a:\n        b\n    c\n").unwrap_err();
    assert!(matches!(err, LexError::InconsistentDedent { line: 3, .. }));
}
