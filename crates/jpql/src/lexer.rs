//! Tokenizer for JPQL query strings.
//!
//! Splits a query into whitespace/punctuation-delimited tokens, each
//! carrying its byte offset in the source text. Keywords are not
//! distinguished here: they are identifiers matched case-insensitively by
//! the parser.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while, take_while_m_n},
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{map, opt, recognize, value},
    multi::many0_count,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::error::{ParseError, ParseResult};

/// The lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// An identifier or keyword: `Employee`, `WHERE`.
    Identifier,
    /// A numeric token: `42`, `1.5e3`, `10L`.
    Number,
    /// A single-quoted string token, quotes included: `'abc'`.
    String,
    /// An ISO-8601-like date, time, or timestamp token: `2020-01-31`.
    DateTime,
    /// A named or positional input parameter: `:id`, `?1`.
    Parameter,
    /// A punctuation or operator token: `.`, `<>`, `(`.
    Punct,
}

/// One lexical token with its position in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The lexical category.
    pub kind: TokenKind,
    /// The token exactly as written.
    pub text: String,
    /// Byte offset of the token's first character.
    pub offset: usize,
}

impl Token {
    /// Returns true if this token is the given keyword (case-insensitive).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Returns true if this token is the given punctuation.
    pub fn is_punct(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == punct
    }

    /// The contents of a string token with quotes removed and doubled
    /// quotes collapsed.
    pub fn string_value(&self) -> String {
        debug_assert_eq!(self.kind, TokenKind::String);
        self.text[1..self.text.len() - 1].replace("''", "'")
    }
}

// =============================================================================
// Token shapes
// =============================================================================

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_' || c == '$'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
    ))(input)
}

/// A single-quoted string; a doubled quote is an escaped quote.
fn quoted_string(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('\''),
        many0_count(alt((value((), tag("''")), value((), is_not("'"))))),
        char('\''),
    ))(input)
}

fn digits(count: usize) -> impl Fn(&str) -> IResult<&str, &str> {
    move |input| take_while_m_n(count, count, |c: char| c.is_ascii_digit())(input)
}

fn date_shape(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        digits(4),
        char('-'),
        digits(2),
        char('-'),
        digits(2),
    )))(input)
}

fn time_shape(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        digits(2),
        char(':'),
        digits(2),
        char(':'),
        digits(2),
        opt(preceded(char('.'), digit1)),
    )))(input)
}

fn datetime(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(tuple((date_shape, char('T'), time_shape))),
        date_shape,
        time_shape,
    ))(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        digit1,
        opt(preceded(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        opt(one_of("lLfFdD")),
    )))(input)
}

fn parameter(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(pair(char(':'), identifier)),
        recognize(pair(char('?'), digit1)),
    ))(input)
}

fn punct(input: &str) -> IResult<&str, &str> {
    alt((
        tag("<>"),
        tag("<="),
        tag(">="),
        tag("."),
        tag(","),
        tag("("),
        tag(")"),
        tag("="),
        tag("<"),
        tag(">"),
        tag("+"),
        tag("-"),
        tag("*"),
        tag("/"),
    ))(input)
}

fn raw_token(input: &str) -> IResult<&str, (TokenKind, &str)> {
    alt((
        map(quoted_string, |t| (TokenKind::String, t)),
        map(datetime, |t| (TokenKind::DateTime, t)),
        map(number, |t| (TokenKind::Number, t)),
        map(identifier, |t| (TokenKind::Identifier, t)),
        map(parameter, |t| (TokenKind::Parameter, t)),
        map(punct, |t| (TokenKind::Punct, t)),
    ))(input)
}

/// Tokenizes a JPQL query string.
///
/// Whitespace is skipped; every other character must begin a token.
/// Returns [`ParseError::UnterminatedString`] for an unclosed quote and
/// [`ParseError::UnexpectedCharacter`] for a character no token can start
/// with.
pub fn tokenize(query: &str) -> ParseResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = query;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(tokens);
        }
        let offset = query.len() - rest.len();

        match raw_token(rest) {
            Ok((next, (kind, text))) => {
                tokens.push(Token {
                    kind,
                    text: text.to_string(),
                    offset,
                });
                rest = next;
            }
            Err(_) => {
                let character = rest.chars().next().expect("non-empty input");
                if character == '\'' {
                    return Err(ParseError::UnterminatedString(offset));
                }
                return Err(ParseError::UnexpectedCharacter {
                    position: offset,
                    character,
                });
            }
        }
    }
}
