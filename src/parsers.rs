//! A module for splitting decoded lines into raw field tokens.
//!
//! The tokenizer follows the escaped-list convention used by CSV-family
//! files: a configurable separator, quote and escape character. Empty
//! tokens are preserved, quoted runs may contain the separator, and an
//! escape character makes the next character literal. Quotes may open and
//! close anywhere inside a field, so `a"b,c"d` is the single token `ab,cd`.

extern crate nom;

use nom::branch::alt;
use nom::character::complete::{anychar, char};
use nom::combinator::{map, opt, verify};
use nom::multi::fold_many0;
use nom::sequence::{delimited, preceded};
use nom::IResult;

enum Piece {
    Char(char),
    Quoted(String),
}

/// A reusable line tokenizer configured with the session's escape,
/// separator and quote characters.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    escape: char,
    separator: char,
    quote: char,
}

impl Tokenizer {
    pub fn new(escape: char, separator: char, quote: char) -> Self {
        Tokenizer {
            escape,
            separator,
            quote,
        }
    }

    /// A quoted run: everything up to the closing quote, escapes still
    /// active inside. An unterminated run extends to the end of the line.
    #[inline(always)]
    fn quoted<'a>(&self, i: &'a str) -> IResult<&'a str, String> {
        let escape = self.escape;
        let quote = self.quote;
        delimited(
            char(quote),
            fold_many0(
                alt((
                    preceded(char(escape), anychar),
                    verify(anychar, move |&c: &char| c != quote),
                )),
                String::new(),
                |mut run, c| {
                    run.push(c);
                    run
                },
            ),
            opt(char(quote)),
        )(i)
    }

    #[inline(always)]
    fn piece<'a>(&self, i: &'a str) -> IResult<&'a str, Piece> {
        let escape = self.escape;
        let separator = self.separator;
        let quote = self.quote;
        alt((
            map(preceded(char(escape), anychar), Piece::Char),
            map(|input| self.quoted(input), Piece::Quoted),
            map(
                verify(anychar, move |&c: &char| {
                    c != separator && c != quote && c != escape
                }),
                Piece::Char,
            ),
        ))(i)
    }

    /// One field: any number of pieces, stopping at an unescaped separator
    /// or the end of the line. Matching nothing yields the empty token.
    #[inline(always)]
    fn field<'a>(&self, i: &'a str) -> IResult<&'a str, String> {
        fold_many0(
            |input| self.piece(input),
            String::new(),
            |mut token, piece| {
                match piece {
                    Piece::Char(c) => token.push(c),
                    Piece::Quoted(quoted) => token.push_str(&quoted),
                }
                token
            },
        )(i)
    }

    #[inline(always)]
    fn read_separator<'a>(&self, i: &'a str) -> IResult<&'a str, char> {
        char(self.separator)(i)
    }

    /// Splits one decoded line into its raw tokens. A line always holds at
    /// least one token; `n` unescaped separators yield `n + 1` tokens.
    pub fn tokenize(&self, line: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut rest = line;
        loop {
            // `field` matches zero or more pieces, it cannot fail
            let (after, token) = self.field(rest).unwrap();
            tokens.push(token);
            match self.read_separator(after) {
                Ok((after_separator, _)) => rest = after_separator,
                Err(_) => break,
            }
        }
        tokens
    }
}
