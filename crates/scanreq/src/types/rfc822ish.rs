// Grammar adapted from https://github.com/njsmith/posy/blob/main/src/vocab/rfc822ish.rs
// Licensed under MIT or Apache-2.0

use peg::{error::ParseError, str::LineCol};
use std::str::FromStr;

/// A parsed header block: the fields in the order they were written (names keep their original
/// spelling) and the optional body that follows the first empty line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RFC822ish {
    pub fields: Vec<(String, String)>,
    pub body: Option<String>,
}

// The METADATA format is "whatever the Python stdlib email.parser does". We are lenient about
// line endings and trailing newlines, but fail on an empty field name or a continuation line at
// the start of the input.
peg::parser! {
    grammar rfc822ish_parser() for str {
        rule line_ending()
            = quiet!{"\r\n" / "\r" / "\n"}
              / expected!("end of line")

        rule field_name() -> &'input str
            = quiet!{$(['\x21'..='\x39' | '\x3b'..='\x7e']+)}
              / expected!("field name")

        // Blanks after the colon are dropped, other whitespace is kept.
        rule field_separator()
            = ":" [' ' | '\t']*

        rule field_value_piece()
            = [^ '\r' | '\n']*

        rule continuation_line_ending()
            = quiet!{line_ending() [' ' | '\t']} / expected!("continuation line")

        // Continuation lines keep their embedded newlines.
        rule field_value() -> &'input str
            = $(field_value_piece() ** continuation_line_ending())

        rule field() -> (String, String)
            = n:field_name() field_separator() v:field_value()
                { (n.to_owned(), v.to_owned()) }

        rule fields() -> Vec<(String, String)>
            = field() ** line_ending()

        rule trailing_body() -> String
            = line_ending() line_ending() b:$([_]*) { b.to_owned() }

        pub rule rfc822ish() -> RFC822ish
            = fields:fields() body:(trailing_body()?) line_ending()?
                 { RFC822ish { fields, body } }
    }
}

impl FromStr for RFC822ish {
    type Err = ParseError<LineCol>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        rfc822ish_parser::rfc822ish(s)
    }
}

impl RFC822ish {
    /// All values of `key`, compared case-insensitively, in file order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}
