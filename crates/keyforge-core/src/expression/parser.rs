//! Parser for the built-in fallback expression syntax
//!
//! ```text
//! template := (text | block)*
//! block    := "#{" term ("+" term)* "}"
//! term     := root step*
//! root     := "#" ident | "@" ident | "'" chars "'" | int | ident
//! step     := "." ident | "?." ident | "['" chars "']"
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, anychar, char, digit1, multispace0},
    combinator::{all_consuming, cut, map, not, opt, recognize},
    error::{context, ContextError, ParseError as NomParseError},
    multi::{many0, many1_count, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

/// Top-level piece of an expression template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Block(Vec<Term>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub root: Root,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Root {
    /// `#p0`, `#a0`, `#arg0`
    Positional(usize),
    /// `#name`
    Variable(String),
    /// `#root`, `#this`
    Target,
    /// `@name`
    Singleton(String),
    Str(String),
    Int(i64),
    /// Bare identifier, read from the target
    Property(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Property { name: String, null_safe: bool },
    Index(String),
}

// ============================================================================
// Public API
// ============================================================================

/// Parse a full expression template
pub fn parse_template(input: &str) -> Result<Vec<Part>, String> {
    match all_consuming(many0(part::<nom::error::VerboseError<&str>>))(input) {
        Ok((_, parts)) => Ok(parts),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(nom::error::convert_error(input, e))
        }
        Err(nom::Err::Incomplete(_)) => Err("Incomplete input".to_string()),
    }
}

// ============================================================================
// Internal Parsers
// ============================================================================

fn part<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Part, E> {
    alt((map(block, Part::Block), map(text, Part::Text)))(input)
}

fn text<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    recognize(many1_count(preceded(not(tag("#{")), anychar)))(input)
        .map(|(rest, matched)| (rest, matched.to_string()))
}

fn block<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Vec<Term>, E> {
    let (input, _) = tag("#{")(input)?;
    context(
        "expression block",
        cut(terminated(
            separated_list1(delimited(multispace0, char('+'), multispace0), term),
            pair(multispace0, char('}')),
        )),
    )(input)
}

fn term<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Term, E> {
    let (input, _) = multispace0(input)?;
    let (input, root) = root(input)?;
    let (input, steps) = many0(step)(input)?;
    Ok((input, Term { root, steps }))
}

fn root<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Root, E> {
    alt((
        map(preceded(char('#'), identifier), variable_root),
        map(preceded(char('@'), identifier), |name| {
            Root::Singleton(name.to_string())
        }),
        map(quoted, Root::Str),
        int_literal,
        map(identifier, |name| Root::Property(name.to_string())),
    ))(input)
}

fn step<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Step, E> {
    alt((
        map(preceded(tag("?."), identifier), |name| Step::Property {
            name: name.to_string(),
            null_safe: true,
        }),
        map(preceded(char('.'), identifier), |name| Step::Property {
            name: name.to_string(),
            null_safe: false,
        }),
        map(delimited(char('['), quoted, char(']')), Step::Index),
    ))(input)
}

fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn quoted<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    delimited(char('\''), take_while(|c| c != '\''), char('\''))(input)
        .map(|(rest, s)| (rest, s.to_string()))
}

fn int_literal<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Root, E> {
    let (remaining, digits) = recognize(pair(opt(char('-')), digit1))(input)?;
    match digits.parse::<i64>() {
        Ok(i) => Ok((remaining, Root::Int(i))),
        Err(_) => Err(nom::Err::Error(E::from_error_kind(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// `#p0` / `#a0` / `#arg0` are positional; `#root` / `#this` the target
fn variable_root(name: &str) -> Root {
    if name == "root" || name == "this" {
        return Root::Target;
    }
    for prefix in ["arg", "p", "a"] {
        if let Some(n) = name.strip_prefix(prefix) {
            if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(i) = n.parse::<usize>() {
                    return Root::Positional(i);
                }
            }
        }
    }
    Root::Variable(name.to_string())
}
