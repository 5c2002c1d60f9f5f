//! Script line parser using nom
//!
//! One command per line, verb is case-insensitive:
//! ```text
//! SET <key> <value...>
//! GET <key> | PEEK <key> | DEL <key> | EXISTS <key>
//! LEN | KEYS | CLEAR | STATS
//! # comment
//! ```
//! A SET value runs to the end of the line and may contain spaces.

use nom::{
    bytes::complete::take_till1,
    character::complete::{space0, space1},
    combinator::{eof, rest},
    sequence::{preceded, terminated, tuple},
    IResult,
};

/// A parsed script command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert or overwrite a key
    Set {
        /// Cache key
        key: String,
        /// New value
        value: String,
    },
    /// Lookup, marks the key most-recently-used
    Get(String),
    /// Lookup without reordering
    Peek(String),
    /// Explicit removal
    Del(String),
    /// Membership test without reordering
    Exists(String),
    /// Number of cached entries
    Len,
    /// Keys from least- to most-recently-used
    Keys,
    /// Drop every entry
    Clear,
    /// Hit/miss counters
    Stats,
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

fn arg(input: &str) -> IResult<&str, &str> {
    preceded(space1, word)(input)
}

fn end(input: &str) -> IResult<&str, &str> {
    preceded(space0, eof)(input)
}

fn single_key(input: &str) -> IResult<&str, &str> {
    terminated(arg, end)(input)
}

fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
    tuple((arg, preceded(space1, rest)))(input)
}

fn wrong_args(verb: &str) -> String {
    format!(
        "wrong number of arguments for '{}' command",
        verb.to_ascii_lowercase()
    )
}

/// Parse one script line
///
/// # Returns
/// * `Ok(None)` - blank line or comment
/// * `Ok(Some(cmd))` - parsed command
/// * `Err(msg)` - malformed line
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (args, verb) = word(line).map_err(|e| format!("invalid command: {}", e))?;
    let verb_upper = verb.to_ascii_uppercase();

    let key = |ctor: fn(String) -> Command| {
        single_key(args)
            .map(|(_, key)| ctor(key.to_string()))
            .map_err(|_| wrong_args(verb))
    };
    let bare = |cmd: Command| end(args).map(|_| cmd).map_err(|_| wrong_args(verb));

    let cmd = match verb_upper.as_str() {
        "SET" => key_value(args)
            .map(|(_, (key, value))| Command::Set {
                key: key.to_string(),
                value: value.trim_end().to_string(),
            })
            .map_err(|_| wrong_args(verb))?,
        "GET" => key(Command::Get)?,
        "PEEK" => key(Command::Peek)?,
        "DEL" => key(Command::Del)?,
        "EXISTS" => key(Command::Exists)?,
        "LEN" => bare(Command::Len)?,
        "KEYS" => bare(Command::Keys)?,
        "CLEAR" => bare(Command::Clear)?,
        "STATS" => bare(Command::Stats)?,
        _ => return Err(format!("unknown command '{}'", verb)),
    };

    Ok(Some(cmd))
}
