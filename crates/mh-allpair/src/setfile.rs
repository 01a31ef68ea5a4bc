//! Set file reader.
//!
//! One set per line, tokens separated by whitespace. With ids enabled the
//! first token is the set id, otherwise the zero-based line number is. Every
//! other token is `<value>____<count>`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static RE_VALUE_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<value>.*)____(?P<count>[0-9]+)$").unwrap());

#[derive(Error, Debug)]
pub enum SetFileError {
    #[error("line {line}: incorrect value count pair: {token}")]
    BadToken { line: usize, token: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: u64,
}

/// One parsed line. `seq` is the position among non-blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRecord {
    pub seq: usize,
    pub id: String,
    pub values: Vec<String>,
}

pub fn parse_token(token: &str) -> Option<ValueCount> {
    let caps = RE_VALUE_COUNT.captures(token)?;
    let count = caps["count"].parse().ok()?;
    Some(ValueCount {
        value: caps["value"].to_string(),
        count,
    })
}

/// Parse one line; blank lines yield `None`.
pub fn parse_line(line: &str, line_no: usize, seq: usize, has_id: bool) -> Result<Option<SetRecord>, SetFileError> {
    let mut tokens = line.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return Ok(None);
    }
    let id = if has_id {
        tokens.next().unwrap_or_default().to_string()
    } else {
        line_no.to_string()
    };
    let values = tokens
        .map(|tok| {
            parse_token(tok).map(|vc| vc.value).ok_or_else(|| SetFileError::BadToken {
                line: line_no,
                token: tok.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(SetRecord { seq, id, values }))
}

/// Streaming reader over a set file.
pub struct SetReader<R> {
    lines: std::io::Lines<R>,
    has_id: bool,
    line_no: usize,
    seq: usize,
}

impl<R: BufRead> SetReader<R> {
    pub fn new(reader: R, has_id: bool) -> Self {
        Self {
            lines: reader.lines(),
            has_id,
            line_no: 0,
            seq: 0,
        }
    }
}

impl<R: BufRead> Iterator for SetReader<R> {
    type Item = Result<SetRecord, SetFileError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            let line_no = self.line_no;
            self.line_no += 1;
            match parse_line(&line, line_no, self.seq, self.has_id) {
                Ok(Some(record)) => {
                    self.seq += 1;
                    return Some(Ok(record));
                }
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

pub fn open(path: &Path, has_id: bool) -> Result<SetReader<BufReader<File>>, SetFileError> {
    let file = File::open(path)?;
    Ok(SetReader::new(BufReader::new(file), has_id))
}
