use std::fmt;
use std::io::Write;

/// Candidate pair, printed with the smaller id first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair {
    pub a: String,
    pub b: String,
}

impl Pair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self { a: a.into(), b: b.into() }
    }

    pub fn is_self(&self) -> bool {
        self.a == self.b
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a <= self.b {
            write!(f, "{}, {}", self.a, self.b)
        } else {
            write!(f, "{}, {}", self.b, self.a)
        }
    }
}

/// Write one pair per line. Returns the number written; flushing is left to the caller.
pub fn write_pairs<W: Write>(out: &mut W, pairs: &[Pair]) -> std::io::Result<usize> {
    for pair in pairs {
        writeln!(out, "{pair}")?;
    }
    Ok(pairs.len())
}
