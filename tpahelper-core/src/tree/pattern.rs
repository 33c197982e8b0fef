//! Wildcard path patterns.

use std::fmt;
use std::str::FromStr;

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::error::PatternError;

/// Segment separator in path patterns and matched paths.
pub const SEPARATOR: char = '/';

/// One segment of a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly this key.
    Literal(CompactString),
    /// Matches a single key against a `*`/`?` glob.
    Glob(CompactString),
    /// `*` on its own: any single key.
    AnyOne,
    /// `**`: zero or more keys.
    AnyDepth,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw {
            "**" => Segment::AnyDepth,
            "*" => Segment::AnyOne,
            s if s.contains(['*', '?']) => Segment::Glob(CompactString::new(s)),
            s => Segment::Literal(CompactString::new(s)),
        }
    }

    /// Whether this segment accepts `key` as a single path step.
    ///
    /// `AnyDepth` is handled by the matcher and never matches here.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit.as_str() == key,
            Segment::Glob(glob) => glob_match(glob.as_bytes(), key.as_bytes()),
            Segment::AnyOne => true,
            Segment::AnyDepth => false,
        }
    }
}

/// A compiled `/`-separated path pattern.
///
/// ```
/// use tpahelper_core::tree::PathPattern;
///
/// let pattern: PathPattern = "**/dnp3.al.index".parse().unwrap();
/// assert_eq!(pattern.segments().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: SmallVec<[Segment; 4]>,
}

impl PathPattern {
    /// Compile a pattern string.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut segments = SmallVec::new();
        for (position, raw) in pattern.split(SEPARATOR).enumerate() {
            if raw.is_empty() {
                return Err(PatternError::EmptySegment {
                    pattern: pattern.to_string(),
                    position,
                });
            }
            segments.push(Segment::parse(raw));
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// `**/<field>`: the field name at any depth.
    ///
    /// The field name is taken literally, even if it contains glob characters.
    pub fn any_depth(field: &str) -> Self {
        let mut segments = SmallVec::new();
        segments.push(Segment::AnyDepth);
        segments.push(Segment::Literal(CompactString::new(field)));
        Self {
            source: format!("**{SEPARATOR}{field}"),
            segments,
        }
    }

    /// Compiled segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathPattern::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Shell-style glob over bytes: `*` any run, `?` any single byte.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == b'?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}
