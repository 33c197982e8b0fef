//! Depth-first wildcard search over [`Node`] trees.

use std::fmt;

use compact_str::{CompactString, ToCompactString};
use smallvec::SmallVec;

use super::node::Node;
use super::pattern::{PathPattern, Segment, SEPARATOR};
use crate::error::PatternError;

/// Positions into the pattern's segment list that are still live.
type States = SmallVec<[usize; 4]>;

/// One step from a node to a child.
#[derive(Debug, Clone, Copy)]
enum Step<'a> {
    Key(&'a str),
    Index(usize),
}

/// Path from the root to a matched node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchPath(SmallVec<[CompactString; 8]>);

impl MatchPath {
    fn from_steps(steps: &[Step<'_>]) -> Self {
        Self(
            steps
                .iter()
                .map(|step| match step {
                    Step::Key(k) => CompactString::new(k),
                    Step::Index(i) => i.to_compact_string(),
                })
                .collect(),
        )
    }

    /// Keys (and decimal sequence positions) from the root down.
    pub fn segments(&self) -> &[CompactString] {
        &self.0
    }

    /// Key of the matched node itself.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(|s| s.as_str())
    }

    /// Number of steps from the root.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for MatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// A matched `(path, value)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub path: MatchPath,
    pub value: &'a Node,
}

/// Recursive wildcard matcher.
///
/// Results come back in pre-order depth-first order: a node is reported
/// before anything beneath it, and siblings in document order. The order is
/// a pure function of the tree and the pattern, so independent searches over
/// the same record line up positionally.
///
/// The root itself is never reported; every match has at least one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeMatcher {
    pattern: PathPattern,
}

impl TreeMatcher {
    /// Create a matcher for a compiled pattern.
    pub fn new(pattern: PathPattern) -> Self {
        Self { pattern }
    }

    /// Compile and wrap a pattern string.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        PathPattern::parse(pattern).map(Self::new)
    }

    /// Matcher for a field name at any depth (`**/<field>`).
    pub fn field(name: &str) -> Self {
        Self::new(PathPattern::any_depth(name))
    }

    /// The compiled pattern.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// All matches with their paths.
    pub fn search<'a>(&self, root: &'a Node) -> Vec<Match<'a>> {
        let mut out = Vec::new();
        self.visit(root, |steps, value| {
            out.push(Match {
                path: MatchPath::from_steps(steps),
                value,
            })
        });
        out
    }

    /// Matched values only, in the same order as [`search`](Self::search).
    pub fn values<'a>(&self, root: &'a Node) -> Vec<&'a Node> {
        let mut out = Vec::new();
        self.visit(root, |_, value| out.push(value));
        out
    }

    /// First matched value, if any.
    pub fn first<'a>(&self, root: &'a Node) -> Option<&'a Node> {
        self.values(root).into_iter().next()
    }

    /// Number of matches.
    pub fn count(&self, root: &Node) -> usize {
        let mut n = 0;
        self.visit(root, |_, _| n += 1);
        n
    }

    fn visit<'a, F>(&self, root: &'a Node, mut emit: F)
    where
        F: FnMut(&[Step<'a>], &'a Node),
    {
        let initial = self.close(smallvec::smallvec![0]);
        let mut stack = Vec::new();
        self.walk(root, &initial, &mut stack, &mut emit);
    }

    fn walk<'a, F>(&self, node: &'a Node, states: &States, stack: &mut Vec<Step<'a>>, emit: &mut F)
    where
        F: FnMut(&[Step<'a>], &'a Node),
    {
        match node {
            Node::Map(entries) => {
                for (key, child) in entries {
                    self.descend(key, Step::Key(key), child, states, stack, emit);
                }
            }
            Node::Seq(items) => {
                for (i, child) in items.iter().enumerate() {
                    let key = i.to_compact_string();
                    self.descend(&key, Step::Index(i), child, states, stack, emit);
                }
            }
            _ => {}
        }
    }

    fn descend<'a, F>(
        &self,
        key: &str,
        step: Step<'a>,
        child: &'a Node,
        states: &States,
        stack: &mut Vec<Step<'a>>,
        emit: &mut F,
    ) where
        F: FnMut(&[Step<'a>], &'a Node),
    {
        let next = self.advance(states, key);
        if next.is_empty() {
            return;
        }

        stack.push(step);
        if next.contains(&self.pattern.segments().len()) {
            emit(stack, child);
        }
        self.walk(child, &next, stack, emit);
        stack.pop();
    }

    /// States reachable after consuming `key`.
    fn advance(&self, states: &States, key: &str) -> States {
        let segments = self.pattern.segments();
        let mut next = States::new();
        for &p in states {
            match segments.get(p) {
                Some(Segment::AnyDepth) => next.push(p),
                Some(segment) if segment.matches(key) => next.push(p + 1),
                _ => {}
            }
        }
        self.close(next)
    }

    /// Epsilon closure: `**` may also match zero keys.
    fn close(&self, mut states: States) -> States {
        let segments = self.pattern.segments();
        let mut i = 0;
        while i < states.len() {
            let p = states[i];
            if matches!(segments.get(p), Some(Segment::AnyDepth)) && !states.contains(&(p + 1)) {
                states.push(p + 1);
            }
            i += 1;
        }
        states.sort_unstable();
        states.dedup();
        states
    }
}
