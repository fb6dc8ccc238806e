//! Paths from the observed root to a value.

use serde::Serialize;
use std::fmt;
use std::ops::Deref;

/// Largest array index. Larger canonical integers name plain properties.
pub const MAX_ARRAY_INDEX: usize = 4_294_967_294;

/// One key in a [`Path`]: an object property name or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

impl PathStep {
    /// Returns the array index this step addresses, if any.
    ///
    /// A string key counts as an index only in its canonical decimal form,
    /// so `"0"` and `"12"` qualify while `"012"`, `"+1"` and `""` do not.
    /// Nothing above [`MAX_ARRAY_INDEX`] is an index.
    pub fn as_index(&self) -> Option<usize> {
        let idx = match self {
            PathStep::Index(idx) => *idx,
            PathStep::Key(key) => parse_canonical_index(key)?,
        };
        (idx <= MAX_ARRAY_INDEX).then_some(idx)
    }

    /// Returns the property name this step addresses on a non-array node.
    pub fn to_key(&self) -> String {
        match self {
            PathStep::Key(key) => key.clone(),
            PathStep::Index(idx) => idx.to_string(),
        }
    }
}

fn parse_canonical_index(key: &str) -> Option<usize> {
    let bytes = key.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    key.parse().ok()
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(key) => f.write_str(key),
            PathStep::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        PathStep::Key(key.to_owned())
    }
}

impl From<String> for PathStep {
    fn from(key: String) -> Self {
        PathStep::Key(key)
    }
}

impl From<usize> for PathStep {
    fn from(idx: usize) -> Self {
        PathStep::Index(idx)
    }
}

/// Negative numbers are not indices; they name a property such as `"-1"`.
impl From<i32> for PathStep {
    fn from(n: i32) -> Self {
        match usize::try_from(n) {
            Ok(idx) => PathStep::Index(idx),
            Err(_) => PathStep::Key(n.to_string()),
        }
    }
}

impl From<&PathStep> for PathStep {
    fn from(step: &PathStep) -> Self {
        step.clone()
    }
}

/// Ordered sequence of keys locating a value relative to the observed root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Path(Vec<PathStep>);

impl Path {
    /// The empty path, addressing the root itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Returns `self + step` without touching `self`.
    pub fn child(&self, step: impl Into<PathStep>) -> Path {
        let mut steps = Vec::with_capacity(self.0.len() + 1);
        steps.extend_from_slice(&self.0);
        steps.push(step.into());
        Path(steps)
    }

    pub fn parent(&self) -> Option<Path> {
        let (_, parent) = self.0.split_last()?;
        Some(Path(parent.to_vec()))
    }

    pub fn last(&self) -> Option<&PathStep> {
        self.0.last()
    }

    /// Checks whether `prefix` is an ancestor of (or equal to) this path.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Formats the path as an RFC 6901 JSON Pointer.
    ///
    /// ```
    /// use observe_tree::{Path, PathStep};
    ///
    /// let path: Path = [PathStep::from("a/b"), PathStep::from("c~d"), PathStep::from(0)]
    ///     .into_iter()
    ///     .collect();
    /// assert_eq!(path.to_pointer(), "/a~1b/c~0d/0");
    /// assert_eq!(Path::root().to_pointer(), "");
    /// ```
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for step in &self.0 {
            out.push('/');
            match step {
                PathStep::Key(key) => out.push_str(&escape_component(key)),
                PathStep::Index(idx) => out.push_str(&idx.to_string()),
            }
        }
        out
    }

    pub fn into_steps(self) -> Vec<PathStep> {
        self.0
    }
}

fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // ~ must be escaped before /
    component.replace('~', "~0").replace('/', "~1")
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl Deref for Path {
    type Target = [PathStep];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Into<PathStep>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Path(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<PathStep>> for Path {
    fn from(steps: Vec<PathStep>) -> Self {
        Path(steps)
    }
}

impl<S: Into<PathStep>, const N: usize> From<[S; N]> for Path {
    fn from(steps: [S; N]) -> Self {
        steps.into_iter().collect()
    }
}

impl IntoIterator for Path {
    type Item = PathStep;
    type IntoIter = std::vec::IntoIter<PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathStep;
    type IntoIter = std::slice::Iter<'a, PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
