use std::{
    fmt::{self, Display, Formatter},
    slice, vec,
};

use super::position::*;

/// An append-only sequence of lines. Lines are never reordered or removed once pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    lines: Vec<T>,
}

impl<T> Listing<T> {
    pub fn new() -> Self {
        Self { lines: vec![] }
    }

    /// Appends a line and returns a reference to it.
    pub fn push(&mut self, line: T) -> &T {
        self.lines.push(line);
        &self.lines[self.lines.len() - 1]
    }

    pub fn get(&self, position: Position) -> Option<&T> {
        self.lines.get(position.0)
    }

    /// Iterates over the lines together with their positions.
    pub fn iter_lines(&self) -> Numbered<slice::Iter<T>> {
        Numbered::new(self.lines.iter())
    }

    pub fn iter_instructions(&self) -> slice::Iter<T> {
        self.lines.iter()
    }

    pub fn into_lines(self) -> Numbered<vec::IntoIter<T>> {
        Numbered::new(self.lines.into_iter())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl<T: Display> Listing<T> {
    /// Renders every line prefixed with its position.
    pub fn numbered(&self) -> String {
        self.iter_lines()
            .map(|(position, line)| format!("{}  {}\n", position, line))
            .collect()
    }
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Display> Display for Listing<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.lines
            .iter()
            .try_for_each(|line| writeln!(f, "{}", line))
    }
}

/// Pairs every item of the inner iterator with its [`Position`].
pub struct Numbered<I> {
    inner: I,
    position: Position,
}

impl<I> Numbered<I> {
    fn new(inner: I) -> Self {
        Self {
            inner,
            position: Position(0),
        }
    }
}

impl<I: Iterator> Iterator for Numbered<I> {
    type Item = (Position, I::Item);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        let current = self.position;
        self.position = current.successor();
        Some((current, item))
    }
}

impl<T> IntoIterator for Listing<T> {
    type Item = (Position, T);
    type IntoIter = Numbered<vec::IntoIter<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_lines()
    }
}

impl<'a, T> IntoIterator for &'a Listing<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_instructions()
    }
}
