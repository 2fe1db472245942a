use std::fmt::{self, Display, Formatter};

/// The index of a line in a [`super::Listing`], counting from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(pub usize);

impl Position {
    pub fn successor(self) -> Self {
        Position(self.0 + 1)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:>4}", self.0)
    }
}
