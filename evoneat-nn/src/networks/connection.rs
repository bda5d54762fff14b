use std::fmt;

/// An outgoing network connection.
#[derive(Clone, Copy, PartialEq)]
pub(crate) struct Connection {
    pub(crate) target: usize,
    pub(crate) weight: f32,
}

impl Connection {
    pub(crate) fn new(target: usize, weight: f32) -> Connection {
        Connection { target, weight }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-> {} ({:.6})", self.target, self.weight)
    }
}
