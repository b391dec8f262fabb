use std::fmt;

/// A `LimitTracker` enforces a particular limit within the parser. It keeps
/// track of utilization so that we can report how close to a limit we
/// approached over the lifetime of the tracker.
///
/// ```rust
/// use iobj_parser::Parser;
///
/// let input = "
/// ~ one, {two: [3, 4]}
/// ~ five
/// ";
/// let parser = Parser::new(input).recursion_limit(8);
/// let tree = parser.parse();
/// let usage = tree.recursion_limit();
/// // `limit` reports the configured ceiling, `high` the high-water mark
/// // of nesting reached during the parse.
/// assert!(usage.high <= usage.limit);
/// assert!(tree.errors().is_empty());
/// ```
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct LimitTracker {
    current: usize,
    /// High water mark for this limit.
    pub high: usize,
    /// Limit.
    pub limit: usize,
}

impl LimitTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            current: 0,
            high: 0,
            limit,
        }
    }

    pub fn limited(&self) -> bool {
        self.current > self.limit
    }

    pub fn consume(&mut self) {
        self.current += 1;
        if self.current > self.high {
            self.high = self.current;
        }
    }

    pub fn release(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

impl fmt::Debug for LimitTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "limit: {}, high: {}", self.limit, self.high)
    }
}
