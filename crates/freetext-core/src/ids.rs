//! Identifiers binding generated markup to generated behavior.
//!
//! Every block gets its identifier before any markup or script is produced
//! for it, and both generators read the same [`Identifier`]. Sub-questions of
//! an assessment derive theirs positionally with [`Identifier::sub_question`].

use std::collections::HashSet;
use std::fmt;

/// Attempts to draw a fresh identifier before falling back to a suffix.
const MAX_DRAWS: usize = 16;

/// Short token safe to embed in element ids, attribute values and script
/// function names (ASCII alphanumerics and `_` only).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Build an identifier from raw generator output, dropping unsafe characters.
    ///
    /// Returns `None` if nothing usable remains.
    pub(crate) fn sanitized(raw: &str) -> Option<Self> {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        (!cleaned.is_empty()).then_some(Self(cleaned))
    }

    /// Identifier of the 1-based `index`-th question of this assessment.
    #[must_use]
    pub fn sub_question(&self, index: usize) -> Self {
        Self(format!("{}_q{index}", self.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of raw identifier tokens.
pub trait IdGenerator: Send {
    /// Produce the next candidate token.
    fn next_token(&mut self) -> String;
}

/// High-entropy tokens: the first 8 hex digits of a random UUID.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_token(&mut self) -> String {
        let mut token = uuid::Uuid::new_v4().simple().to_string();
        token.truncate(8);
        token
    }
}

/// Deterministic tokens `q0001`, `q0002`, ... for reproducible output.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialIds {
    counter: u32,
}

impl IdGenerator for SequentialIds {
    fn next_token(&mut self) -> String {
        self.counter += 1;
        format!("q{:04}", self.counter)
    }
}

/// Allocates identifiers for one page, never handing out the same one twice.
pub struct IdAllocator<'g> {
    generator: &'g mut dyn IdGenerator,
    taken: HashSet<Identifier>,
}

impl<'g> IdAllocator<'g> {
    pub fn new(generator: &'g mut dyn IdGenerator) -> Self {
        Self {
            generator,
            taken: HashSet::new(),
        }
    }

    /// Allocate `count` identifiers, indexed like the blocks of one
    /// extraction pass.
    pub fn allocate(&mut self, count: usize) -> Vec<Identifier> {
        (0..count).map(|_| self.next()).collect()
    }

    fn next(&mut self) -> Identifier {
        for _ in 0..MAX_DRAWS {
            let Some(id) = Identifier::sanitized(&self.generator.next_token()) else {
                continue;
            };
            if self.taken.insert(id.clone()) {
                return id;
            }
            tracing::debug!(id = %id, "Identifier collision, drawing again");
        }

        // Generator keeps repeating itself; make the last resort unique by construction.
        let mut n = self.taken.len();
        loop {
            let id = Identifier(format!("ft{n}"));
            if self.taken.insert(id.clone()) {
                tracing::warn!(id = %id, "Identifier generator exhausted, using fallback");
                return id;
            }
            n += 1;
        }
    }
}
