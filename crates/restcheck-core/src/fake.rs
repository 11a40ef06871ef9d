// crates/restcheck-core/src/fake.rs
// ============================================================================
// Module: Synthetic Data
// Description: Random lorem text, integers, emails, and passwords.
// Purpose: Produce fresh request bodies so repeated runs never collide.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! [`FakeData`] wraps a seedable RNG. Production runs seed from entropy so
//! that registrations and post ids do not collide across runs; tests seed
//! explicitly for reproducible bodies.

use rand::Rng;
use rand::SeedableRng;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::model::Credentials;
use crate::model::PostId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest integer a JSON number can carry without precision loss.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;
/// Word count produced by [`FakeData::lorem_default`].
pub const DEFAULT_LOREM_WORDS: usize = 3;
/// Length of generated passwords.
pub const PASSWORD_LENGTH: usize = 15;

/// Word pool for lorem text.
const LOREM_WORDS: &[&str] = &[
    "alias", "consequatur", "aut", "perferendis", "sit", "voluptatem", "accusantium", "doloremque",
    "aperiam", "eaque", "ipsa", "quae", "ab", "illo", "inventore", "veritatis", "et", "quasi",
    "architecto", "beatae", "vitae", "dicta", "sunt", "explicabo", "aspernatur", "odit", "fugit",
    "sed", "quia", "consequuntur", "magni", "dolores", "eos", "qui", "ratione", "sequi",
    "nesciunt", "neque", "dolorem", "ipsum", "dolor", "amet", "consectetur", "adipisci", "velit",
    "numquam", "eius", "modi", "tempora", "incidunt", "ut", "labore", "dolore", "magnam",
    "aliquam", "quaerat", "enim", "minima", "veniam", "quis", "nostrum", "exercitationem",
    "ullam", "corporis", "suscipit", "laboriosam", "nisi", "aliquid", "ex", "ea", "commodi",
];

/// First-name pool for email local parts.
const FIRST_NAMES: &[&str] = &[
    "ada", "brooke", "cyrus", "dana", "elio", "farah", "gus", "hana", "ivo", "juno", "kiran",
    "lena", "milo", "nadia", "otto", "priya", "quinn", "rosa", "sami", "tove",
];

/// Last-name pool for email local parts.
const LAST_NAMES: &[&str] = &[
    "abbott", "barker", "castillo", "dietrich", "engel", "fontaine", "graves", "hollis", "ishida",
    "jensen", "kowalski", "lindqvist", "moreau", "novak", "okafor", "petrov", "quintero",
    "rasmussen", "silva", "turner",
];

/// Domains for generated emails.
const EMAIL_PROVIDERS: &[&str] = &["gmail.com", "yahoo.com", "hotmail.com", "example.org"];

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Random data source for request bodies.
#[derive(Debug, Clone)]
pub struct FakeData {
    /// Random source.
    rng: StdRng,
}

impl Default for FakeData {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeData {
    /// Creates a generator seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a deterministic generator.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns between `min` and `max` space-separated lorem words.
    ///
    /// `min` is raised to 1 and `max` to `min` when given out of order.
    pub fn lorem_words(&mut self, min: usize, max: usize) -> String {
        let min = min.max(1);
        let max = max.max(min);
        let count = self.rng.gen_range(min..=max);
        let mut words = Vec::with_capacity(count);
        for _ in 0..count {
            words.push(self.pick(LOREM_WORDS));
        }
        words.join(" ")
    }

    /// Returns [`DEFAULT_LOREM_WORDS`] lorem words.
    pub fn lorem_default(&mut self) -> String {
        self.lorem_words(DEFAULT_LOREM_WORDS, DEFAULT_LOREM_WORDS)
    }

    /// Returns an integer in `1..=MAX_SAFE_INTEGER`.
    pub fn int(&mut self) -> u64 {
        self.rng.gen_range(1..=MAX_SAFE_INTEGER)
    }

    /// Returns a fresh post identifier.
    pub fn post_id(&mut self) -> PostId {
        PostId::new(self.int())
    }

    /// Returns a lowercase `first.last{n}@provider` address.
    pub fn email(&mut self) -> String {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        let provider = self.pick(EMAIL_PROVIDERS);
        let suffix: u32 = self.rng.gen_range(0..100_000);
        format!("{first}.{last}{suffix}@{provider}")
    }

    /// Returns a [`PASSWORD_LENGTH`]-character alphanumeric password.
    pub fn password(&mut self) -> String {
        (&mut self.rng).sample_iter(&Alphanumeric).take(PASSWORD_LENGTH).map(char::from).collect()
    }

    /// Returns a fresh email/password pair.
    pub fn credentials(&mut self) -> Credentials {
        Credentials {
            email: self.email(),
            password: self.password(),
        }
    }

    /// Picks one entry from `pool`.
    fn pick(&mut self, pool: &'static [&'static str]) -> &'static str {
        pool.choose(&mut self.rng).copied().unwrap_or("lorem")
    }
}
