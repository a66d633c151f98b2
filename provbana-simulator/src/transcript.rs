//! ## provbana-simulator::transcript
//! **Record of executed events**
//!
//! Every executed event is fed into a BLAKE3 hasher as `"<nanos> <name>\n"`.
//! Two runs of the same scenario on a simulated clock produce the same hash,
//! which makes rehearsals comparable across versions of the runner.

use blake3::Hasher;
use parking_lot::Mutex;
use provbana_core::time::Time;
use provbana_engine::EventSink;

use crate::error::RehearsalError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub time: Time,
    pub name: String,
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    hasher: Hasher,
}

#[derive(Default)]
pub struct Transcript {
    inner: Mutex<Inner>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.inner.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hex encoded hash of everything recorded so far.
    pub fn hash(&self) -> String {
        hex::encode(self.inner.lock().hasher.finalize().as_bytes())
    }

    pub fn validate_hash(&self, expected: &str) -> Result<(), RehearsalError> {
        compare_hash(expected, self.hash())
    }
}

/// Hashes compare case-insensitively, surrounding whitespace ignored.
pub(crate) fn compare_hash(expected: &str, actual: String) -> Result<(), RehearsalError> {
    let expected = expected.trim();
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(RehearsalError::HashMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

impl EventSink for Transcript {
    fn record(&self, name: &str, time: Time) {
        let mut inner = self.inner.lock();
        inner
            .hasher
            .update(format!("{} {}\n", time.as_nanos(), name).as_bytes());
        inner.entries.push(Entry {
            time,
            name: name.to_string(),
        });
    }
}
