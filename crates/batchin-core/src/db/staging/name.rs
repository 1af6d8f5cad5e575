use crate::config::INDEX_NAME_SUFFIX;
use derive_more::Display;
use std::{
    collections::hash_map::RandomState,
    hash::BuildHasher,
    process,
    sync::{LazyLock, Mutex, PoisonError},
    time::{SystemTime, UNIX_EPOCH},
};
use ulid::Ulid;
use xxhash_rust::xxh3::xxh3_128_with_seed;

/// Length of the generated suffix (a lowercase ULID).
pub const NAME_SUFFIX_LEN: usize = 26;

///
/// GENERATOR is lazily initiated with a Mutex
/// it keeps the previous ULID so names stay unique within the process
///

static GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

/// Generate a fresh staging table name with the given prefix.
pub(crate) fn generate(prefix: &str) -> TableName {
    let ulid = GENERATOR
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .generate();

    TableName::from_parts(prefix, &ulid.to_string().to_ascii_lowercase())
}

///
/// TableName
///
/// Generated name of one staging table. Never reused.
///

#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub struct TableName(String);

impl TableName {
    pub(crate) fn from_parts(prefix: &str, suffix: &str) -> Self {
        Self(format!("{prefix}{suffix}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the lookup index built on this table.
    #[must_use]
    pub fn index_name(&self) -> String {
        format!("{}{INDEX_NAME_SUFFIX}", self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

///
/// Generator
///
/// Monotonic ULID source. Within one millisecond it increments the previous
/// value instead of drawing new randomness, so two calls never collide even
/// when they race on the same connection.
///
/// The random component hashes the process id, wall clock, a call counter,
/// and a per-process random hasher key, which keeps names from different
/// processes sharing a database apart.
///

pub(crate) struct Generator {
    previous: Ulid,
    counter: u64,
    seed: u64,
}

impl Generator {
    pub(crate) fn new() -> Self {
        Self {
            previous: Ulid::nil(),
            counter: 0,
            seed: RandomState::new().hash_one(process::id()),
        }
    }

    pub(crate) fn generate(&mut self) -> Ulid {
        let last_ts = self.previous.timestamp_ms();
        let ts = now_millis();

        // maybe time went backward, or it is the same ms.
        // increment instead of generating a new random so that it is monotonic
        if ts <= last_ts {
            if let Some(next) = self.previous.increment() {
                self.previous = next;

                return next;
            }

            // random space for this millisecond is exhausted; borrow the next one
            let ulid = Ulid::from_parts(last_ts + 1, self.entropy());
            self.previous = ulid;

            return ulid;
        }

        let ulid = Ulid::from_parts(ts, self.entropy());
        self.previous = ulid;

        ulid
    }

    fn entropy(&mut self) -> u128 {
        self.counter = self.counter.wrapping_add(1);

        let mut bytes = [0u8; 28];
        bytes[..4].copy_from_slice(&process::id().to_le_bytes());
        bytes[4..20].copy_from_slice(&now_nanos().to_le_bytes());
        bytes[20..].copy_from_slice(&self.counter.to_le_bytes());

        xxh3_128_with_seed(&bytes, self.seed)
    }
}

#[expect(clippy::cast_possible_truncation)]
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

fn now_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos())
}

///
/// TESTS
///
