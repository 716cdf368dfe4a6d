//! Hour buckets - the 24 reusable cold subdirectories of a class

use chrono::{DateTime, Local, Timelike, Utc};
use std::fmt;
use std::time::SystemTime;

/// Hour-of-day bucket under a class's cold root (`<root>/<class>/<0-23>/`)
///
/// Bucket identity is the hour number only. The same bucket is reused every day,
/// so its content must be purged before the hour comes around again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey(u8);

impl BucketKey {
    /// Number of buckets per class
    pub const COUNT: u8 = 24;

    /// Create a bucket key, returning `None` outside 0..=23
    pub fn new(hour: u8) -> Option<Self> {
        (hour < Self::COUNT).then_some(Self(hour))
    }

    /// Hour of day this bucket represents
    pub fn hour(&self) -> u8 {
        self.0
    }

    /// All 24 buckets in hour order
    pub fn all() -> impl Iterator<Item = BucketKey> {
        (0..Self::COUNT).map(BucketKey)
    }

    /// Bucket for a file created at `time`
    pub fn for_time(time: SystemTime, clock: BucketClock) -> Self {
        let hour = match clock {
            BucketClock::Utc => DateTime::<Utc>::from(time).hour(),
            BucketClock::Local => DateTime::<Local>::from(time).hour(),
        };
        // chrono guarantees 0..=23
        Self(hour as u8)
    }

    /// Directory name of this bucket
    pub fn dir_name(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wall clock used to derive a bucket's hour from a file's mtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketClock {
    /// Coordinated universal time
    Utc,

    /// Host local time (matches what operators see in `ls -l`)
    #[default]
    Local,
}
