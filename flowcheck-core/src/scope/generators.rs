use std::sync::Mutex;

/// Default inclusive upper bound for `$randomInt`.
pub const DEFAULT_RANDOM_INT_MAX: u32 = 9999;

/// Built-in dynamic values, addressed as `{{$name}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    RandomInt,
    Timestamp,
    IsoTimestamp,
    Uuid,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "$randomInt" => Some(Builtin::RandomInt),
            "$timestamp" => Some(Builtin::Timestamp),
            "$isoTimestamp" => Some(Builtin::IsoTimestamp),
            "$uuid" => Some(Builtin::Uuid),
            _ => None,
        }
    }
}

/// Source of generated values. Every call produces a fresh value; nothing is
/// cached between occurrences.
#[derive(Debug)]
pub struct Generators {
    random_int_max: u32,
    rng: Mutex<fastrand::Rng>,
}

impl Default for Generators {
    fn default() -> Self {
        Self::new(DEFAULT_RANDOM_INT_MAX)
    }
}

impl Generators {
    pub fn new(random_int_max: u32) -> Self {
        Self {
            random_int_max,
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Reproducible `$randomInt` sequence, for tests and debugging.
    pub fn seeded(random_int_max: u32, seed: u64) -> Self {
        Self {
            random_int_max,
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }

    pub fn random_int_max(&self) -> u32 {
        self.random_int_max
    }

    pub fn generate(&self, name: &str) -> Option<String> {
        let builtin = Builtin::from_name(name)?;
        Some(match builtin {
            Builtin::RandomInt => {
                let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                rng.u32(0..=self.random_int_max).to_string()
            }
            Builtin::Timestamp => chrono::Utc::now().timestamp().to_string(),
            Builtin::IsoTimestamp => {
                chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            }
            Builtin::Uuid => uuid::Uuid::new_v4().to_string(),
        })
    }
}
