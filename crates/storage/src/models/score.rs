use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StorageError};

/// A rating on the 1..=5 scale.
///
/// Construction is the only place where raw client input is coerced, so every
/// `Score` in the system is already known to be in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Score(u8);

impl Score {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(value: i64) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(StorageError::validation(format!(
                "Vote must be between {} and {}",
                Self::MIN,
                Self::MAX
            )));
        }

        Ok(Self(value as u8))
    }

    /// Coerces a JSON value as sent by clients: integers, integral floats
    /// (`4.0`) and strings holding an integer (`"4"`) are accepted.
    pub fn parse(raw: &Value) -> Result<Self> {
        match raw {
            Value::Null => Err(StorageError::validation("Vote is required")),
            Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    return Self::new(value);
                }

                match number.as_f64() {
                    Some(value) if value.is_finite() && value.fract() == 0.0 => {
                        Self::new(value as i64)
                    }
                    _ => Err(StorageError::validation("Vote must be a whole number")),
                }
            }
            Value::String(text) => {
                let value = text
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| StorageError::validation("Vote must be a number"))?;
                Self::new(value)
            }
            _ => Err(StorageError::validation("Vote must be a number")),
        }
    }

    pub fn value(self) -> i64 {
        i64::from(self.0)
    }
}

impl TryFrom<i64> for Score {
    type Error = StorageError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Score> for i64 {
    fn from(score: Score) -> Self {
        score.value()
    }
}
