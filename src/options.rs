//! Render budget supplied by the embedding environment.

use crate::error::Error;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ELEMENTS_PER_DIM: usize = 6;
pub const DEFAULT_MAX_TOTAL_CHARS: usize = 200;
pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_FLOAT_PRECISION: usize = 4;

/// Smallest character budget accepted; fits the truncation marker plus a
/// recognisable prefix.
pub const MIN_TOTAL_CHARS: usize = 8;
pub const MAX_FLOAT_PRECISION: usize = 12;
/// Upper limits; larger values are rejected by [`RenderOptions::validate`]
/// and pulled down by [`RenderOptions::clamped`].
pub const MAX_TOTAL_CHARS_LIMIT: usize = 65_536;
pub const MAX_ELEMENTS_PER_DIM_LIMIT: usize = 4_096;
pub const MAX_DEPTH_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "camelCase", default))]
pub struct RenderOptions {
    pub max_elements_per_dim: usize,
    pub max_total_chars: usize,
    pub max_depth: usize,
    pub float_precision: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_elements_per_dim: DEFAULT_MAX_ELEMENTS_PER_DIM,
            max_total_chars: DEFAULT_MAX_TOTAL_CHARS,
            max_depth: DEFAULT_MAX_DEPTH,
            float_precision: DEFAULT_FLOAT_PRECISION,
        }
    }
}

impl RenderOptions {
    pub fn with_max_elements_per_dim(mut self, n: usize) -> Self {
        self.max_elements_per_dim = n;
        self
    }

    pub fn with_max_total_chars(mut self, n: usize) -> Self {
        self.max_total_chars = n;
        self
    }

    pub fn with_max_depth(mut self, n: usize) -> Self {
        self.max_depth = n;
        self
    }

    pub fn with_float_precision(mut self, n: usize) -> Self {
        self.float_precision = n;
        self
    }

    /// Builds options from a key/value map as handed over by the host.
    /// Unrecognised keys are ignored; recognised keys must hold in-range
    /// values.
    pub fn from_map<'a, I>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let mut options = Self::default();
        for (key, value) in entries {
            let slot = match key {
                "maxElementsPerDim" => &mut options.max_elements_per_dim,
                "maxTotalChars" => &mut options.max_total_chars,
                "maxDepth" => &mut options.max_depth,
                "floatPrecision" => &mut options.float_precision,
                _ => {
                    debug_println!("ignoring unknown render option '{}'", key);
                    continue;
                }
            };
            *slot = usize::try_from(value).map_err(|_| Error::InvalidOption {
                key: key.to_string(),
                reason: format!("expected a non-negative integer, got {}", value),
            })?;
        }
        options.validate()?;
        Ok(options)
    }

    /// Parses a JSON object such as `{"maxElementsPerDim": 4}`.
    #[cfg(feature = "serialization")]
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let options: RenderOptions =
            serde_json::from_str(json).map_err(|e| Error::InvalidOption {
                key: "<json>".to_string(),
                reason: e.to_string(),
            })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |key: &str, reason: String| {
            Err(Error::InvalidOption {
                key: key.to_string(),
                reason,
            })
        };
        if self.max_elements_per_dim == 0 || self.max_elements_per_dim > MAX_ELEMENTS_PER_DIM_LIMIT {
            return invalid(
                "maxElementsPerDim",
                format!("must be between 1 and {}", MAX_ELEMENTS_PER_DIM_LIMIT),
            );
        }
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return invalid("maxDepth", format!("must be between 1 and {}", MAX_DEPTH_LIMIT));
        }
        if self.max_total_chars < MIN_TOTAL_CHARS || self.max_total_chars > MAX_TOTAL_CHARS_LIMIT {
            return invalid(
                "maxTotalChars",
                format!(
                    "must be between {} and {}",
                    MIN_TOTAL_CHARS, MAX_TOTAL_CHARS_LIMIT
                ),
            );
        }
        if self.float_precision > MAX_FLOAT_PRECISION {
            return invalid(
                "floatPrecision",
                format!("must be at most {}", MAX_FLOAT_PRECISION),
            );
        }
        Ok(())
    }

    /// Copy of these options with every limit pulled into its valid range.
    /// The formatter renders with clamped options so a bad configuration
    /// never turns into a failed summary.
    pub fn clamped(&self) -> Self {
        Self {
            max_elements_per_dim: self.max_elements_per_dim.clamp(1, MAX_ELEMENTS_PER_DIM_LIMIT),
            max_total_chars: self.max_total_chars.clamp(MIN_TOTAL_CHARS, MAX_TOTAL_CHARS_LIMIT),
            max_depth: self.max_depth.clamp(1, MAX_DEPTH_LIMIT),
            float_precision: self.float_precision.min(MAX_FLOAT_PRECISION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let o = RenderOptions::default();
        assert_eq!(o.max_elements_per_dim, 6);
        assert_eq!(o.max_total_chars, 200);
        assert_eq!(o.max_depth, 3);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn test_clamped_pulls_limits_into_range() {
        let o = RenderOptions::default()
            .with_max_elements_per_dim(0)
            .with_max_depth(0)
            .with_max_total_chars(1)
            .with_float_precision(40)
            .clamped();
        assert!(o.validate().is_ok());
        assert_eq!(o.max_total_chars, MIN_TOTAL_CHARS);
        assert_eq!(o.float_precision, MAX_FLOAT_PRECISION);

        let o = RenderOptions::default()
            .with_max_elements_per_dim(usize::MAX)
            .with_max_depth(usize::MAX)
            .with_max_total_chars(usize::MAX)
            .clamped();
        assert!(o.validate().is_ok());
        assert_eq!(o.max_elements_per_dim, MAX_ELEMENTS_PER_DIM_LIMIT);
        assert_eq!(o.max_depth, MAX_DEPTH_LIMIT);
        assert_eq!(o.max_total_chars, MAX_TOTAL_CHARS_LIMIT);
    }
}
