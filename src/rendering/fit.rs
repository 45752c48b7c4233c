//! Text fitting: map a text length onto a font size inside an envelope.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Font-size scaling policy for one independently sized text region.
///
/// `max_size` is used for empty text; the size then drops linearly with
/// every character until `max_length` characters, where it bottoms out at
/// `min_size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeEnvelope {
    pub min_size: f64,
    pub max_size: f64,
    pub max_length: usize,
}

impl SizeEnvelope {
    /// Build an envelope, rejecting `min_size > max_size` and a zero `max_length`.
    pub fn new(min_size: f64, max_size: f64, max_length: usize) -> Result<Self> {
        let env = Self { min_size, max_size, max_length };
        env.validate()?;
        Ok(env)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_size.is_finite() || !self.max_size.is_finite() {
            return Err(Error::ConfigError("envelope sizes must be finite".into()));
        }
        if self.min_size > self.max_size {
            return Err(Error::ConfigError(format!(
                "envelope min_size {} exceeds max_size {}",
                self.min_size, self.max_size
            )));
        }
        if self.max_length == 0 {
            return Err(Error::ConfigError("envelope max_length must be > 0".into()));
        }
        Ok(())
    }

    /// Shorthand for [`fit`] with this envelope.
    pub fn fit(&self, text_length: usize) -> u32 {
        fit(text_length, self)
    }
}

/// Compute the font size for a text of `text_length` characters.
///
/// Linear interpolation from `max_size` down to `min_size`, clamped into the
/// envelope and floored to whole size steps. Lengths past `max_length` are
/// clamped rather than extrapolated.
pub fn fit(text_length: usize, env: &SizeEnvelope) -> u32 {
    let step = (env.max_size - env.min_size) / env.max_length.max(1) as f64;
    let raw = env.max_size - text_length as f64 * step;
    let size = raw.min(env.max_size).max(env.min_size).floor();
    if size <= 0.0 {
        0
    } else {
        size as u32
    }
}

/// Character count as seen by the fitter (Unicode scalar values).
pub fn text_length(text: &str) -> usize {
    text.chars().count()
}
