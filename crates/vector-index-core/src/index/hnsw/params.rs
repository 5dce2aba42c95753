//! HNSW build and search parameters.

use crate::error::{Error, Result};

/// Parameters fixed at construction time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HnswParams {
    /// Max bidirectional connections per node on layers ≥ 1.
    pub m: usize,
    /// Max bidirectional connections per node on layer 0.
    pub m0: usize,
    /// Candidate pool size during construction (`efConstruction`).
    pub ef_construction: usize,
    /// RNG seed for layer sampling; fix this for reproducible builds.
    pub seed: u64,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 16,
            m0: 32,
            ef_construction: 100,
            seed: 0,
        }
    }
}

impl HnswParams {
    /// Validates `m, m0, ef_construction >= 1` per §4.2's failure semantics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.m == 0 {
            return Err(Error::InvalidParameter {
                name: "m",
                message: "must be >= 1".to_string(),
            });
        }
        if self.m0 == 0 {
            return Err(Error::InvalidParameter {
                name: "m0",
                message: "must be >= 1".to_string(),
            });
        }
        if self.ef_construction == 0 {
            return Err(Error::InvalidParameter {
                name: "ef_construction",
                message: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }

    /// `mL = 1 / ln(M)`, the level-sampling multiplier from §4.2.
    #[must_use]
    pub fn level_mult(&self) -> f64 {
        1.0 / (self.m as f64).ln()
    }
}

/// Parameters that vary per search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Candidate pool size at layer 0 during search (`efSearch`).
    pub ef_search: usize,
}

impl SearchParams {
    /// Validates `ef_search >= 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `ef_search == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.ef_search == 0 {
            return Err(Error::InvalidParameter {
                name: "ef_search",
                message: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(HnswParams::default().validate().is_ok());
    }

    #[test]
    fn test_zero_m_is_rejected() {
        let params = HnswParams {
            m: 0,
            ..HnswParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_zero_ef_construction_is_rejected() {
        let params = HnswParams {
            ef_construction: 0,
            ..HnswParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_zero_ef_search_is_rejected() {
        assert!(SearchParams { ef_search: 0 }.validate().is_err());
    }

    #[test]
    fn test_level_mult_matches_formula() {
        let params = HnswParams {
            m: 16,
            ..HnswParams::default()
        };
        assert!((params.level_mult() - 1.0 / 16f64.ln()).abs() < 1e-12);
    }
}
