//! Per-gene bounds for candidate solutions.

use serde::{Deserialize, Serialize};

use crate::schema::EvolutionConfigError;

/// Closed interval `[low, high]` of legal values for one gene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneBounds {
    pub low: f64,
    pub high: f64,
}

impl GeneBounds {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Width of the interval.
    #[inline]
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Clamp a value into the interval.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.low, self.high)
    }

    fn check(&self, index: usize) -> Result<(), EvolutionConfigError> {
        // A finite width is required for uniform sampling.
        if !self.low.is_finite()
            || !self.high.is_finite()
            || self.low > self.high
            || !self.width().is_finite()
        {
            return Err(EvolutionConfigError::InvalidBounds {
                index,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

impl From<(f64, f64)> for GeneBounds {
    fn from((low, high): (f64, f64)) -> Self {
        Self { low, high }
    }
}

/// Ordered bounds, one entry per gene position. Fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneSpace {
    bounds: Vec<GeneBounds>,
}

impl GeneSpace {
    /// Build a gene space, rejecting empty or malformed bounds.
    pub fn new<B: Into<GeneBounds>>(
        bounds: impl IntoIterator<Item = B>,
    ) -> Result<Self, EvolutionConfigError> {
        let space = Self {
            bounds: bounds.into_iter().map(Into::into).collect(),
        };
        space.validate()?;
        Ok(space)
    }

    /// Check every entry. Deserialized spaces bypass [`GeneSpace::new`], so the
    /// engine calls this again before a run starts.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        if self.bounds.is_empty() {
            return Err(EvolutionConfigError::EmptyGeneSpace);
        }
        for (i, b) in self.bounds.iter().enumerate() {
            b.check(i)?;
        }
        Ok(())
    }

    /// Bounds for the gene at `index`, if it exists.
    #[inline]
    pub fn bounds_for(&self, index: usize) -> Option<GeneBounds> {
        self.bounds.get(index).copied()
    }

    #[inline]
    pub fn gene_count(&self) -> usize {
        self.bounds.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneBounds> {
        self.bounds.iter()
    }

    /// True if `genes` has the right length and every value is in bounds.
    pub fn contains(&self, genes: &[f64]) -> bool {
        genes.len() == self.bounds.len()
            && genes.iter().zip(&self.bounds).all(|(g, b)| b.contains(*g))
    }

    /// Clamp every gene into its bound. Extra or missing genes are left alone.
    pub fn clamp_all(&self, genes: &mut [f64]) {
        for (g, b) in genes.iter_mut().zip(&self.bounds) {
            *g = b.clamp(*g);
        }
    }
}
