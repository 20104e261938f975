//! Cartesian products of per-field representative pools.

use std::collections::HashSet;

use cw_types::{ConfigSchema, CwResult, FieldValue};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::encoding::NumericEncoder;

/// Products up to this size are enumerated as a shuffled permutation; larger
/// ones are visited through distinct random draws, capped at the same count.
pub const MAX_ENUMERATED_POINTS: usize = 1 << 22;

/// One representative pool per schema field, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianPools {
    names: Vec<String>,
    pools: Vec<Vec<FieldValue>>,
}

impl CartesianPools {
    /// Pools of up to `k` representative values for every field of `schema`.
    pub fn from_schema<R: Rng + ?Sized>(
        schema: &ConfigSchema,
        k: usize,
        rng: &mut R,
    ) -> CwResult<Self> {
        let mut names = Vec::with_capacity(schema.len());
        let mut pools = Vec::with_capacity(schema.len());
        for field in schema.fields() {
            names.push(field.name.clone());
            pools.push(NumericEncoder::representative_values(field, k, rng)?);
        }
        Ok(Self { names, pools })
    }

    /// Number of points in the product, `None` on overflow.
    pub fn len(&self) -> Option<usize> {
        self.pools
            .iter()
            .try_fold(1usize, |acc, pool| acc.checked_mul(pool.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    pub fn pool_sizes(&self) -> Vec<usize> {
        self.pools.iter().map(Vec::len).collect()
    }

    /// Field assignment for one coordinate tuple (one index per pool).
    pub fn point(&self, coords: &[usize]) -> Vec<(String, FieldValue)> {
        self.names
            .iter()
            .zip(&self.pools)
            .zip(coords)
            .map(|((name, pool), &i)| (name.clone(), pool[i].clone()))
            .collect()
    }

    /// Every point of the product exactly once, in random order.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> ShuffledPoints {
        let sizes = self.pool_sizes();
        match self.len() {
            Some(0) => ShuffledPoints::Enumerated {
                sizes,
                order: Vec::new().into_iter(),
            },
            Some(total) if total <= MAX_ENUMERATED_POINTS => {
                let mut order: Vec<usize> = (0..total).collect();
                order.shuffle(rng);
                ShuffledPoints::Enumerated {
                    sizes,
                    order: order.into_iter(),
                }
            }
            total => {
                let draws = total.unwrap_or(usize::MAX).min(MAX_ENUMERATED_POINTS);
                ShuffledPoints::Sampled {
                    sizes,
                    seen: HashSet::new(),
                    remaining: draws,
                }
            }
        }
    }
}

/// Iterator state over a shuffled product; call [`ShuffledPoints::next_coords`].
#[derive(Debug)]
pub enum ShuffledPoints {
    Enumerated {
        sizes: Vec<usize>,
        order: std::vec::IntoIter<usize>,
    },
    Sampled {
        sizes: Vec<usize>,
        seen: HashSet<Vec<usize>>,
        remaining: usize,
    },
}

impl ShuffledPoints {
    /// Next unseen coordinate tuple, or `None` once the product is exhausted.
    pub fn next_coords<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Vec<usize>> {
        match self {
            Self::Enumerated { sizes, order } => {
                let mut index = order.next()?;
                let mut coords = vec![0; sizes.len()];
                for (slot, size) in coords.iter_mut().zip(sizes.iter()).rev() {
                    *slot = index % size;
                    index /= size;
                }
                Some(coords)
            }
            Self::Sampled {
                sizes,
                seen,
                remaining,
            } => {
                while *remaining > 0 {
                    *remaining -= 1;
                    let coords: Vec<usize> = sizes.iter().map(|&s| rng.gen_range(0..s)).collect();
                    if seen.insert(coords.clone()) {
                        return Some(coords);
                    }
                }
                None
            }
        }
    }
}
