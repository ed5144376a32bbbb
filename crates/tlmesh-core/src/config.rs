//! Tunables of the numbering engine.
//!
//! Everything here has a sensible default,
//! so a configuration only needs to name the values it changes:
//! ```
//! # use tlmesh_core::config::NumberingConfig;
//! # use tlmesh_core::backend::BackendKind;
//! let config: NumberingConfig =
//!     serde_json::from_str(r#"{ "backend": "Dense" }"#).unwrap();
//! assert_eq!(config.backend, BackendKind::Dense);
//! assert_eq!(config.record_growth.factor, 0.2);
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    backend::BackendKind,
    error::{AllocSite, NumberingError},
    geometry::HexVolumeMethod,
};

/// Amortized growth of a dynamic array:
/// a full array grows by `factor` of its capacity plus a fixed `pad`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowthPolicy {
    /// Fraction of the current capacity added on each growth.
    pub factor: f64,
    /// Fixed number of slots added on each growth on top of the fraction.
    pub pad: usize,
}

impl GrowthPolicy {
    /// Number of slots to add to an array with the given capacity.
    #[inline]
    pub fn increment(&self, capacity: usize) -> usize {
        (capacity as f64 * self.factor) as usize + self.pad.max(1)
    }

    /// Make room for one more element in `vec`, growing it if it's full.
    pub(crate) fn reserve_for_push<T>(
        &self,
        vec: &mut Vec<T>,
        site: AllocSite,
    ) -> Result<(), NumberingError> {
        if vec.len() < vec.capacity() {
            return Ok(());
        }
        let extra = self.increment(vec.capacity());
        log::trace!("growing {site} from {} by {extra}", vec.capacity());
        vec.try_reserve_exact(extra)
            .map_err(|_| NumberingError::Allocation { site })
    }

    /// Make room for `count` more elements in `vec`,
    /// growing in steps of this policy until they fit.
    pub(crate) fn reserve_for_extend<T>(
        &self,
        vec: &mut Vec<T>,
        count: usize,
        site: AllocSite,
    ) -> Result<(), NumberingError> {
        let needed = vec.len() + count;
        if needed <= vec.capacity() {
            return Ok(());
        }
        let mut target = vec.capacity();
        while target < needed {
            target += self.increment(target);
        }
        log::trace!("growing {site} from {} to {target}", vec.capacity());
        vec.try_reserve_exact(target - vec.len())
            .map_err(|_| NumberingError::Allocation { site })
    }
}

/// Allocate an empty vector with room for `capacity` elements.
pub(crate) fn preallocate<T>(capacity: usize, site: AllocSite) -> Result<Vec<T>, NumberingError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(capacity)
        .map_err(|_| NumberingError::Allocation { site })?;
    Ok(vec)
}

/// Configuration of a numbering pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingConfig {
    /// Fraction of a shape's element count preallocated for its tracked element list.
    pub record_fraction: f64,
    /// Fraction of a shape's element count preallocated for its stub list.
    pub stub_fraction: f64,
    /// Growth of tracked element lists.
    pub record_growth: GrowthPolicy,
    /// Growth of stub lists.
    pub stub_growth: GrowthPolicy,
    /// Growth of junction tree keys, ports and the tree arena itself.
    pub junction_growth: GrowthPolicy,
    /// Initial key capacity of junction tree branches per level, root first.
    /// Levels without a hint use [`DEFAULT_JUNCTION_HINT`].
    pub junction_capacity_hints: Vec<usize>,
    /// Decomposition used for hexahedron volumes.
    pub hexahedron_volume: HexVolumeMethod,
    /// Matrix backend the connection operator is assembled into.
    pub backend: BackendKind,
}

/// Initial key capacity of a junction tree branch when no hint is configured.
pub const DEFAULT_JUNCTION_HINT: usize = 4;

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            record_fraction: 0.02,
            stub_fraction: 0.01,
            record_growth: GrowthPolicy {
                factor: 0.2,
                pad: 16,
            },
            stub_growth: GrowthPolicy {
                factor: 0.5,
                pad: 16,
            },
            junction_growth: GrowthPolicy {
                factor: 0.2,
                pad: 4,
            },
            junction_capacity_hints: Vec::new(),
            hexahedron_volume: HexVolumeMethod::LongDiagonal,
            backend: BackendKind::SparseCpu,
        }
    }
}

impl NumberingConfig {
    /// Initial capacity hint for junction tree branches at a given level,
    /// where the root is at level `depth` and leaves at level 0.
    pub fn junction_hint(&self, depth: usize, level: usize) -> usize {
        self.junction_capacity_hints
            .get(depth - level)
            .copied()
            .unwrap_or(DEFAULT_JUNCTION_HINT)
    }
}

/// Number of slots to preallocate for a fraction of `expected` elements.
#[inline]
pub(crate) fn fraction_of(expected: usize, fraction: f64) -> usize {
    (expected as f64 * fraction).ceil() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_amortized() {
        let policy = GrowthPolicy {
            factor: 0.2,
            pad: 4,
        };
        let mut v: Vec<usize> = preallocate(10, AllocSite::RecordInit).unwrap();
        assert!(v.capacity() >= 10);
        let mut growths = 0;
        for i in 0..1000 {
            let before = v.capacity();
            policy.reserve_for_push(&mut v, AllocSite::RecordGrow).unwrap();
            if v.capacity() != before {
                growths += 1;
            }
            v.push(i);
            assert!(v.len() <= v.capacity());
        }
        // geometric growth needs far fewer reallocations than pushes
        assert!(growths < 40, "grew {growths} times");

        policy
            .reserve_for_extend(&mut v, 500, AllocSite::JunctionPortGrow)
            .unwrap();
        assert!(v.capacity() >= 1500);
    }

    #[test]
    fn config_from_json() {
        let config: NumberingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NumberingConfig::default());

        let config: NumberingConfig = serde_json::from_str(
            r#"{
                "stub_growth": { "factor": 1.0, "pad": 2 },
                "junction_capacity_hints": [8, 2],
                "hexahedron_volume": "Tetrakis"
            }"#,
        )
        .unwrap();
        assert_eq!(config.stub_growth.increment(10), 12);
        assert_eq!(config.hexahedron_volume, HexVolumeMethod::Tetrakis);
        assert_eq!(config.junction_hint(2, 2), 8);
        assert_eq!(config.junction_hint(2, 1), 2);
        assert_eq!(config.junction_hint(4, 1), DEFAULT_JUNCTION_HINT);

        let back = serde_json::to_string(&config).unwrap();
        let again: NumberingConfig = serde_json::from_str(&back).unwrap();
        assert_eq!(config, again);
    }

    #[test]
    fn fractions_round_up() {
        assert_eq!(fraction_of(0, 0.02), 0);
        assert_eq!(fraction_of(1, 0.02), 1);
        assert_eq!(fraction_of(1000, 0.02), 20);
    }
}
