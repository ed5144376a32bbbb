use fixedbitset as fb;
use itertools::Either;

use crate::{
    config::{preallocate, GrowthPolicy},
    error::{AllocSite, NumberingError},
};

/// Final membership of a set of positions `0..len` in some class,
/// stored as whichever of the class or its complement is smaller.
///
/// Lists are sorted ascending.
/// `len` is not stored here; queries that need it take it as a parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Membership {
    /// Every position is in the class.
    All,
    /// No position is in the class.
    None,
    /// Exactly the listed positions are in the class.
    Explicit(Vec<usize>),
    /// Every position except the listed ones is in the class.
    Complement(Vec<usize>),
}

impl Membership {
    /// Whether position `i` is in the class.
    pub fn contains(&self, i: usize) -> bool {
        match self {
            Membership::All => true,
            Membership::None => false,
            Membership::Explicit(list) => list.binary_search(&i).is_ok(),
            Membership::Complement(list) => list.binary_search(&i).is_err(),
        }
    }

    /// Number of positions in the class strictly before `i`.
    pub fn rank(&self, i: usize) -> usize {
        match self {
            Membership::All => i,
            Membership::None => 0,
            Membership::Explicit(list) => list.partition_point(|&x| x < i),
            Membership::Complement(list) => i - list.partition_point(|&x| x < i),
        }
    }

    /// The `r`th position in the class, if there are that many.
    pub fn select(&self, r: usize, len: usize) -> Option<usize> {
        match self {
            Membership::All => (r < len).then_some(r),
            Membership::None => None,
            Membership::Explicit(list) => list.get(r).copied(),
            Membership::Complement(list) => {
                // `list[i] - i` counts the members before `list[i]` and never decreases,
                // so the excluded positions before the answer are those with `list[i] - i <= r`
                let (mut lo, mut hi) = (0, list.len());
                while lo < hi {
                    let mid = lo + (hi - lo) / 2;
                    if list[mid] - mid <= r {
                        lo = mid + 1;
                    } else {
                        hi = mid;
                    }
                }
                let candidate = r + lo;
                (candidate < len).then_some(candidate)
            }
        }
    }

    /// Number of positions in the class out of `len`.
    pub fn count(&self, len: usize) -> usize {
        match self {
            Membership::All => len,
            Membership::None => 0,
            Membership::Explicit(list) => list.len(),
            Membership::Complement(list) => len - list.len(),
        }
    }

    /// Number of positions stored in memory.
    pub fn stored_len(&self) -> usize {
        match self {
            Membership::All | Membership::None => 0,
            Membership::Explicit(list) | Membership::Complement(list) => list.len(),
        }
    }

    /// Iterate over the positions in the class in ascending order.
    pub fn iter(&self, len: usize) -> impl '_ + Iterator<Item = usize> {
        let (list, complement): (&[usize], bool) = match self {
            Membership::All => (&[], true),
            Membership::None => (&[], false),
            Membership::Explicit(list) => (list.as_slice(), false),
            Membership::Complement(list) => (list.as_slice(), true),
        };
        if complement {
            let mut excluded = list.iter().copied().peekable();
            Either::Left((0..len).filter(move |&i| {
                if excluded.peek() == Some(&i) {
                    excluded.next();
                    false
                } else {
                    true
                }
            }))
        } else {
            Either::Right(list.iter().copied())
        }
    }
}

/// Which side of a two-way classification a [`ScanTracker`] stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tracking {
    Positives,
    Negatives,
}

/// Growable list of the positions on one side of a classification,
/// filled during the mesh scan.
/// The side is a guess at the minority, corrected in [`into_membership`][Self::into_membership].
#[derive(Clone, Debug)]
pub(crate) struct ScanTracker {
    tracking: Tracking,
    list: Vec<usize>,
    growth: GrowthPolicy,
    grow_site: AllocSite,
}

impl ScanTracker {
    pub fn new(
        tracking: Tracking,
        capacity: usize,
        growth: GrowthPolicy,
        init_site: AllocSite,
        grow_site: AllocSite,
    ) -> Result<Self, NumberingError> {
        Ok(Self {
            tracking,
            list: preallocate(capacity, init_site)?,
            growth,
            grow_site,
        })
    }

    /// Store `index` if it's on the tracked side.
    pub fn record(&mut self, index: usize, positive: bool) -> Result<(), NumberingError> {
        if positive != (self.tracking == Tracking::Positives) {
            return Ok(());
        }
        self.growth.reserve_for_push(&mut self.list, self.grow_site)?;
        self.list.push(index);
        Ok(())
    }

    #[inline]
    pub fn saved(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn allocated(&self) -> usize {
        self.list.capacity()
    }

    /// Turn the scanned list into a final membership of `0..len`,
    /// given the final number of positives.
    ///
    /// `relabel` maps stored indices into `0..len`
    /// and must preserve their order.
    pub fn into_membership(
        self,
        len: usize,
        positives: usize,
        relabel: impl Fn(usize) -> usize,
    ) -> Result<Membership, NumberingError> {
        if positives == 0 {
            return Ok(Membership::None);
        }
        if positives == len {
            return Ok(Membership::All);
        }

        let mut list = self.list;
        list.sort_unstable();
        for i in &mut list {
            *i = relabel(*i);
        }

        let keep_positives = positives <= len / 2;
        let list = if keep_positives == (self.tracking == Tracking::Positives) {
            list.shrink_to_fit();
            list
        } else {
            log::debug!(
                "inverting tracked list of {} out of {len} entries",
                list.len()
            );
            sorted_complement(&list, len)?
        };

        Ok(if keep_positives {
            Membership::Explicit(list)
        } else {
            Membership::Complement(list)
        })
    }
}

/// The positions of `0..len` not in `sorted`, in ascending order.
fn sorted_complement(sorted: &[usize], len: usize) -> Result<Vec<usize>, NumberingError> {
    let mut bits = fb::FixedBitSet::with_capacity(len);
    bits.set_range(.., true);
    for &i in sorted {
        bits.set(i, false);
    }
    let mut complement = preallocate(bits.count_ones(..), AllocSite::ComplementInvert)?;
    complement.extend(bits.ones());
    Ok(complement)
}
