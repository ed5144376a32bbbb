//! Deduplication of the junctions where ports of neighboring elements meet.
//!
//! A junction is identified by the mesh nodes of the face its ports sit on.
//! The node indices are put into a canonical form with [`canonical_key`]
//! and used as a path through a fixed-depth tree,
//! one key component per level.
//! Ports arriving at the same face from any element
//! end up in the same leaf.
//!
//! The tree lives in an arena of nodes addressed by index,
//! so growing one branch never moves another.
//! Fan-out at each level is small,
//! so branches are plain sorted arrays searched linearly while building.

use crate::{
    config::{preallocate, GrowthPolicy, NumberingConfig},
    error::{AllocSite, NumberingError},
};

/// Sort a face's node indices and left-pad them with zeroes to `len` entries.
///
/// Node indices start from 1, so the padding never collides with a node.
/// Faces with fewer nodes than the longest face of the dimensionality
/// (e.g. triangles among quadrangles) thus still get keys of a fixed length.
///
/// ```
/// # use tlmesh_core::intersection::canonical_key;
/// assert_eq!(canonical_key([7, 3, 5], 4)?, vec![0, 3, 5, 7]);
/// # Ok::<(), tlmesh_core::NumberingError>(())
/// ```
pub fn canonical_key(
    nodes: impl IntoIterator<Item = usize>,
    len: usize,
) -> Result<Vec<usize>, NumberingError> {
    let mut nodes: Vec<usize> = nodes.into_iter().collect();
    if nodes.len() > len {
        return Err(NumberingError::InvalidKey {
            expected: len,
            found: nodes.len(),
        });
    }
    nodes.sort_unstable();
    let mut key = vec![0; len - nodes.len()];
    key.extend(nodes);
    Ok(key)
}

/// Result of adding ports to the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddOutcome {
    /// Whether the junction received its first port in this call,
    /// i.e. whether it should be counted as a new intersection.
    pub created: bool,
}

/// The payload of a leaf: everything known about one junction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Junction {
    ports: Vec<usize>,
    /// boundary group of the first boundary element on this face
    boundary: Option<usize>,
}

#[derive(Clone, Debug)]
enum TreeNode {
    Branch {
        /// remaining depth to the leaves, never 0
        level: usize,
        keys: Vec<usize>,
        children: Vec<usize>,
        /// running total of junctions under `children[..=i]`, set by finalize
        accumulated: Vec<usize>,
    },
    Leaf(Junction),
}

/// A read-only view of one junction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JunctionRef<'a> {
    /// Id of the junction.
    pub id: usize,
    /// Canonical key of the junction's face.
    pub key: Vec<usize>,
    /// Ports coupled at the junction.
    pub ports: &'a [usize],
    /// Boundary group touching the junction, if any.
    pub boundary: Option<usize>,
}

/// Tree of junctions keyed by canonical node keys.
///
/// After [`finalize`][Self::finalize], junctions have dense ids
/// in the lexicographic order of their keys.
/// Only faces that received at least one port count as junctions;
/// faces only marked as boundaries are kept but get no id.
#[derive(Clone, Debug)]
pub struct IntersectionRegistry {
    depth: usize,
    arena: Vec<TreeNode>,
    growth: GrowthPolicy,
    /// initial key capacity of new branches, indexed by level
    level_hints: Vec<usize>,
    junctions: usize,
    finalized: bool,
}

const ROOT: usize = 0;

impl IntersectionRegistry {
    /// Create a registry for keys of length `depth` with an allocated root.
    pub fn initiate(depth: usize, config: &NumberingConfig) -> Result<Self, NumberingError> {
        if depth == 0 {
            return Err(NumberingError::InvalidKey {
                expected: 1,
                found: 0,
            });
        }
        let level_hints: Vec<usize> = (0..=depth)
            .map(|level| config.junction_hint(depth, level))
            .collect();
        let mut arena = preallocate(level_hints[depth] + 1, AllocSite::JunctionInit)?;
        arena.push(TreeNode::Branch {
            level: depth,
            keys: preallocate(level_hints[depth], AllocSite::JunctionInit)?,
            children: preallocate(level_hints[depth], AllocSite::JunctionInit)?,
            accumulated: Vec::new(),
        });
        Ok(Self {
            depth,
            arena,
            growth: config.junction_growth,
            level_hints,
            junctions: 0,
            finalized: false,
        })
    }

    /// Length of the keys of this registry.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of junctions with at least one port.
    #[inline]
    pub fn len(&self) -> usize {
        self.junctions
    }

    /// Whether there are no junctions with ports.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.junctions == 0
    }

    /// Whether [`finalize`][Self::finalize] has been called.
    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn check_key(&self, key: &[usize]) -> Result<(), NumberingError> {
        if key.len() != self.depth {
            return Err(NumberingError::InvalidKey {
                expected: self.depth,
                found: key.len(),
            });
        }
        if self.finalized {
            return Err(NumberingError::InvalidState {
                operation: "add junctions",
                state: "finalized",
            });
        }
        Ok(())
    }

    /// Append ports to the junction with the given canonical key,
    /// creating the path to it if needed.
    pub fn add(&mut self, key: &[usize], ports: &[usize]) -> Result<AddOutcome, NumberingError> {
        self.check_key(key)?;
        let leaf = self.find_or_insert(key)?;
        let growth = self.growth;
        let TreeNode::Leaf(junction) = &mut self.arena[leaf] else {
            return Ok(AddOutcome { created: false });
        };
        let created = junction.ports.is_empty() && !ports.is_empty();
        growth.reserve_for_extend(&mut junction.ports, ports.len(), AllocSite::JunctionPortGrow)?;
        junction.ports.extend_from_slice(ports);
        if created {
            self.junctions += 1;
        }
        Ok(AddOutcome { created })
    }

    /// Record that the face with the given key lies on a boundary group.
    ///
    /// The first group to mark a face is kept.
    /// This does not add a junction by itself;
    /// the face only becomes one once a port is added to it.
    pub fn mark_boundary(&mut self, key: &[usize], group: usize) -> Result<(), NumberingError> {
        self.check_key(key)?;
        let leaf = self.find_or_insert(key)?;
        if let TreeNode::Leaf(junction) = &mut self.arena[leaf] {
            junction.boundary.get_or_insert(group);
        }
        Ok(())
    }

    /// Walk the tree along `key`, creating missing nodes, and return the leaf's arena index.
    fn find_or_insert(&mut self, key: &[usize]) -> Result<usize, NumberingError> {
        let mut current = ROOT;
        for &k in key {
            let (level, pos, found) = match &self.arena[current] {
                TreeNode::Branch {
                    level,
                    keys,
                    children,
                    ..
                } => match keys.iter().position(|&x| x >= k) {
                    Some(pos) if keys[pos] == k => (*level, pos, Some(children[pos])),
                    Some(pos) => (*level, pos, None),
                    None => (*level, keys.len(), None),
                },
                TreeNode::Leaf(_) => break,
            };
            current = match found {
                Some(child) => child,
                None => self.insert_child(current, level - 1, pos, k)?,
            };
        }
        Ok(current)
    }

    /// Create a node at `level` and link it as child `pos` of `parent` under key `k`.
    fn insert_child(
        &mut self,
        parent: usize,
        level: usize,
        pos: usize,
        k: usize,
    ) -> Result<usize, NumberingError> {
        let node = if level == 0 {
            TreeNode::Leaf(Junction::default())
        } else {
            let hint = self.level_hints[level];
            TreeNode::Branch {
                level,
                keys: preallocate(hint, AllocSite::JunctionKeyGrow)?,
                children: preallocate(hint, AllocSite::JunctionKeyGrow)?,
                accumulated: Vec::new(),
            }
        };
        self.growth
            .reserve_for_push(&mut self.arena, AllocSite::JunctionArenaGrow)?;
        let child = self.arena.len();
        self.arena.push(node);

        let growth = self.growth;
        if let TreeNode::Branch { keys, children, .. } = &mut self.arena[parent] {
            growth.reserve_for_push(keys, AllocSite::JunctionKeyGrow)?;
            growth.reserve_for_push(children, AllocSite::JunctionKeyGrow)?;
            keys.insert(pos, k);
            children.insert(pos, child);
        }
        Ok(child)
    }

    /// Shrink every array to its contents and compute the running totals
    /// used to find junctions by id.
    ///
    /// Calling this again has no effect.
    pub fn finalize(&mut self) {
        // children are always allocated after their parents,
        // so a reverse walk sees every child before its parent
        let mut counts = vec![0; self.arena.len()];
        let mut orphans = 0;
        for idx in (0..self.arena.len()).rev() {
            match &mut self.arena[idx] {
                TreeNode::Leaf(junction) => {
                    junction.ports.shrink_to_fit();
                    if junction.ports.is_empty() {
                        orphans += 1;
                    } else {
                        counts[idx] = 1;
                    }
                }
                TreeNode::Branch {
                    keys,
                    children,
                    accumulated,
                    ..
                } => {
                    keys.shrink_to_fit();
                    children.shrink_to_fit();
                    accumulated.clear();
                    accumulated.reserve_exact(children.len());
                    let mut total = 0;
                    for &child in children.iter() {
                        total += counts[child];
                        accumulated.push(total);
                    }
                    counts[idx] = total;
                }
            }
        }
        self.arena.shrink_to_fit();
        if orphans > 0 && !self.finalized {
            log::debug!("{orphans} boundary faces have no adjacent node");
        }
        self.finalized = true;
    }

    /// Id of the junction with the given canonical key.
    ///
    /// `None` if there is no such junction or the registry isn't finalized yet.
    pub fn lookup(&self, key: &[usize]) -> Option<usize> {
        if !self.finalized || key.len() != self.depth {
            return None;
        }
        let mut current = ROOT;
        let mut id = 0;
        for &k in key {
            let TreeNode::Branch {
                keys,
                children,
                accumulated,
                ..
            } = &self.arena[current]
            else {
                return None;
            };
            let pos = keys.binary_search(&k).ok()?;
            if pos > 0 {
                id += accumulated[pos - 1];
            }
            current = children[pos];
        }
        match &self.arena[current] {
            TreeNode::Leaf(junction) if !junction.ports.is_empty() => Some(id),
            _ => None,
        }
    }

    /// Find the leaf of a junction by id in O(depth), collecting its key.
    fn locate(&self, id: usize) -> Option<(usize, Vec<usize>)> {
        if !self.finalized || id >= self.junctions {
            return None;
        }
        let mut current = ROOT;
        let mut remaining = id;
        let mut key = Vec::with_capacity(self.depth);
        while let TreeNode::Branch {
            keys,
            children,
            accumulated,
            ..
        } = &self.arena[current]
        {
            let pos = accumulated.partition_point(|&a| a <= remaining);
            if pos > 0 {
                remaining -= accumulated[pos - 1];
            }
            key.push(*keys.get(pos)?);
            current = children[pos];
        }
        Some((current, key))
    }

    /// The junction with the given id.
    pub fn junction(&self, id: usize) -> Option<JunctionRef<'_>> {
        let (leaf, key) = self.locate(id)?;
        match &self.arena[leaf] {
            TreeNode::Leaf(junction) => Some(JunctionRef {
                id,
                key,
                ports: &junction.ports,
                boundary: junction.boundary,
            }),
            TreeNode::Branch { .. } => None,
        }
    }

    /// The ports coupled at the junction with the given id.
    pub fn ports_at(&self, id: usize) -> Option<&[usize]> {
        let (leaf, _) = self.locate(id)?;
        match &self.arena[leaf] {
            TreeNode::Leaf(junction) => Some(&junction.ports),
            TreeNode::Branch { .. } => None,
        }
    }

    /// Iterate over all junctions in id order.
    pub fn iter(&self) -> impl '_ + Iterator<Item = JunctionRef<'_>> {
        (0..self.len()).filter_map(|id| self.junction(id))
    }

    /// Replace every port number in the tree, sorting each junction's ports afterwards.
    pub(crate) fn map_ports(
        &mut self,
        mut f: impl FnMut(usize) -> Result<usize, NumberingError>,
    ) -> Result<(), NumberingError> {
        for node in &mut self.arena {
            if let TreeNode::Leaf(junction) = node {
                for port in &mut junction.ports {
                    *port = f(*port)?;
                }
                junction.ports.sort_unstable();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use proptest::prelude::*;

    fn registry(depth: usize) -> IntersectionRegistry {
        IntersectionRegistry::initiate(depth, &NumberingConfig::default()).unwrap()
    }

    #[test]
    fn keys_are_canonical() {
        assert_eq!(canonical_key([2], 1).unwrap(), vec![2]);
        assert_eq!(canonical_key([9, 4], 2).unwrap(), vec![4, 9]);
        assert_eq!(canonical_key([5, 1, 3], 4).unwrap(), vec![0, 1, 3, 5]);
        assert_eq!(
            canonical_key([1, 2, 3], 2),
            Err(NumberingError::InvalidKey {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn permutations_share_a_junction() {
        let mut reg = registry(4);
        let face = [8, 3, 12, 5];
        let mut created = 0;
        for (port, perm) in face.iter().copied().permutations(4).enumerate() {
            let key = canonical_key(perm, 4).unwrap();
            if reg.add(&key, &[port]).unwrap().created {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        // a triangle on three of the same nodes is a different face
        let tri = canonical_key([12, 8, 5], 4).unwrap();
        assert!(reg.add(&tri, &[100]).unwrap().created);
        reg.finalize();

        assert_eq!(reg.len(), 2);
        // the padded triangle key sorts first
        assert_eq!(reg.lookup(&tri), Some(0));
        let quad = reg.junction(1).unwrap();
        assert_eq!(quad.key, vec![3, 5, 8, 12]);
        assert_eq!(quad.ports.len(), 24);
        assert_eq!(reg.lookup(&[3, 5, 8, 12]), Some(1));
        assert_eq!(reg.lookup(&[3, 5, 8, 13]), None);
    }

    #[test]
    fn boundary_marks_without_ports_are_not_junctions() {
        let mut reg = registry(2);
        reg.mark_boundary(&[1, 2], 0).unwrap();
        reg.mark_boundary(&[2, 3], 1).unwrap();
        reg.mark_boundary(&[2, 3], 0).unwrap();
        assert!(reg.add(&[2, 3], &[0]).unwrap().created);
        assert!(!reg.add(&[2, 3], &[1]).unwrap().created);
        assert!(reg.add(&[3, 4], &[2]).unwrap().created);
        reg.finalize();

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.lookup(&[1, 2]), None);
        let j = reg.junction(0).unwrap();
        assert_eq!((j.key.as_slice(), j.ports, j.boundary), (&[2, 3][..], &[0, 1][..], Some(1)));
        assert_eq!(reg.junction(1).unwrap().boundary, None);
        assert_eq!(reg.junction(2), None);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut reg = registry(2);
        for (i, key) in [[4, 7], [1, 9], [4, 5], [1, 9], [2, 2]].iter().enumerate() {
            reg.add(key, &[i]).unwrap();
        }
        reg.finalize();
        let once = reg.iter().map(|j| (j.key, j.ports.to_vec())).collect_vec();
        reg.finalize();
        let twice = reg.iter().map(|j| (j.key, j.ports.to_vec())).collect_vec();
        assert_eq!(once, twice);
        assert_eq!(
            once,
            vec![
                (vec![1, 9], vec![1, 3]),
                (vec![2, 2], vec![4]),
                (vec![4, 5], vec![2]),
                (vec![4, 7], vec![0]),
            ]
        );
        assert!(matches!(
            reg.add(&[1, 1], &[0]),
            Err(NumberingError::InvalidState { .. })
        ));
    }

    #[test]
    fn lookup_before_finalize_is_none() {
        let mut reg = registry(1);
        reg.add(&[3], &[0]).unwrap();
        assert_eq!(reg.lookup(&[3]), None);
        assert!(matches!(
            reg.add(&[3, 4], &[0]),
            Err(NumberingError::InvalidKey { .. })
        ));
    }

    proptest! {
        #[test]
        fn ids_follow_key_order(
            faces in prop::collection::vec(prop::collection::vec(1usize..12, 1..=4), 1..60),
        ) {
            let mut reg = registry(4);
            let mut keys = Vec::new();
            for (port, face) in faces.iter().enumerate() {
                let key = canonical_key(face.iter().rev().copied(), 4).unwrap();
                reg.add(&key, &[port]).unwrap();
                keys.push(key);
            }
            reg.finalize();

            let distinct = keys.iter().cloned().sorted().dedup().collect_vec();
            prop_assert_eq!(reg.len(), distinct.len());
            for (id, key) in distinct.iter().enumerate() {
                prop_assert_eq!(reg.lookup(key), Some(id));
                prop_assert_eq!(&reg.junction(id).unwrap().key, key);
            }
            for (port, key) in keys.iter().enumerate() {
                let id = reg.lookup(key).unwrap();
                prop_assert!(reg.ports_at(id).unwrap().contains(&port));
            }
        }
    }
}
