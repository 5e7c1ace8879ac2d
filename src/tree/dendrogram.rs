//! Merge history of agglomerative clustering and cutting it into clusters.

use crate::error::{FlockError, Result};
use serde::{Deserialize, Serialize};

/// A node of the merge tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    /// An original point, by index.
    Leaf(usize),
    /// The cluster formed by merge step `n` (0-based).
    Merge(usize),
}

/// One merge step: two clusters joined at a distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    /// First child.
    pub left: NodeId,
    /// Second child.
    pub right: NodeId,
    /// Linkage distance between the children.
    pub distance: f64,
}

/// Full merge history over `npoints` points, in formation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDendrogram")]
pub struct Dendrogram {
    npoints: usize,
    merges: Vec<Merge>,
}

/// Unchecked serialized form of a [`Dendrogram`].
#[derive(Deserialize)]
struct RawDendrogram {
    npoints: usize,
    merges: Vec<Merge>,
}

impl TryFrom<RawDendrogram> for Dendrogram {
    type Error = FlockError;

    fn try_from(raw: RawDendrogram) -> Result<Self> {
        Dendrogram::from_merges(raw.npoints, raw.merges)
    }
}

impl Dendrogram {
    /// Creates an empty history over `npoints` points.
    pub fn new(npoints: usize) -> Self {
        Self {
            npoints,
            merges: Vec::with_capacity(npoints.saturating_sub(1)),
        }
    }

    /// Creates a history from merge records.
    ///
    /// Each record may only reference points below `npoints` and earlier
    /// merge steps.
    pub fn from_merges(npoints: usize, merges: Vec<Merge>) -> Result<Self> {
        if merges.len() >= npoints.max(1) {
            return Err(FlockError::Config(format!(
                "{} merges over {} points",
                merges.len(),
                npoints
            )));
        }
        let mut leaf_used = vec![false; npoints];
        let mut merge_used = vec![false; merges.len()];
        for (step, merge) in merges.iter().enumerate() {
            for node in [merge.left, merge.right] {
                let used = match node {
                    NodeId::Leaf(p) if p < npoints => &mut leaf_used[p],
                    NodeId::Merge(s) if s < step => &mut merge_used[s],
                    _ => {
                        return Err(FlockError::Config(format!(
                            "merge {} references invalid node {:?}",
                            step, node
                        )));
                    }
                };
                // Each node joins exactly one parent.
                if *used {
                    return Err(FlockError::Config(format!(
                        "merge {} reuses node {:?}",
                        step, node
                    )));
                }
                *used = true;
            }
        }
        Ok(Self { npoints, merges })
    }

    pub(crate) fn push(&mut self, merge: Merge) {
        self.merges.push(merge);
    }

    /// Number of original points.
    #[inline]
    pub fn npoints(&self) -> usize {
        self.npoints
    }

    /// The merge records, in formation order.
    #[inline]
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Number of merge records.
    #[inline]
    pub fn len(&self) -> usize {
        self.merges.len()
    }

    /// True when no merges were recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    /// Points under a node.
    pub fn leaves(&self, node: NodeId) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            match node {
                NodeId::Leaf(p) => leaves.push(p),
                NodeId::Merge(s) => {
                    let merge = &self.merges[s];
                    stack.push(merge.right);
                    stack.push(merge.left);
                }
            }
        }
        leaves.sort_unstable();
        leaves
    }

    /// Cuts the tree into `k` clusters.
    ///
    /// Applies the first `npoints - k` merges and labels the resulting
    /// components `0..k`, in order of each component's lowest point index.
    pub fn cut(&self, k: usize) -> Result<Vec<usize>> {
        let n = self.npoints;
        if k == 0 || k > n {
            return Err(FlockError::Config(format!(
                "cannot cut {} points into {} clusters",
                n, k
            )));
        }
        let joins = n - k;
        if joins > self.merges.len() {
            return Err(FlockError::Config(format!(
                "tree has {} merges, {} needed for {} clusters",
                self.merges.len(),
                joins,
                k
            )));
        }

        let mut parent: Vec<usize> = (0..n).collect();
        let mut representative = Vec::with_capacity(joins);

        let leaf_of = |node: NodeId, representative: &[usize]| match node {
            NodeId::Leaf(p) => p,
            NodeId::Merge(s) => representative[s],
        };

        for merge in &self.merges[..joins] {
            let a = find(&mut parent, leaf_of(merge.left, &representative));
            let b = find(&mut parent, leaf_of(merge.right, &representative));
            let root = a.min(b);
            parent[a] = root;
            parent[b] = root;
            representative.push(root);
        }

        let mut labels = vec![usize::MAX; n];
        let mut assignment = vec![0; n];
        let mut next = 0;
        for point in 0..n {
            let root = find(&mut parent, point);
            if labels[root] == usize::MAX {
                labels[root] = next;
                next += 1;
            }
            assignment[point] = labels[root];
        }

        debug_assert_eq!(next, k);
        Ok(assignment)
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}
