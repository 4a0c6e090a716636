use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, trace, Level};

use crate::error::KdTreeError;
use crate::point::{squared_distance, Point};

/// Sentinel for an empty child slot or an empty tree.
const NONE: usize = usize::MAX;

#[derive(Clone, Debug)]
struct KdNode {
    point: Point,
    left: usize, // NONE if absent
    right: usize,
}

impl KdNode {
    fn leaf(point: Point) -> Self {
        KdNode {
            point,
            left: NONE,
            right: NONE,
        }
    }
}

/// A k-dimensional binary search tree over `f64` points.
///
/// A node at depth `d` splits on axis `d % k`: points strictly smaller on that axis live in
/// its left subtree, greater-or-equal points in its right subtree. Nodes are stored in an
/// arena and link to their children by index, so dropping the tree releases every node.
///
/// Insertion does not balance the tree. Call [`KdTree::rebalance`] after biased insertion
/// sequences (e.g. sorted input) to restore logarithmic depth.
///
/// The tree is not synchronized. Shared read access (including [`KdTree::nearest_many`])
/// is fine; concurrent mutation needs an outer lock.
#[derive(Clone, Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    root: usize,
    k: usize,
}

/// Pending work of the nearest-neighbor walk.
enum Visit {
    /// Descend into a subtree.
    Node { index: usize, depth: usize },
    /// Descend into the far side of a split, unless the plane is already too far.
    Far { index: usize, depth: usize, plane_dist_sq: f64 },
}

/// A range of the arena to rebuild, and the slot its root gets linked into.
struct Build {
    start: usize,
    end: usize,
    depth: usize,
    parent: usize,
    is_left: bool,
}

impl KdTree {
    /// Creates an empty tree for points with `k` coordinates.
    ///
    /// # Errors
    ///
    /// [`KdTreeError::ZeroDimensions`] if `k` is zero.
    pub fn new(k: usize) -> Result<Self, KdTreeError> {
        if k == 0 {
            return Err(KdTreeError::ZeroDimensions);
        }
        Ok(KdTree {
            nodes: Vec::new(),
            root: NONE,
            k,
        })
    }

    /// Creates an empty tree with room for `capacity` points before the arena grows.
    pub fn with_capacity(k: usize, capacity: usize) -> Result<Self, KdTreeError> {
        let mut tree = Self::new(k)?;
        tree.nodes.try_reserve_exact(capacity)?;
        Ok(tree)
    }

    /// Builds a balanced tree from a set of points in one go.
    ///
    /// Every point is validated before anything is stored.
    #[tracing::instrument(skip_all, fields(dimensions = k, count = points.len()))]
    pub fn from_points<P: AsRef<[f64]>>(k: usize, points: &[P]) -> Result<Self, KdTreeError> {
        let mut tree = Self::with_capacity(k, points.len())?;
        for p in points {
            tree.check_dimensions(p.as_ref().len())?;
        }
        for p in points {
            tree.nodes.push(KdNode::leaf(Point::try_new(p.as_ref())?));
        }
        tree.rebalance();
        Ok(tree)
    }

    /// Number of coordinates every point in this tree has.
    pub fn dimensions(&self) -> usize {
        self.k
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check_dimensions(&self, found: usize) -> Result<(), KdTreeError> {
        if found != self.k {
            return Err(KdTreeError::DimensionMismatch {
                expected: self.k,
                found,
            });
        }
        Ok(())
    }

    /// Inserts a copy of `coords`.
    ///
    /// The walk starts at the root and compares one axis per level: strictly smaller goes
    /// left, anything else goes right. Duplicates are kept as separate nodes.
    ///
    /// # Errors
    ///
    /// [`KdTreeError::DimensionMismatch`] if `coords` does not have `k` entries, or
    /// [`KdTreeError::Allocation`] if the point or its node could not be allocated. In both
    /// cases the tree is unchanged.
    pub fn insert(&mut self, coords: &[f64]) -> Result<(), KdTreeError> {
        self.check_dimensions(coords.len())?;
        let point = Point::try_new(coords)?;
        self.nodes.try_reserve(1)?;
        self.link(point);
        Ok(())
    }

    /// Walks down from the root and hangs `point` into the first empty slot.
    ///
    /// The caller has validated the point and reserved an arena slot, so nothing here can
    /// fail: the link and the push happen together.
    fn link(&mut self, point: Point) {
        let index = self.nodes.len();
        if self.root == NONE {
            self.root = index;
        } else {
            let mut current = self.root;
            let mut depth = 0;
            loop {
                let axis = depth % self.k;
                let node = &mut self.nodes[current];
                let slot = if point[axis] < node.point[axis] {
                    &mut node.left
                } else {
                    &mut node.right
                };
                if *slot == NONE {
                    *slot = index;
                    break;
                }
                current = *slot;
                depth += 1;
            }
        }
        self.nodes.push(KdNode::leaf(point));
    }

    /// Links a batch of already allocated points after reserving room for all of them.
    fn link_all(&mut self, points: Vec<Point>) -> Result<(), KdTreeError> {
        self.nodes.try_reserve(points.len())?;
        for point in points {
            self.link(point);
        }
        Ok(())
    }

    /// Inserts every point of a flat buffer `[x0, y0, .., x1, y1, ..]`.
    ///
    /// All points are copied before the first one is linked, so a failure leaves the tree
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`KdTreeError::FlatLength`] if the buffer does not hold a whole number of points, or
    /// [`KdTreeError::Allocation`] if the copies or their nodes could not be allocated.
    #[tracing::instrument(skip_all, fields(len = coords.len()))]
    pub fn extend_from_flat(&mut self, coords: &[f64]) -> Result<(), KdTreeError> {
        if coords.len() % self.k != 0 {
            return Err(KdTreeError::FlatLength {
                len: coords.len(),
                dimensions: self.k,
            });
        }
        let mut points = Vec::new();
        points.try_reserve_exact(coords.len() / self.k)?;
        for chunk in coords.chunks_exact(self.k) {
            points.push(Point::try_new(chunk)?);
        }
        self.link_all(points)
    }

    /// Inserts `count` uniformly distributed points inside the cube `[min, max)^k`.
    ///
    /// Either all `count` points are inserted or, on allocation failure, none.
    #[tracing::instrument(skip(self))]
    pub fn random_points(&mut self, count: usize, min: f64, max: f64) -> Result<(), KdTreeError> {
        let mut rng = StdRng::seed_from_u64(get_seed());
        let width = max - min;

        let mut points = Vec::new();
        points.try_reserve_exact(count)?;
        let mut coords = vec![0.0; self.k];
        for _ in 0..count {
            for c in coords.iter_mut() {
                *c = min + rng.r#gen::<f64>() * width;
            }
            points.push(Point::try_new(&coords)?);
        }
        self.link_all(points)
    }

    /// Returns a copy of the stored point closest to `target`, or `None` for an empty tree.
    ///
    /// Ties between equally distant points go to whichever the traversal meets first.
    ///
    /// # Errors
    ///
    /// [`KdTreeError::DimensionMismatch`] if `target` does not have `k` entries.
    pub fn nearest(&self, target: &[f64]) -> Result<Option<Point>, KdTreeError> {
        Ok(self.nearest_with_distance(target)?.map(|(point, _)| point))
    }

    /// Like [`KdTree::nearest`], but also returns the squared distance to the point found.
    pub fn nearest_with_distance(&self, target: &[f64]) -> Result<Option<(Point, f64)>, KdTreeError> {
        self.check_dimensions(target.len())?;
        match self.nearest_index(target) {
            Some((index, dist_sq)) => {
                let point = Point::try_new(self.nodes[index].point.coords())?;
                Ok(Some((point, dist_sq)))
            }
            None => Ok(None),
        }
    }

    /// Answers a batch of nearest-neighbor queries in parallel.
    ///
    /// All targets are validated first. The result has one entry per target, in order.
    #[tracing::instrument(skip_all, fields(queries = targets.len(), points = self.nodes.len()))]
    pub fn nearest_many<T>(&self, targets: &[T]) -> Result<Vec<Option<Point>>, KdTreeError>
    where
        T: AsRef<[f64]> + Sync,
    {
        for t in targets {
            self.check_dimensions(t.as_ref().len())?;
        }
        Ok(targets
            .par_iter()
            .map(|t| {
                self.nearest_index(t.as_ref())
                    .map(|(index, _)| self.nodes[index].point.clone())
            })
            .collect())
    }

    /// Depth-first search with hyperplane pruning.
    ///
    /// Equivalent to the recursive formulation: visit the node, descend into the child on
    /// the target's side of the split, then descend into the other child only if the squared
    /// distance to the splitting plane is below the best distance found so far. The explicit
    /// stack keeps degenerate (list-shaped) trees from overflowing the call stack.
    fn nearest_index(&self, target: &[f64]) -> Option<(usize, f64)> {
        if self.root == NONE {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        let mut stack = vec![Visit::Node { index: self.root, depth: 0 }];

        while let Some(visit) = stack.pop() {
            let (index, depth) = match visit {
                Visit::Node { index, depth } => (index, depth),
                Visit::Far { index, depth, plane_dist_sq } => {
                    if best.is_some_and(|(_, d)| plane_dist_sq >= d) {
                        continue;
                    }
                    (index, depth)
                }
            };

            let node = &self.nodes[index];
            let dist_sq = squared_distance(node.point.coords(), target);
            if best.is_none_or(|(_, d)| dist_sq < d) {
                best = Some((index, dist_sq));
            }

            let axis = depth % self.k;
            let diff = target[axis] - node.point[axis];
            let (near, far) = if diff < 0.0 {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };

            // Far is pushed first so it is only considered once the near side is exhausted.
            if far != NONE {
                stack.push(Visit::Far {
                    index: far,
                    depth: depth + 1,
                    plane_dist_sq: diff * diff,
                });
            }
            if near != NONE {
                stack.push(Visit::Node { index: near, depth: depth + 1 });
            }
        }

        best
    }

    /// Rebuilds the tree into its median-balanced shape.
    ///
    /// Every stored point is kept; only the node structure changes. For each range at depth
    /// `d` the points are sorted on axis `d % k` and the element at `len / 2` becomes the
    /// subtree root. When equal values precede it, the split moves left to the first of
    /// them, so the left side stays strictly smaller. Previously returned points are copies
    /// and are not affected.
    ///
    /// The arena itself serves as the flat point buffer, so the rebuild allocates no nodes
    /// and cannot fail.
    #[tracing::instrument(skip_all, fields(points = self.nodes.len()))]
    pub fn rebalance(&mut self) {
        let before = if tracing::enabled!(Level::DEBUG) { Some(self.depth()) } else { None };

        let k = self.k;
        let nodes = &mut self.nodes;
        self.root = NONE;

        let mut stack = vec![Build {
            start: 0,
            end: nodes.len(),
            depth: 0,
            parent: NONE,
            is_left: false,
        }];

        while let Some(task) = stack.pop() {
            if task.start == task.end {
                continue;
            }

            let axis = task.depth % k;
            let range = &mut nodes[task.start..task.end];
            range.sort_unstable_by(|a, b| a.point[axis].total_cmp(&b.point[axis]));

            let mut mid = range.len() / 2;
            let split = range[mid].point[axis];
            while mid > 0 && range[mid - 1].point[axis] == split {
                mid -= 1;
            }

            let index = task.start + mid;
            nodes[index].left = NONE;
            nodes[index].right = NONE;
            if task.parent == NONE {
                self.root = index;
            } else if task.is_left {
                nodes[task.parent].left = index;
            } else {
                nodes[task.parent].right = index;
            }

            stack.push(Build {
                start: index + 1,
                end: task.end,
                depth: task.depth + 1,
                parent: index,
                is_left: false,
            });
            stack.push(Build {
                start: task.start,
                end: index,
                depth: task.depth + 1,
                parent: index,
                is_left: true,
            });
        }

        if let Some(before) = before {
            debug!(before, after = self.depth(), "rebalanced");
        }
    }

    /// Number of nodes on the longest root-to-leaf path; zero for an empty tree.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        if self.root == NONE {
            return max_depth;
        }
        let mut stack = vec![(self.root, 1)];
        while let Some((index, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            let node = &self.nodes[index];
            for child in [node.left, node.right] {
                if child != NONE {
                    stack.push((child, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Iterates over the stored points in pre-order.
    pub fn iter(&self) -> Iter<'_> {
        let stack = if self.root == NONE { Vec::new() } else { vec![self.root] };
        Iter { tree: self, stack }
    }

    /// Owned copies of every stored point, in pre-order.
    pub fn to_points(&self) -> Vec<Point> {
        self.iter().cloned().collect()
    }

    /// Checks the split invariant on every node.
    ///
    /// Walks the tree carrying the tightest bounds inherited from the ancestors: an exclusive
    /// upper bound from every ancestor whose left subtree we are in, an inclusive lower bound
    /// from every ancestor whose right subtree we are in.
    pub fn check_invariant(&self) -> bool {
        if self.root == NONE {
            return true;
        }
        let unbounded = vec![None; self.k];
        let mut stack: Vec<(usize, usize, Vec<Option<f64>>, Vec<Option<f64>>)> =
            vec![(self.root, 0, unbounded.clone(), unbounded)];

        while let Some((index, depth, lower, upper)) = stack.pop() {
            let node = &self.nodes[index];
            for axis in 0..self.k {
                let v = node.point[axis];
                if lower[axis].is_some_and(|lo| v < lo) || upper[axis].is_some_and(|hi| v >= hi) {
                    trace!(index, axis, "split invariant violated");
                    return false;
                }
            }

            let axis = depth % self.k;
            let split = node.point[axis];
            if node.left != NONE {
                let mut upper = upper.clone();
                upper[axis] = Some(upper[axis].map_or(split, |hi| hi.min(split)));
                stack.push((node.left, depth + 1, lower.clone(), upper));
            }
            if node.right != NONE {
                let mut lower = lower;
                lower[axis] = Some(lower[axis].map_or(split, |lo| lo.max(split)));
                stack.push((node.right, depth + 1, lower, upper));
            }
        }
        true
    }
}

/// Pre-order iterator over the points of a [`KdTree`].
#[derive(Debug)]
pub struct Iter<'a> {
    tree: &'a KdTree,
    stack: Vec<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Point;

    fn next(&mut self) -> Option<&'a Point> {
        let index = self.stack.pop()?;
        let node = &self.tree.nodes[index];
        if node.right != NONE {
            self.stack.push(node.right);
        }
        if node.left != NONE {
            self.stack.push(node.left);
        }
        Some(&node.point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.stack.len(), Some(self.tree.nodes.len()))
    }
}

impl<'a> IntoIterator for &'a KdTree {
    type Item = &'a Point;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

fn get_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Math::random() * 4294967296.0) as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        123456789
    }
}
