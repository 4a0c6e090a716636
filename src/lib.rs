//! # kdspace
//!
//! `kdspace` is a Rust library for k-dimensional binary search trees (kd-trees), designed to be
//! used in Rust as well as compiled to WebAssembly (WASM). It stores points of a fixed
//! dimensionality and answers nearest-neighbor queries by squared Euclidean distance.
//!
//! ## Features
//!
//! - **Any dimensionality**: the number of coordinates is chosen at construction time.
//! - **Pruned search**: nearest-neighbor queries descend the near side first and skip any
//!   subtree whose splitting plane is farther than the best candidate.
//! - **Rebalancing**: rebuild the tree by axis medians after unbalanced insertion sequences.
//! - **Batch queries**: answer many queries in parallel with `rayon`.
//! - **WASM-first**: a `KdTree` class is exported with `wasm-bindgen`.
//!
//! ## Example
//!
//! ```
//! use kdspace::KdTree;
//!
//! let mut tree = KdTree::new(2)?;
//! for p in [[2.0, 3.0], [5.0, 4.0], [9.0, 6.0], [4.0, 7.0], [8.0, 1.0], [7.0, 2.0]] {
//!     tree.insert(&p)?;
//! }
//! let nearest = tree.nearest(&[5.0, 5.0])?;
//! assert_eq!(nearest.map(|p| p.to_string()), Some("(5, 4)".to_string()));
//!
//! tree.rebalance();
//! assert_eq!(tree.depth(), 3);
//! # Ok::<(), kdspace::KdTreeError>(())
//! ```
//!
//! See the `demos/` directory for a runnable demonstration and a profiling workload.
//!
//! ## Main Interface
//!
//! The primary entry point is the [`KdTree`] struct, which owns every stored [`Point`].

mod error;
mod kdtree;
mod point;
pub mod wasm;

pub use error::KdTreeError;
pub use kdtree::Iter;
pub use kdtree::KdTree;
pub use point::Point;
