//! BK-tree: an index over a metric space answering "everything within radius
//! `r` of `q`" without comparing `q` against every stored element.
//!
//! Elements implement [`MetricElement`]; the distance has to be a true metric
//! for insertion and pruning to be correct.
//!
//! ```
//! use bktree::{Tree, Word};
//!
//! let tree: Tree<Word> = ["book", "books", "cake", "boo", "cape"]
//!     .into_iter()
//!     .map(Word::from)
//!     .collect();
//!
//! let hits = tree.search(&Word::from("bo"), 1).unwrap();
//! let found: Vec<&str> = hits.matches.iter().map(|w| w.as_str()).collect();
//! assert_eq!(found, vec!["boo"]);
//! assert!(hits.comparisons < tree.len());
//! ```

pub mod cli;
pub mod concurrent;
pub mod config;
pub mod errors;
pub mod exitcode;
pub mod export;
pub mod metric;
pub mod node;
pub mod search;
pub mod tree;
pub mod util;

pub use concurrent::{ConcurrentHits, SearchPool};
pub use config::{ConcurrentSearchConfig, Settings};
pub use errors::{TreeError, TreeResult};
pub use export::ExportNode;
pub use metric::{Bits, Distance, MetricElement, Point, Word};
pub use node::TreeNode;
pub use search::SearchHits;
pub use tree::{InsertOutcome, Tree};
