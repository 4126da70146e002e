// Binding Discovery for AND/OR Splits and Joins
//
// Each activity's neighbours in the dependency graph only say which
// activities CAN follow or precede it. Bindings say which combinations
// actually do: a trace is replayed occurrence by occurrence, and the set of
// arc targets observed in each activation window becomes one observation.
//
// Scientific Foundation:
// [1] Weijters, A. J. M. M., & Ribeiro, J. T. S. (2011). Flexible Heuristics
//     Miner (FHM). IEEE Symposium on Computational Intelligence and Data Mining.
//
// Key Insight: AND vs OR is never asserted up front. A binding of size 1 is
// an OR-choice, a binding of size > 1 is an AND-combination, and the shape of
// the observed table decides.

mod input;
mod output;
mod table;

pub use input::discover_input_bindings;
pub use output::discover_output_bindings;
pub use table::{Binding, BindingTable, BindingTables};
