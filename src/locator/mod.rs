mod resolver;
pub mod rule;
mod target;
pub mod targets;

pub use resolver::Resolver;
pub use rule::{collapse_whitespace, AttrFilter, AttrOp, ElementPattern, SelectionRule, TextMatch};
pub use target::{LocateResult, Target};
pub use targets::TargetTable;
