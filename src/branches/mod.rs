/*!
 * Branches Module
 * Branch configuration and the ordered set policies run over
 */

pub mod branch;
pub mod set;

pub use branch::{parse_size, Branch, BranchMode};
pub use set::{BranchGroup, BranchSet};
