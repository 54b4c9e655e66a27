mod inset;
mod remove_holes;

pub use inset::{InsetForStacking, InsetReport};
pub use remove_holes::RemoveHoles;
