pub mod assemble;
pub mod export;
pub mod extract;
pub mod levels;
pub mod offset;
pub mod stacking;
