pub mod stage0_validate;
pub mod stage1_classify;
pub mod stage2_segment;
pub mod stage3_emit;

pub use stage0_validate::*;
pub use stage1_classify::*;
pub use stage2_segment::*;
pub use stage3_emit::*;
