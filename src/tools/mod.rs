//! 能力处理器：问答、代码解释器、哈希链、图像理解、长期记忆

pub mod code_interpreter;
pub mod hash;
pub mod memory;
pub mod qa;
pub mod vision;

pub use code_interpreter::CodeInterpreter;
pub use hash::{hash_chain, HashAlgorithm};
pub use memory::MemoryCapability;
pub use qa::GeneralQa;
pub use vision::ImageDescriber;
