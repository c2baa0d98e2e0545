pub mod merkle_accumulator;
pub mod mock;
pub mod registry;
pub mod variant;

pub use merkle_accumulator::MerkleAccumulator;
pub use mock::MockAccumulator;
pub use registry::{AccumulatorFactory, AccumulatorRegistry, GroupAccumulator, GroupSlot};
pub use variant::AccumulatorVariant;
