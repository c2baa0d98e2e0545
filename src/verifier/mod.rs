pub mod mock;
pub mod noop;
pub mod variant;

pub use mock::{MockVerdict, MockVerifier};
pub use noop::NoopVerifier;
pub use variant::VerifierVariant;
