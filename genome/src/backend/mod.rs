//! Generation backends.

pub mod fallback;
pub mod mock;
pub mod remote;
pub mod traits;

pub use fallback::FallbackGenerator;
pub use mock::MockGenerator;
pub use remote::RemoteGenerator;
pub use traits::{GenerationBackend, SamplingParams, SuffixRequest, SuffixResponse};
