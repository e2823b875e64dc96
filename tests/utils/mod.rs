pub mod assertions;
pub mod setup;
pub mod sheets;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::JsonResponse;
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
#[allow(unused_imports)]
pub use sheets::SheetBuilder;
