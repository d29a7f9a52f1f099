//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (TaxonomySource, SaveSink, Selector, etc.)
//! but are themselves concrete structs, not traits.

mod picker;
mod session;

pub use picker::{FetchResponse, FetchTask, PickerOptions, PickerService, SelectStep};
pub use session::{MenuAction, PickerSession};
