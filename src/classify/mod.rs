// src/classify/mod.rs

//! Classification of raw notifications into semantic change events.
//!
//! The pure state machine lives in [`core`]; the async loop that owns the
//! timer, channels and shutdown handling is in [`runtime`].
//!
//! Raw bit patterns and what they mean (slot 1 is the older notification):
//!
//! | slot 1  | slot 0          | result          |
//! |---------|-----------------|-----------------|
//! | CREATE  | RENAME\|REMOVE  | RenameFolder    |
//! | CREATE  | RENAME          | RenameFile      |
//! | REMOVE  | CREATE          | EditFile        |
//! | CREATE  | REMOVE          | (suppressed)    |
//! | any     | RENAME\|REMOVE  | DeleteFolder    |
//! | any     | RENAME          | DeleteFile      |
//! | any     | CREATE          | timer, then CreateFile / CreateFolder |

pub mod buffer;
pub mod core;
pub mod noise;
pub mod runtime;

/// Default delay before a bare create is resolved.
pub const DEFAULT_CREATE_DELAY_MS: u64 = 125;

pub use buffer::LookbackBuffer;
pub use self::core::{decide, ClassifierStep, Decision, EventClassifier};
pub use noise::{NoiseFilter, DEFAULT_IGNORE};
pub use runtime::{ClassifierRuntime, WatchStreams};
