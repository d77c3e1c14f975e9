//! facesyncd — The face-identity lifecycle and matching pipeline.
//!
//! Reacts to content-save/delete events: member saves rebuild that member's
//! enrollment in the remote recognition group, media saves match detected
//! faces back to enrolled members, member deletes clean up best-effort.
//! Hosts drive the pipeline through [`engine::EngineHandle`]; the bundled
//! binary is a reference host fed newline-delimited JSON events on stdin.

pub mod config;
pub mod engine;
pub mod events;
pub mod group;
pub mod matching;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::Config;
pub use engine::{spawn_engine, EngineError, EngineHandle};
