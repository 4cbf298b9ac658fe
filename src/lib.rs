//! Stackfuzz core library: random stack-machine programs, failure search and shrinking.

#[path = "modes/annotate.rs"]
mod annotate;
#[path = "runtime/clock.rs"]
mod clock;
#[path = "platform/config.rs"]
mod config;
#[path = "runtime/context.rs"]
mod context;
#[path = "runtime/engine.rs"]
mod engine;
#[path = "platform/error.rs"]
mod error;
#[path = "model/failure.rs"]
mod failure;
#[path = "model/language.rs"]
mod language;
#[path = "model/library.rs"]
mod library;
#[path = "runtime/machine.rs"]
mod machine;
#[path = "model/operation.rs"]
mod operation;
#[path = "model/reporting.rs"]
mod reporting;
#[path = "runtime/rng.rs"]
mod rng;
#[path = "modes/search.rs"]
mod search;
#[path = "modes/shrink.rs"]
mod shrink;
#[path = "model/value.rs"]
mod value;
#[path = "runtime/varstack.rs"]
mod varstack;

pub use annotate::*;
pub use clock::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use failure::*;
pub use language::*;
pub use library::*;
pub use machine::*;
pub use operation::*;
pub use reporting::*;
pub use rng::*;
pub use search::*;
pub use shrink::*;
pub use value::*;
pub use varstack::*;
