//! Compile static type declarations into a structural model, then into
//! runtime validators for untyped data.
//!
//! ```text
//! TypeOracle ──build──▶ Model + DependencyMap ──generate──▶ Validators ──parse──▶ ParseResult
//! ```
use std::sync::Once;

pub mod builder;
pub mod error;
pub mod generate;
pub mod ir;
pub mod oracle;
pub mod path_de;
pub mod runtime;
pub mod value;

pub use builder::{
    BuildOptions, BuiltModel, ModelBuilder, build_declaration, build_model, build_models,
};
pub use error::{GenerationError, ModelGenerationError};
pub use generate::{Validator, Validators, generate};
pub use ir::{Model, ModelDocument};
pub use oracle::{ModuleOracle, TypeModule, TypeOracle};
pub use runtime::{ParseError, ParseFailure, ParseResult, envelope};
pub use value::Value;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`. Does nothing when
/// the variable is unset; safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .try_init();
        }
    });
}
