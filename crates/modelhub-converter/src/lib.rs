//! # ModelHub Converter
//!
//! Conversion pipeline that turns one uploaded 3D model into another
//! format by driving the Assimp command line tool.
//!
//! A request flows through [`Stager`] (exactly-one-model validation and
//! working directory setup) and [`ConversionRunner`] (argument building and
//! process supervision). [`RequestOrchestrator`] composes both and resolves
//! the output format through the static [`formats`] registry.

pub mod error;
pub mod formats;
pub mod models;
pub mod options;
pub mod orchestrator;
pub mod process;
pub mod runner;
pub mod stager;

pub use error::ConversionError;
pub use formats::{Direction, FormatDescriptor};
pub use models::{ConversionOutput, ConversionRequest, FileResponse, StagedJob, UploadedFile};
pub use orchestrator::RequestOrchestrator;
pub use process::{ProcessError, ProcessInvocation, ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use runner::ConversionRunner;
pub use stager::Stager;
