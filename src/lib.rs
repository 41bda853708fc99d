pub mod config;
pub mod error;
pub mod interactive;
pub mod pipeline;
pub mod subtitle;
pub mod translate;

pub use config::Config;
pub use error::{ProtocolError, Result, SubtransError};
pub use pipeline::{
    print_summary, translate_file, translate_file_with_cancel, PipelineConfig, PipelineResult,
    PipelineStats,
};
pub use subtitle::SubtitleEntry;
pub use translate::{RunOutcome, TranslationSettings};
