//! Training Pipelines
//!
//! Two training paths share the model, batchers, and progress reporting:
//!
//! - [`semi`]: mixup training over paired labeled/unlabeled batches
//! - [`supervised`]: the plain cross-entropy baseline
//!
//! Supporting pieces: the shared-draw mixup combiner ([`mixup`]), the cosine
//! rampdown learning-rate schedule ([`schedule`]), and the progress sink
//! trait ([`progress`]).

pub mod mixup;
pub mod progress;
pub mod schedule;
pub mod semi;
pub mod supervised;

pub use mixup::{combine, cross_entropy_each, mixup_cross_entropy, MixedStep, MixupDraw, MixupRng};
pub use progress::{ConsoleSink, NullSink, StepUpdate, TrainingSink};
pub use schedule::{cosine_rampdown, LrSchedule};
pub use semi::{run_semi_supervised, EpochReport, SemiSupervisedTrainer};
pub use supervised::{run_supervised, SupervisedEpochReport, SupervisedTrainer};
