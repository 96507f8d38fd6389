//! Stream acquisition: the synthetic signal generator and the sources the
//! tick loop pulls values from.

pub mod generator;
pub mod source;

pub use generator::{GeneratorError, GeneratorParams, SignalGenerator};
pub use source::{LineSource, ParseLineError, ReplaySource, SampleEvent, SampleSource, StdinSource, SyntheticSource};
