pub mod processor;

pub use processor::{Processor, ProcessorRequest};
