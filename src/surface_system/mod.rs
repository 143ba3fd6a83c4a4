pub mod boundary;
pub mod extractor;
pub mod sampling;
pub mod volume;
