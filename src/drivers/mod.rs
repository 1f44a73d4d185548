pub mod clock;
pub mod sampler;
