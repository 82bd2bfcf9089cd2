pub mod delay;
pub mod display;
pub mod machine;
pub mod media;

#[cfg(test)]
pub(crate) mod simulated;
