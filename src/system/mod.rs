pub mod fs;
pub mod storage;
pub mod urls;
