pub mod fs;
pub mod workspace;
