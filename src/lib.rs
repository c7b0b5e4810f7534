pub mod machine;
pub mod memory;
