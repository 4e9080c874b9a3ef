pub mod archive;
pub mod assign;
pub mod instructions;
pub mod list;
pub mod new;
pub mod phase;
pub mod progress;
pub mod status;
pub mod version;
