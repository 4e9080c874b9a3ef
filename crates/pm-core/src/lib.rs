pub mod codec;
pub mod config;
pub mod error;
pub mod io;
pub mod lifecycle;
pub mod metrics;
pub mod paths;
pub mod service;
pub mod store;
pub mod templates;
pub mod types;
pub mod vcs;
pub mod workitem;

pub use config::Config;
pub use error::{PmError, Result};
pub use service::WorkItemService;
pub use types::{ItemStatus, ItemType, Phase};
pub use workitem::{ListFilter, Task, WorkItem};
