pub mod broadcaster;
pub mod dev_process;
pub mod fixture;
pub mod scenario;

pub use crate::domain::model::{AssetsManifest, PingPayload, ServerBuild};
pub use crate::domain::ports::DevNotifier;
pub use crate::utils::error::Result;
