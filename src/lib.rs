#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod activity;
pub mod address;
pub mod config;
pub mod loader;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod project;
pub mod queue;
pub mod render;
pub mod resolver;
pub mod storage;

pub use activity::{ActivityEvent, ActivityLog, LogStyle};
pub use config::{ConfigError, LoaderConfig};
pub use loader::{AssetLoader, LoaderContext, RenderOutput};
pub use models::{AssetKind, AssetRecord, CacheArtifact, PartialRecord, QueueInput};
pub use project::AssetLayout;
pub use storage::{AssetStorage, DiskStorage};
