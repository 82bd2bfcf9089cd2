pub mod config;
pub mod error;
pub mod library;
pub mod media;
pub mod memory;
pub mod player;
pub mod system;

pub use config::Config;
pub use error::{ReelshelfError, Result};
pub use library::{FolderPick, Library};
pub use media::catalog::{Catalog, Collection, VideoAsset};
pub use memory::{FolderMemory, FolderMemoryService};
pub use player::machine::{Player, PlayerContext, PlayerState, SwitchOutcome};
pub use player::media::{MediaElement, MediaEvent, MediaEventBus, Subscription};
