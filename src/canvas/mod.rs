pub mod config;
pub mod layout;
pub mod refresh;
pub mod render;
pub mod snapshot;
pub mod state;
pub mod storage;

pub use config::{CardConfig, CardEntry, SettingsUpdate};
pub use layout::{Breakpoint, Breakpoints, CardLayouts, DroppedItem, LayoutItem};
pub use refresh::RefreshScheduler;
pub use render::render_pass;
pub use snapshot::{decode_upload, encode_upload, ExportDocument, Snapshot};
pub use state::CanvasState;
pub use storage::SnapshotStorage;
