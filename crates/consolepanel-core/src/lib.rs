//! consolepanel-core: remote control of desktop console windows
//!
//! Bridges a client to the external OS-automation tools that enumerate,
//! capture and drive console windows, and provides the client-side pieces
//! that keep a live view of those windows.
//!
//! # Main Entry Points
//!
//! - [`tools`] - Capture/control adapter over the external tools
//! - [`process`] - Child process execution with timeouts
//! - [`reconcile`] - Display order reconciliation across window snapshots
//! - [`scheduler`] - Per-window capture scheduling
//! - [`preferences`] - Stars, nicknames and recents
//! - [`config`] - Configuration management

pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod paths;
pub mod preferences;
pub mod process;
pub mod reconcile;
pub mod scheduler;
pub mod tools;
pub mod windows;

pub use config::PanelConfig;
pub use errors::{ConfigError, PanelError};
pub use paths::{Breadcrumb, PathSegments};
pub use preferences::{Preferences, PreferencesStore};
pub use reconcile::{DisplayEntry, DisplayOrder, MoveDirection};
pub use scheduler::{CaptureGallery, CaptureScheduler, SchedulerConfig, VisibilityMode};
pub use tools::{NewConsoleRequest, ToolAdapter, ToolError, WindowBackend};
pub use windows::{ActionStatus, CaptureMethod, CaptureResult, DirectoryListing, WindowDescriptor};

pub use logging::{Verbosity, init_logging};
