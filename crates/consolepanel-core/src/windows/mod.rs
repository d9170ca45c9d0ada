//! Window data model shared by the adapter, server and client-side components.

pub mod types;

pub use types::{
    ActionStatus, CaptureMethod, CaptureRecord, CaptureResult, DirectoryListing, WindowDescriptor,
};
