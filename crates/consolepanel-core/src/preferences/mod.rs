//! Local preferences store.
//!
//! Stars, nicknames and recents for the operator. The reconciler only reads
//! these to annotate display entries.

pub mod errors;
pub mod persistence;
pub mod store;
pub mod types;

pub use errors::PreferencesError;
pub use persistence::{
    load_preferences, load_preferences_from, preferences_file_path, save_preferences,
    save_preferences_to,
};
pub use store::PreferencesStore;
pub use types::{NicknameEntry, PreferenceLimits, Preferences};
