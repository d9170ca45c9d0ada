use crate::errors::PanelError;

#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("Failed to save preferences: {message}")]
    SaveFailed { message: String },

    #[error("Nickname for '{handle}' cannot be blank")]
    BlankNickname { handle: String },
}

impl PanelError for PreferencesError {
    fn error_code(&self) -> &'static str {
        match self {
            PreferencesError::SaveFailed { .. } => "PREFERENCES_SAVE_FAILED",
            PreferencesError::BlankNickname { .. } => "PREFERENCES_BLANK_NICKNAME",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, PreferencesError::BlankNickname { .. })
    }
}
