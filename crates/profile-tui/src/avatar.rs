use crossterm::event::{KeyCode, KeyEvent};

pub const AVATAR_UPDATED_MESSAGE: &str = "Photo de profil mise à jour";

/// Avatar picker shown on the profile card.
///
/// Collects a new avatar URL and reports it to the caller; the caller decides
/// what to do with it.
#[derive(Debug, Default)]
pub struct AvatarUpload {
    draft: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarInput {
    /// Key consumed, nothing to report
    Consumed,
    /// Key not handled by the picker
    Ignored,
    /// A new avatar URL was submitted
    Changed(String),
}

impl AvatarUpload {
    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    /// Open the picker prefilled with the current avatar
    pub fn open(&mut self, current: Option<&str>) {
        self.draft = Some(current.unwrap_or_default().to_string());
    }

    pub fn cancel(&mut self) {
        self.draft = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AvatarInput {
        let Some(draft) = self.draft.as_mut() else {
            return AvatarInput::Ignored;
        };

        match key.code {
            KeyCode::Esc => {
                self.draft = None;
                AvatarInput::Consumed
            }
            KeyCode::Enter => {
                let url = draft.trim().to_string();
                if url.is_empty() {
                    return AvatarInput::Consumed;
                }
                self.draft = None;
                AvatarInput::Changed(url)
            }
            KeyCode::Backspace => {
                draft.pop();
                AvatarInput::Consumed
            }
            KeyCode::Char(c) => {
                draft.push(c);
                AvatarInput::Consumed
            }
            _ => AvatarInput::Consumed,
        }
    }
}
