/// Edit lifecycle of one bound text region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    Viewing,
    Editing,
    Saving,
}

/// Per-element edit state machine.
///
/// `Viewing → Editing → Saving → Viewing` on the success path; Escape and a
/// failed save both land back in `Viewing` with the pre-edit text. The
/// displayed text only ever changes on a committed save or an applied remote
/// update, so rollback is simply leaving `Editing`/`Saving`.
#[derive(Debug, Clone)]
pub struct ElementEditor {
    key: String,
    /// Committed text shown in `Viewing`; the pre-edit snapshot while an
    /// edit is in flight.
    current: String,
    /// In-progress edit text, meaningful in `Editing`/`Saving` only.
    buffer: String,
    phase: EditPhase,
}

impl ElementEditor {
    pub fn new(key: impl Into<String>, initial: impl Into<String>) -> Self {
        let initial = initial.into();
        Self {
            key: key.into(),
            buffer: initial.clone(),
            current: initial,
            phase: EditPhase::Viewing,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    /// What is on screen right now.
    pub fn text(&self) -> &str {
        match self.phase {
            EditPhase::Viewing => &self.current,
            EditPhase::Editing | EditPhase::Saving => &self.buffer,
        }
    }

    /// `Viewing --click--> Editing`. A click on an element already being
    /// edited does nothing.
    pub fn click(&mut self) -> bool {
        if self.phase != EditPhase::Viewing {
            return false;
        }
        self.buffer = self.current.clone();
        self.phase = EditPhase::Editing;
        true
    }

    /// Replace the edit buffer with what the visitor has typed.
    pub fn input(&mut self, text: &str) {
        if self.phase == EditPhase::Editing {
            self.buffer = text.to_string();
        }
    }

    /// `Editing --Enter/blur--> Saving`, maybe.
    ///
    /// Returns the value to send to the server. An empty or unchanged buffer
    /// produces no save: empty reverts to the pre-edit text, unchanged just
    /// leaves edit mode.
    pub fn submit(&mut self) -> Option<String> {
        if self.phase != EditPhase::Editing {
            return None;
        }

        let value = self.buffer.trim().to_string();
        if value.is_empty() || value == self.current {
            self.phase = EditPhase::Viewing;
            return None;
        }

        self.buffer = value.clone();
        self.phase = EditPhase::Saving;
        Some(value)
    }

    /// `Editing --Escape--> Viewing`, discarding the buffer.
    pub fn cancel(&mut self) {
        if self.phase == EditPhase::Editing {
            self.phase = EditPhase::Viewing;
        }
    }

    /// `Saving --success--> Viewing` with the new text retained.
    pub fn save_succeeded(&mut self) {
        if self.phase == EditPhase::Saving {
            self.current = self.buffer.clone();
            self.phase = EditPhase::Viewing;
        }
    }

    /// `Saving --failure--> Viewing` with the pre-edit text restored.
    pub fn save_failed(&mut self) {
        if self.phase == EditPhase::Saving {
            self.phase = EditPhase::Viewing;
        }
    }

    /// Apply a pushed update from another client.
    ///
    /// Dropped while this element is locally in `Editing`/`Saving`; the last
    /// local save still wins once committed. Returns whether the update was
    /// applied.
    pub fn apply_remote(&mut self, value: &str) -> bool {
        if self.phase != EditPhase::Viewing {
            return false;
        }
        self.current = value.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> ElementEditor {
        ElementEditor::new("main_header", "SAY GUGNAG")
    }

    #[test]
    fn click_snapshots_and_enters_edit_mode() {
        let mut el = editor();
        assert!(el.click());
        assert_eq!(el.phase(), EditPhase::Editing);
        assert_eq!(el.text(), "SAY GUGNAG");

        // Second click while editing is a no-op.
        el.input("HALF TYPED");
        assert!(!el.click());
        assert_eq!(el.text(), "HALF TYPED");
    }

    #[test]
    fn escape_reverts_to_pre_edit_text() {
        let mut el = editor();
        el.click();
        el.input("SOMETHING ELSE");
        el.cancel();

        assert_eq!(el.phase(), EditPhase::Viewing);
        assert_eq!(el.text(), "SAY GUGNAG");
    }

    #[test]
    fn submit_moves_to_saving_with_trimmed_value() {
        let mut el = editor();
        el.click();
        el.input("  NEW HEADER  ");

        assert_eq!(el.submit(), Some("NEW HEADER".to_string()));
        assert_eq!(el.phase(), EditPhase::Saving);
        assert_eq!(el.text(), "NEW HEADER");
    }

    #[test]
    fn empty_or_unchanged_buffer_saves_nothing() {
        let mut el = editor();
        el.click();
        el.input("   ");
        assert_eq!(el.submit(), None);
        assert_eq!(el.phase(), EditPhase::Viewing);
        assert_eq!(el.text(), "SAY GUGNAG");

        el.click();
        el.input("SAY GUGNAG");
        assert_eq!(el.submit(), None);
        assert_eq!(el.phase(), EditPhase::Viewing);
    }

    #[test]
    fn failed_save_rolls_back() {
        let mut el = editor();
        el.click();
        el.input("WILL FAIL");
        el.submit().unwrap();

        el.save_failed();
        assert_eq!(el.phase(), EditPhase::Viewing);
        assert_eq!(el.text(), "SAY GUGNAG");
    }

    #[test]
    fn successful_save_retains_new_text() {
        let mut el = editor();
        el.click();
        el.input("COMMITTED");
        el.submit().unwrap();

        el.save_succeeded();
        assert_eq!(el.phase(), EditPhase::Viewing);
        assert_eq!(el.text(), "COMMITTED");
    }

    #[test]
    fn remote_update_is_dropped_mid_edit_and_applied_otherwise() {
        let mut el = editor();
        assert!(el.apply_remote("FROM ANOTHER TAB"));
        assert_eq!(el.text(), "FROM ANOTHER TAB");

        el.click();
        el.input("LOCAL EDIT");
        assert!(!el.apply_remote("CLOBBER ATTEMPT"));
        assert_eq!(el.text(), "LOCAL EDIT");

        el.submit().unwrap();
        assert!(!el.apply_remote("STILL SAVING"));

        el.save_succeeded();
        assert!(el.apply_remote("NOW IT LANDS"));
        assert_eq!(el.text(), "NOW IT LANDS");
    }
}
