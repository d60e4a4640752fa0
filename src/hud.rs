//! Overlay state. With no DOM to draw into, the HUD is mirrored into the
//! window title and the log.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub instruction: String,
}

#[derive(Debug, Default)]
pub struct Hud {
    counter_label: Option<&'static str>,
    count: u32,
    prompt: Option<Prompt>,
    entry: Option<String>,
    message: Option<String>,
    dirty: bool,
}

impl Hud {
    pub fn new() -> Self {
        Self { dirty: true, ..Default::default() }
    }

    pub fn with_counter(label: &'static str) -> Self {
        Self { counter_label: Some(label), ..Self::new() }
    }

    pub fn set_count(&mut self, count: u32) {
        self.count = count;
        self.dirty = true;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn show_prompt(&mut self, title: &str, instruction: &str) {
        let prompt = Prompt { title: title.to_string(), instruction: instruction.to_string() };
        if self.prompt.as_ref() != Some(&prompt) {
            self.prompt = Some(prompt);
            self.dirty = true;
        }
    }

    pub fn hide_prompt(&mut self) {
        if self.prompt.take().is_some() {
            self.dirty = true;
        }
    }

    #[cfg(test)]
    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn open_entry(&mut self) {
        self.entry = Some(String::new());
        self.dirty = true;
    }

    pub fn is_entry_open(&self) -> bool {
        self.entry.is_some()
    }

    pub fn type_text(&mut self, text: &str) {
        if let Some(entry) = self.entry.as_mut() {
            entry.extend(text.chars().filter(|c| !c.is_control()));
            self.dirty = true;
        }
    }

    pub fn erase(&mut self) {
        if let Some(entry) = self.entry.as_mut() {
            entry.pop();
            self.dirty = true;
        }
    }

    /// Closes the entry box and returns what was typed.
    pub fn take_entry(&mut self) -> Option<String> {
        let entry = self.entry.take();
        if entry.is_some() {
            self.dirty = true;
        }
        entry
    }

    pub fn show_message(&mut self, text: &str) {
        self.message = Some(text.to_string());
        self.dirty = true;
    }

    pub fn clear_message(&mut self) {
        if self.message.take().is_some() {
            self.dirty = true;
        }
    }

    #[cfg(test)]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns true once after each change.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn title(&self) -> String {
        let mut parts = Vec::new();
        if let Some(label) = self.counter_label {
            parts.push(format!("{}: {}", label, self.count));
        }
        if let Some(prompt) = &self.prompt {
            parts.push(format!("{} {}", prompt.title, prompt.instruction));
        }
        if let Some(entry) = &self.entry {
            parts.push(format!("> {}_", entry));
        }
        if let Some(message) = &self.message {
            parts.push(format!("\"{}\"", message));
        }
        if parts.is_empty() {
            "Ricegrass Walk".to_string()
        } else {
            parts.join("  |  ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_reflects_state() {
        let mut hud = Hud::with_counter("Ricegrass");
        assert_eq!(hud.title(), "Ricegrass: 0");
        hud.set_count(3);
        hud.show_prompt("Harvest?", "(press 'spacebar')");
        assert_eq!(hud.title(), "Ricegrass: 3  |  Harvest? (press 'spacebar')");
        hud.hide_prompt();
        assert_eq!(hud.title(), "Ricegrass: 3");
    }

    #[test]
    fn text_entry_edits() {
        let mut hud = Hud::new();
        hud.type_text("ignored");
        assert!(!hud.is_entry_open());
        hud.open_entry();
        hud.type_text("hi\r");
        hud.type_text("!!");
        hud.erase();
        assert_eq!(hud.take_entry().as_deref(), Some("hi!"));
        assert!(hud.take_entry().is_none());
    }

    #[test]
    fn dirty_flag_tracks_changes() {
        let mut hud = Hud::new();
        assert!(hud.take_dirty());
        assert!(!hud.take_dirty());
        hud.show_prompt("a", "b");
        assert!(hud.take_dirty());
        hud.show_prompt("a", "b");
        assert!(!hud.take_dirty());
        hud.hide_prompt();
        assert!(hud.take_dirty());
    }
}
