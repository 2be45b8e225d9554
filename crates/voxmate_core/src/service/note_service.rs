//! Note use-case service.
//!
//! # Invariants
//! - Notes are write-once; the only mutation is removal.
//! - `find_notes` matches title or text case-insensitively.

use super::{required_text, TaskError};
use crate::model::note::Note;
use crate::model::RecordId;
use crate::repo::json_repo::CollectionRepository;
use chrono::NaiveDateTime;
use log::info;

pub struct NoteService<R: CollectionRepository<Note>> {
    repo: R,
}

impl<R: CollectionRepository<Note>> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds one note. An empty title falls back to the first words of the text.
    pub fn add_note(&self, title: &str, text: &str, now: NaiveDateTime) -> Result<Note, TaskError> {
        let text = required_text(text, "note text")?;
        let title = match title.trim() {
            "" => default_title(&text),
            value => value.to_string(),
        };
        let note = self.repo.add(Note::new(title, text, now))?;
        info!("event=note_add module=service status=ok id={}", note.id);
        Ok(note)
    }

    pub fn list_notes(&self) -> Result<Vec<Note>, TaskError> {
        Ok(self.repo.list()?)
    }

    pub fn find_notes(&self, query: &str) -> Result<Vec<Note>, TaskError> {
        let query = required_text(query, "search query")?.to_lowercase();
        Ok(self
            .repo
            .list()?
            .into_iter()
            .filter(|note| note.matches(&query))
            .collect())
    }

    pub fn remove_note(&self, id: RecordId) -> Result<bool, TaskError> {
        Ok(self.repo.remove(id)?)
    }

    /// Lists notes, substituting an empty collection on storage failure.
    pub fn list_notes_or_empty(&self) -> Vec<Note> {
        self.repo.list_or_empty()
    }
}

fn default_title(text: &str) -> String {
    text.split_whitespace().take(5).collect::<Vec<_>>().join(" ")
}

/// Formats one note as `"{id}. {title}: {text}"`.
pub fn format_note_line(note: &Note) -> String {
    format!("{}. {}: {}", note.id, note.title, note.text)
}

#[cfg(test)]
mod tests {
    use super::default_title;

    #[test]
    fn default_title_uses_first_five_words() {
        assert_eq!(
            default_title("remember to bring the charger to the office"),
            "remember to bring the charger"
        );
        assert_eq!(default_title("short"), "short");
    }
}
