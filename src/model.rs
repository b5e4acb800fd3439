use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotepadStatus {
    Published,
    Unpublished,
    Other(String),
}

impl Default for NotepadStatus {
    fn default() -> Self {
        NotepadStatus::Unpublished
    }
}

impl From<String> for NotepadStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PUBLISHED" => NotepadStatus::Published,
            "" | "UNPUBLISHED" => NotepadStatus::Unpublished,
            _ => NotepadStatus::Other(value),
        }
    }
}

impl From<NotepadStatus> for String {
    fn from(status: NotepadStatus) -> Self {
        match status {
            NotepadStatus::Published => "PUBLISHED".to_string(),
            NotepadStatus::Unpublished => "UNPUBLISHED".to_string(),
            NotepadStatus::Other(s) => s,
        }
    }
}

/// One entry of the notepad listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotepadSummary {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notepad {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub brief: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<NotepadStatus>,
    #[serde(default)]
    pub list: Option<Value>,
    #[serde(default)]
    pub content: Option<String>,
}

impl Notepad {
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Builds the full-record payload the update endpoint expects, carrying
    /// every field through unchanged except `content`.
    pub fn to_update(&self) -> NotepadUpdate {
        NotepadUpdate {
            status: self.status.clone().unwrap_or_default(),
            content: self.content().to_string(),
            title: self.title.clone(),
            brief: self.brief.clone(),
            tags: self.tags.clone(),
            list: self.list.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotepadUpdate {
    pub status: NotepadStatus,
    pub content: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ListEnvelope {
    pub data: ListData,
}

#[derive(Debug, Deserialize)]
pub struct ListData {
    pub notepads: Vec<NotepadSummary>,
}

#[derive(Debug, Deserialize)]
pub struct DetailEnvelope {
    #[serde(default)]
    pub data: Option<DetailData>,
}

#[derive(Debug, Deserialize)]
pub struct DetailData {
    #[serde(default)]
    pub notepad: Option<Notepad>,
}

#[derive(Debug, Serialize)]
pub struct UpdateEnvelope<'a> {
    pub notepad: &'a NotepadUpdate,
}

/// A notepad's content viewed as an ordered list of words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    pub fn parse(content: &str, delimiter: &str) -> Self {
        let words = content
            .split(delimiter)
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        WordList { words }
    }

    pub fn contains_ignore_case(&self, word: &str) -> bool {
        let needle = word.to_lowercase();
        self.words.iter().any(|w| w.to_lowercase() == needle)
    }

    pub fn push(&mut self, word: &str) {
        self.words.push(word.to_string());
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn join(&self, delimiter: &str) -> String {
        self.words.join(delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_list_trims_and_drops_blanks() {
        let list = WordList::parse(" apple \n\n banana\n  \ncherry\n", "\n");
        assert_eq!(list.len(), 3);
        assert_eq!(list.join("\n"), "apple\nbanana\ncherry");
    }

    #[test]
    fn test_word_list_slash_delimiter() {
        let list = WordList::parse("a/ b //c", "/");
        assert_eq!(list.join("/"), "a/b/c");
    }

    #[test]
    fn test_contains_ignore_case() {
        let list = WordList::parse("Apple\nbanana", "\n");
        assert!(list.contains_ignore_case("apple"));
        assert!(list.contains_ignore_case("BANANA"));
        assert!(!list.contains_ignore_case("cherry"));
    }

    #[test]
    fn test_empty_content() {
        let mut list = WordList::parse("", "\n");
        assert!(list.is_empty());
        list.push("Zebra");
        assert_eq!(list.join("\n"), "Zebra");
    }

    #[test]
    fn test_status_round_trip_preserves_unknown() {
        let status: NotepadStatus = serde_json::from_str("\"DELETED\"").unwrap();
        assert_eq!(status, NotepadStatus::Other("DELETED".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"DELETED\"");
        let published: NotepadStatus = serde_json::from_str("\"PUBLISHED\"").unwrap();
        assert_eq!(published, NotepadStatus::Published);
    }

    #[test]
    fn test_to_update_defaults_missing_status() {
        let notepad: Notepad = serde_json::from_value(serde_json::json!({
            "id": "np-1",
            "title": "GRE",
            "brief": "words",
            "tags": ["exam"],
            "list": [{"title": "ch1"}],
            "content": "apple"
        }))
        .unwrap();
        let update = notepad.to_update();
        assert_eq!(update.status, NotepadStatus::Unpublished);
        assert_eq!(update.content, "apple");
        assert_eq!(update.tags, Some(vec!["exam".to_string()]));
        assert_eq!(update.brief.as_deref(), Some("words"));
        assert_eq!(update.list, Some(serde_json::json!([{"title": "ch1"}])));
    }

    #[test]
    fn test_sparse_record_update_omits_absent_fields() {
        let notepad: Notepad = serde_json::from_str(
            r#"{"id": "np-1", "title": "GRE", "brief": null, "content": "apple"}"#,
        )
        .unwrap();
        let update = notepad.to_update();
        let body = serde_json::to_value(UpdateEnvelope { notepad: &update }).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "notepad": {"status": "UNPUBLISHED", "content": "apple", "title": "GRE"}
            })
        );
        assert!(!serde_json::to_string(&body).unwrap().contains("null"));
    }

    #[test]
    fn test_detail_envelope_missing_notepad() {
        let envelope: DetailEnvelope = serde_json::from_str(r#"{"data": {}}"#).unwrap();
        assert!(envelope.data.and_then(|d| d.notepad).is_none());
    }
}
