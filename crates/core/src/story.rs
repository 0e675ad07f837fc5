//! Normalized story record produced for every matched feed item.
//!
//! A [`Story`] has the same fixed fields whatever dialect it came from. Any
//! field a dialect maps that is not part of that schema lands in
//! [`Story::extra`], coerced opportunistically.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::Serialize;

use crate::coerce::{FieldValue, RawValue, coerce_date, coerce_extra, coerce_list, coerce_text};
use crate::error::CoercionError;

/// The fixed story schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Url,
    Title,
    Content,
    Author,
    Tags,
    Published,
    Updated,
}

impl Field {
    /// Every fixed field, in schema order.
    pub const ALL: [Field; 8] = [
        Field::Id,
        Field::Url,
        Field::Title,
        Field::Content,
        Field::Author,
        Field::Tags,
        Field::Published,
        Field::Updated,
    ];

    /// Name used in field maps and in [`Story::to_map`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Url => "url",
            Field::Title => "title",
            Field::Content => "content",
            Field::Author => "author",
            Field::Tags => "tags",
            Field::Published => "published",
            Field::Updated => "updated",
        }
    }

    /// Look up a fixed field by name. Unknown names are extra properties.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.as_str() == name)
    }

    /// Whether values of this field are dates.
    pub fn is_date(self) -> bool {
        matches!(self, Field::Published | Field::Updated)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::from_name(s).ok_or_else(|| format!("Unknown story field: {}", s))
    }
}

/// One story extracted from a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Story {
    pub id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub tags: Vec<String>,
    pub published: Option<DateTime<FixedOffset>>,
    pub updated: Option<DateTime<FixedOffset>>,

    /// Name of the dialect that produced this story.
    pub spec: String,

    /// Properties mapped by the dialect outside the fixed schema, in field-map order.
    pub extra: IndexMap<String, FieldValue>,
}

impl Story {
    /// Creates an empty story tagged with its dialect name.
    pub fn new(spec: impl Into<String>) -> Self {
        Self { spec: spec.into(), ..Default::default() }
    }

    /// Coerces a raw selector result and stores it under `name`.
    ///
    /// Fixed fields get their schema type; any other name is stored in `extra`.
    /// `detect_dates` enables date detection for extra values.
    pub fn assign(&mut self, name: &str, raw: RawValue, detect_dates: bool) -> Result<(), CoercionError> {
        match Field::from_name(name) {
            Some(Field::Id) => self.id = coerce_text(raw),
            Some(Field::Url) => self.url = coerce_text(raw),
            Some(Field::Title) => self.title = coerce_text(raw),
            Some(Field::Content) => self.content = coerce_text(raw),
            Some(Field::Author) => self.author = coerce_text(raw),
            Some(Field::Tags) => self.tags = coerce_list(raw),
            Some(Field::Published) => self.published = coerce_date(name, raw)?,
            Some(Field::Updated) => self.updated = coerce_date(name, raw)?,
            None => {
                self.extra.insert(name.to_string(), coerce_extra(raw, detect_dates));
            }
        }
        Ok(())
    }

    /// Value of a fixed field.
    pub fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::Id => FieldValue::Text(self.id.clone()),
            Field::Url => FieldValue::Text(self.url.clone()),
            Field::Title => FieldValue::Text(self.title.clone()),
            Field::Content => FieldValue::Text(self.content.clone()),
            Field::Author => FieldValue::Text(self.author.clone()),
            Field::Tags => FieldValue::List(self.tags.clone()),
            Field::Published => self.published.into(),
            Field::Updated => self.updated.into(),
        }
    }

    /// Ordered field map: the fixed fields in schema order, then the extras.
    pub fn to_map(&self) -> IndexMap<String, FieldValue> {
        let mut map = IndexMap::with_capacity(Field::ALL.len() + self.extra.len());
        for field in Field::ALL {
            map.insert(field.as_str().to_string(), self.get(field));
        }
        for (name, value) in &self.extra {
            map.insert(name.clone(), value.clone());
        }
        map
    }

    /// Gets the story as structured JSON, including `spec`.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.as_str()), Some(field));
            assert_eq!(field.as_str().parse::<Field>(), Ok(field));
        }
        assert_eq!(Field::from_name("duration"), None);
        assert!("Title".parse::<Field>().is_err());
    }

    #[test]
    fn test_new_story_is_empty() {
        let story = Story::new("RSS");
        assert_eq!(story.spec, "RSS");
        assert!(story.id.is_empty());
        assert!(story.tags.is_empty());
        assert!(story.published.is_none());
        assert!(story.extra.is_empty());
    }

    #[test]
    fn test_assign_fixed_fields() {
        let mut story = Story::new("RSS");
        story.assign("title", RawValue::Scalar("Hello".into()), true).unwrap();
        story.assign("tags", RawValue::Nodes(vec!["a".into(), "b".into()]), true).unwrap();
        story
            .assign("published", RawValue::Scalar("Tue, 10 Jun 2003 04:00:00 GMT".into()), true)
            .unwrap();

        assert_eq!(story.title, "Hello");
        assert_eq!(story.tags, vec!["a", "b"]);
        assert!(story.published.is_some());
        assert!(story.extra.is_empty());
    }

    #[test]
    fn test_assign_bad_date_fails() {
        let mut story = Story::new("RSS");
        let err = story.assign("updated", RawValue::Scalar("soon".into()), true).unwrap_err();
        assert_eq!(err.field, "updated");
    }

    #[test]
    fn test_assign_extra() {
        let mut story = Story::new("Custom");
        story.assign("duration", RawValue::Scalar("12:30".into()), true).unwrap();
        story.assign("enclosures", RawValue::Nodes(vec!["x.mp3".into()]), true).unwrap();

        assert_eq!(story.extra.get("duration"), Some(&FieldValue::Text("12:30".into())));
        assert_eq!(story.extra.get("enclosures"), Some(&FieldValue::List(vec!["x.mp3".into()])));
    }

    #[test]
    fn test_to_map_keys() {
        let mut story = Story::new("Custom");
        story.assign("rating", RawValue::Scalar("5".into()), true).unwrap();
        story.assign("lang", RawValue::Scalar("en".into()), true).unwrap();

        let keys: Vec<String> = story.to_map().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["id", "url", "title", "content", "author", "tags", "published", "updated", "rating", "lang"]
        );
    }

    #[test]
    fn test_to_map_values() {
        let story = Story::new("Atom");
        let map = story.to_map();
        assert_eq!(map["tags"], FieldValue::List(Vec::new()));
        assert_eq!(map["published"], FieldValue::Null);
        assert_eq!(map["title"], FieldValue::Text(String::new()));
        assert!(!map.contains_key("spec"));
    }

    #[test]
    fn test_story_serialization() {
        let mut story = Story::new("RSS");
        story.title = "Test".to_string();
        story.url = "https://example.com".to_string();

        let json = serde_json::to_string(&story).unwrap();
        assert!(json.contains(r#""title":"Test""#));
        assert!(json.contains(r#""spec":"RSS""#));
        assert!(json.contains(r#""published":null"#));
    }

    #[test]
    fn test_to_json() {
        let story = Story::new("Atom");
        let json = story.to_json().unwrap();
        assert!(json.is_object());
        assert!(json.get("tags").unwrap().is_array());
        assert!(json.get("extra").is_some());
    }
}
