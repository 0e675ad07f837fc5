use crate::coerce::FieldValue;
use crate::story::Story;
use indexmap::IndexMap;

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Pretty print JSON output
    pub pretty: bool,
    /// One compact object per line (JSON Lines) instead of an array
    pub lines: bool,
}

/// Flat record for one story: the fixed fields, the extras, then `spec`
pub fn story_record(story: &Story) -> IndexMap<String, FieldValue> {
    let mut record = story.to_map();
    record.insert("spec".to_string(), FieldValue::Text(story.spec.clone()));
    record
}

/// Convert stories to JSON or JSON Lines
pub fn convert_to_json(stories: &[Story], config: &JsonConfig) -> serde_json::Result<String> {
    let records: Vec<IndexMap<String, FieldValue>> = stories.iter().map(story_record).collect();

    if config.lines {
        let lines = records
            .iter()
            .map(serde_json::to_string)
            .collect::<serde_json::Result<Vec<_>>>()?;
        return Ok(lines.join("\n"));
    }

    if config.pretty { serde_json::to_string_pretty(&records) } else { serde_json::to_string(&records) }
}

/// JSON formatter with configurable options
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, stories: &[Story]) -> serde_json::Result<String> {
        convert_to_json(stories, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::RawValue;

    fn stories() -> Vec<Story> {
        let mut first = Story::new("RSS");
        first.title = "First".to_string();
        first.tags = vec!["rust".to_string()];
        first
            .assign("published", RawValue::Scalar("2003-06-10T04:00:00Z".to_string()), true)
            .unwrap();
        first.assign("duration", RawValue::Scalar("12:30".to_string()), true).unwrap();

        let mut second = Story::new("RSS");
        second.title = "Second".to_string();

        vec![first, second]
    }

    #[test]
    fn test_story_record_key_order() {
        let record = story_record(&stories()[0]);
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["id", "url", "title", "content", "author", "tags", "published", "updated", "duration", "spec"]
        );
    }

    #[test]
    fn test_convert_to_json_array() {
        let json = convert_to_json(&stories(), &JsonConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["title"], "First");
        assert_eq!(array[0]["spec"], "RSS");
        assert_eq!(array[0]["tags"][0], "rust");
        assert_eq!(array[0]["duration"], "12:30");
        assert!(array[0]["published"].as_str().unwrap().starts_with("2003-06-10T04:00:00"));
        assert!(array[1]["published"].is_null());
    }

    #[test]
    fn test_convert_to_json_pretty() {
        let config = JsonConfig { pretty: true, ..Default::default() };
        let json = convert_to_json(&stories(), &config).unwrap();
        assert!(json.starts_with("[\n"));
        assert!(json.contains("\"title\": \"First\""));
    }

    #[test]
    fn test_convert_to_json_lines() {
        let config = JsonConfig { lines: true, ..Default::default() };
        let json = convert_to_json(&stories(), &config).unwrap();

        let lines: Vec<&str> = json.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.is_object());
        }
    }

    #[test]
    fn test_convert_empty() {
        assert_eq!(convert_to_json(&[], &JsonConfig::default()).unwrap(), "[]");
        let config = JsonConfig { lines: true, ..Default::default() };
        assert_eq!(convert_to_json(&[], &config).unwrap(), "");
    }

    #[test]
    fn test_json_formatter() {
        let config = JsonConfig::default();
        let formatter = JsonFormatter::new(config.clone());
        assert_eq!(
            formatter.convert(&stories()).unwrap(),
            convert_to_json(&stories(), &config).unwrap()
        );
    }
}
