use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::NotionError;

/// The `{results, has_more, next_cursor}` envelope shared by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseInfo {
    #[serde(default)]
    pub data_sources: Vec<DataSourceRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceRef {
    pub id: String,
}

/// Sort + cursor body for `POST /v1/data_sources/{id}/query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryBody {
    pub sorts: Vec<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SortSpec {
    pub property: String,
    pub direction: &'static str,
}

/// One row of the posts database.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionPage {
    pub id: String,
    #[serde(default)]
    pub cover: Option<FileObject>,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

impl NotionPage {
    /// First property present under any of `names`.
    pub fn property(&self, names: &[&str]) -> Option<&PropertyValue> {
        names.iter().find_map(|name| self.properties.get(*name))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    Date {
        #[serde(default)]
        date: Option<DateValue>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    Files {
        #[serde(default)]
        files: Vec<FileObject>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateValue {
    #[serde(default)]
    pub start: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: Option<Annotations>,
}

/// Style flags on a rich text run. Passed through to the manifest as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            code: false,
            color: default_color(),
        }
    }
}

fn default_color() -> String {
    "default".to_string()
}

/// A hosted (`file`) or linked (`external`) file reference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileObject {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub external: Option<FileUrl>,
    #[serde(default)]
    pub file: Option<FileUrl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileUrl {
    pub url: String,
}

impl FileObject {
    pub fn url(&self) -> Option<&str> {
        let source = match self.kind.as_str() {
            "external" => self.external.as_ref(),
            "file" => self.file.as_ref(),
            _ => None,
        };
        source.map(|f| f.url.as_str())
    }
}

/// A block as returned by `/v1/blocks/{id}/children`: the payload lives under a key
/// named after its type.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodePayload {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImagePayload {
    #[serde(default)]
    pub caption: Vec<RichText>,
    #[serde(flatten)]
    pub source: FileObject,
}

/// Every block type the site knows how to render, plus a catch-all.
#[derive(Debug, Clone)]
pub enum SourceBlock {
    Paragraph(TextPayload),
    Heading1(TextPayload),
    Heading2(TextPayload),
    Heading3(TextPayload),
    BulletedListItem(TextPayload),
    NumberedListItem(TextPayload),
    Quote(TextPayload),
    Code(CodePayload),
    Image(ImagePayload),
    Unsupported(String),
}

impl TryFrom<RawBlock> for SourceBlock {
    type Error = NotionError;

    fn try_from(mut raw: RawBlock) -> Result<Self, Self::Error> {
        let kind = std::mem::take(&mut raw.kind);
        let block = match kind.as_str() {
            "paragraph" => SourceBlock::Paragraph(raw.payload(&kind)?),
            "heading_1" => SourceBlock::Heading1(raw.payload(&kind)?),
            "heading_2" => SourceBlock::Heading2(raw.payload(&kind)?),
            "heading_3" => SourceBlock::Heading3(raw.payload(&kind)?),
            "bulleted_list_item" => SourceBlock::BulletedListItem(raw.payload(&kind)?),
            "numbered_list_item" => SourceBlock::NumberedListItem(raw.payload(&kind)?),
            "quote" => SourceBlock::Quote(raw.payload(&kind)?),
            "code" => SourceBlock::Code(raw.payload(&kind)?),
            "image" => SourceBlock::Image(raw.payload(&kind)?),
            _ => SourceBlock::Unsupported(kind.clone()),
        };
        Ok(block)
    }
}

impl RawBlock {
    /// Decode the payload stored under `kind`. Absent payloads decode as empty.
    fn payload<T: DeserializeOwned>(&mut self, kind: &str) -> Result<T, NotionError> {
        let value = self
            .fields
            .remove(kind)
            .filter(|v| !v.is_null())
            .unwrap_or_else(|| Value::Object(Map::new()));
        serde_json::from_value(value).map_err(|source| NotionError::Decode {
            what: format!("{} block {}", kind, self.id),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawBlock {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn page_properties() {
        let page: NotionPage = serde_json::from_value(json!({
            "object": "page",
            "id": "p1",
            "cover": { "type": "external", "external": { "url": "https://x.test/c.png" } },
            "properties": {
                "Title": { "id": "title", "type": "title", "title": [{ "plain_text": "Hi" }] },
                "Published": { "id": "a", "type": "checkbox", "checkbox": true },
                "PublishedAt": { "id": "b", "type": "date", "date": { "start": "2024-05-01", "end": null } },
                "Tags": { "id": "c", "type": "multi_select", "multi_select": [{ "name": "rust" }] },
                "Views": { "id": "d", "type": "number", "number": 3 }
            }
        }))
        .unwrap();

        assert!(matches!(page.property(&["title", "Title"]), Some(PropertyValue::Title { title }) if title[0].plain_text == "Hi"));
        assert!(matches!(page.property(&["Published"]), Some(PropertyValue::Checkbox { checkbox: true })));
        assert!(matches!(page.property(&["Views"]), Some(PropertyValue::Other)));
        assert!(page.property(&["Slug", "slug"]).is_none());
        assert_eq!(page.cover.as_ref().and_then(FileObject::url), Some("https://x.test/c.png"));
    }

    #[test]
    fn empty_date() {
        let prop: PropertyValue =
            serde_json::from_value(json!({ "type": "date", "date": null })).unwrap();
        assert!(matches!(prop, PropertyValue::Date { date: None }));
    }

    #[test]
    fn file_object_urls() {
        let hosted: FileObject = serde_json::from_value(json!({
            "name": "a.png", "type": "file", "file": { "url": "https://s3.test/a.png", "expiry_time": "x" }
        }))
        .unwrap();
        assert_eq!(hosted.url(), Some("https://s3.test/a.png"));

        let upload: FileObject =
            serde_json::from_value(json!({ "type": "file_upload", "file_upload": { "id": "u" } }))
                .unwrap();
        assert_eq!(upload.url(), None);
    }

    #[test]
    fn paragraph_block() {
        let block = SourceBlock::try_from(raw(json!({
            "object": "block", "id": "b1", "type": "paragraph", "has_children": false,
            "paragraph": { "rich_text": [{ "plain_text": "Hello", "href": null }], "color": "default" }
        })))
        .unwrap();
        assert!(matches!(block, SourceBlock::Paragraph(p) if p.rich_text[0].plain_text == "Hello"));
    }

    #[test]
    fn image_block() {
        let block = SourceBlock::try_from(raw(json!({
            "id": "b2", "type": "image",
            "image": {
                "caption": [{ "plain_text": "cap" }],
                "type": "file",
                "file": { "url": "https://s3.test/img.png", "expiry_time": "2024" }
            }
        })))
        .unwrap();
        let SourceBlock::Image(img) = block else { panic!("expected image block") };
        assert_eq!(img.source.url(), Some("https://s3.test/img.png"));
        assert_eq!(img.caption.len(), 1);
    }

    #[test]
    fn code_block_language() {
        let block = SourceBlock::try_from(raw(json!({
            "id": "b3", "type": "code",
            "code": { "language": "rust", "rich_text": [{ "plain_text": "fn main() {}" }], "caption": [] }
        })))
        .unwrap();
        assert!(matches!(block, SourceBlock::Code(c) if c.language.as_deref() == Some("rust")));
    }

    #[test]
    fn unsupported_and_missing_payload() {
        let block = SourceBlock::try_from(raw(json!({ "id": "b4", "type": "toggle", "toggle": {} }))).unwrap();
        assert!(matches!(block, SourceBlock::Unsupported(t) if t == "toggle"));

        let block = SourceBlock::try_from(raw(json!({ "id": "b5", "type": "quote" }))).unwrap();
        assert!(matches!(block, SourceBlock::Quote(q) if q.rich_text.is_empty()));

        let block = SourceBlock::try_from(raw(json!({ "id": "b6" }))).unwrap();
        assert!(matches!(block, SourceBlock::Unsupported(t) if t.is_empty()));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let err = SourceBlock::try_from(raw(json!({
            "id": "b7", "type": "paragraph", "paragraph": { "rich_text": "not a list" }
        })))
        .unwrap_err();
        assert!(matches!(err, NotionError::Decode { .. }));
    }
}
