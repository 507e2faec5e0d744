use serde::{Deserialize, Serialize};

use crate::notion::types::Annotations;

/// A run of text with an optional link and its style flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

/// A normalized body block, tagged by `type` in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "paragraph")]
    Paragraph {
        #[serde(default)]
        rich_text: Vec<Segment>,
    },
    #[serde(rename = "heading_1")]
    Heading1 {
        #[serde(default)]
        rich_text: Vec<Segment>,
    },
    #[serde(rename = "heading_2")]
    Heading2 {
        #[serde(default)]
        rich_text: Vec<Segment>,
    },
    #[serde(rename = "heading_3")]
    Heading3 {
        #[serde(default)]
        rich_text: Vec<Segment>,
    },
    #[serde(rename = "bulleted_list_item")]
    BulletedListItem {
        #[serde(default)]
        rich_text: Vec<Segment>,
    },
    #[serde(rename = "numbered_list_item")]
    NumberedListItem {
        #[serde(default)]
        rich_text: Vec<Segment>,
    },
    #[serde(rename = "quote")]
    Quote {
        #[serde(default)]
        rich_text: Vec<Segment>,
    },
    #[serde(rename = "code")]
    Code {
        language: Option<String>,
        #[serde(default)]
        rich_text: Vec<Segment>,
    },
    #[serde(rename = "image")]
    Image {
        url: String,
        #[serde(default)]
        caption: Vec<Segment>,
    },
}

impl Block {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Block::Paragraph { .. } => "paragraph",
            Block::Heading1 { .. } => "heading_1",
            Block::Heading2 { .. } => "heading_2",
            Block::Heading3 { .. } => "heading_3",
            Block::BulletedListItem { .. } => "bulleted_list_item",
            Block::NumberedListItem { .. } => "numbered_list_item",
            Block::Quote { .. } => "quote",
            Block::Code { .. } => "code",
            Block::Image { .. } => "image",
        }
    }

    /// Body text segments; `None` for images.
    pub fn rich_text(&self) -> Option<&[Segment]> {
        match self {
            Block::Paragraph { rich_text }
            | Block::Heading1 { rich_text }
            | Block::Heading2 { rich_text }
            | Block::Heading3 { rich_text }
            | Block::BulletedListItem { rich_text }
            | Block::NumberedListItem { rich_text }
            | Block::Quote { rich_text }
            | Block::Code { rich_text, .. } => Some(rich_text),
            Block::Image { .. } => None,
        }
    }
}

fn inline(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| match &s.href {
            Some(href) => format!("[{}]({})", s.text, href),
            None => s.text.clone(),
        })
        .collect()
}

/// Plain-text preview of a post body for the terminal.
pub fn render_preview(blocks: &[Block]) -> String {
    let mut lines = Vec::with_capacity(blocks.len());
    let mut number = 0;

    for block in blocks {
        if !matches!(block, Block::NumberedListItem { .. }) {
            number = 0;
        }
        let line = match block {
            Block::Paragraph { rich_text } => inline(rich_text),
            Block::Heading1 { rich_text } => format!("# {}", inline(rich_text)),
            Block::Heading2 { rich_text } => format!("## {}", inline(rich_text)),
            Block::Heading3 { rich_text } => format!("### {}", inline(rich_text)),
            Block::BulletedListItem { rich_text } => format!("- {}", inline(rich_text)),
            Block::NumberedListItem { rich_text } => {
                number += 1;
                format!("{}. {}", number, inline(rich_text))
            }
            Block::Quote { rich_text } => format!("> {}", inline(rich_text)),
            Block::Code { language, rich_text } => format!(
                "```{}\n{}\n```",
                language.as_deref().unwrap_or(""),
                rich_text.iter().map(|s| s.text.as_str()).collect::<String>()
            ),
            Block::Image { url, caption } => format!("![{}]({})", inline(caption), url),
        };
        lines.push(line);
    }

    lines.join("\n\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn seg(text: &str) -> Segment {
        Segment {
            text: text.to_string(),
            href: None,
            annotations: Annotations::default(),
        }
    }

    #[test]
    fn serialized_shape() {
        let code = Block::Code {
            language: Some("rust".into()),
            rich_text: vec![seg("fn main() {}")],
        };
        let value = serde_json::to_value(&code).unwrap();
        assert_eq!(value["type"], "code");
        assert_eq!(value["language"], "rust");
        assert_eq!(value["rich_text"][0]["text"], "fn main() {}");
        assert_eq!(value["rich_text"][0]["href"], serde_json::Value::Null);
        assert_eq!(value["rich_text"][0]["annotations"]["color"], "default");

        let heading = serde_json::to_value(Block::Heading2 { rich_text: vec![] }).unwrap();
        assert_eq!(heading, json!({ "type": "heading_2", "rich_text": [] }));

        let image = serde_json::to_value(Block::Image { url: "/images/blog/a.png".into(), caption: vec![] }).unwrap();
        assert_eq!(image, json!({ "type": "image", "url": "/images/blog/a.png", "caption": [] }));
    }

    #[test]
    fn type_tags_match_serde() {
        let blocks = vec![
            Block::Paragraph { rich_text: vec![] },
            Block::Heading1 { rich_text: vec![] },
            Block::Heading2 { rich_text: vec![] },
            Block::Heading3 { rich_text: vec![] },
            Block::BulletedListItem { rich_text: vec![] },
            Block::NumberedListItem { rich_text: vec![] },
            Block::Quote { rich_text: vec![] },
            Block::Code { language: None, rich_text: vec![] },
            Block::Image { url: String::new(), caption: vec![] },
        ];
        for block in &blocks {
            assert_eq!(serde_json::to_value(block).unwrap()["type"], block.type_tag());
        }
    }

    #[test]
    fn missing_rich_text_reads_as_empty() {
        let block: Block = serde_json::from_value(json!({ "type": "quote" })).unwrap();
        assert_eq!(block.rich_text(), Some(&[][..]));
    }

    #[test]
    fn preview() {
        let mut link = seg("docs");
        link.href = Some("https://x.test".into());
        let blocks = vec![
            Block::Heading1 { rich_text: vec![seg("Intro")] },
            Block::Paragraph { rich_text: vec![seg("See "), link] },
            Block::NumberedListItem { rich_text: vec![seg("one")] },
            Block::NumberedListItem { rich_text: vec![seg("two")] },
            Block::Quote { rich_text: vec![seg("wise")] },
            Block::NumberedListItem { rich_text: vec![seg("again")] },
            Block::Image { url: "/a.png".into(), caption: vec![seg("cap")] },
        ];
        let text = render_preview(&blocks);
        assert_eq!(
            text,
            "# Intro\n\nSee [docs](https://x.test)\n\n1. one\n\n2. two\n\n> wise\n\n1. again\n\n![cap](/a.png)"
        );
    }
}
