use anyhow::{Context, Result};
use serde::Serialize;

/// System warning icon
pub const ICON_WARNING: &str =
    "/System/Library/CoreServices/CoreTypes.bundle/Contents/Resources/AlertCautionIcon.icns";

/// Icon shown on the "update available" item, relative to the workflow directory
pub const ICON_UPDATE: &str = "update-available.png";

/// Item icon
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icon {
    pub path: String,
}

/// One row of Alfred's Script Filter results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Whether ↩ actions the item
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

impl Item {
    /// A non-actionable item with just a title and subtitle
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            arg: None,
            uid: None,
            valid: false,
            autocomplete: None,
            icon: None,
        }
    }

    /// Make the item actionable: ↩ passes `arg` on, and Alfred learns its
    /// ranking under `uid`
    pub fn action(mut self, arg: &str, uid: &str) -> Self {
        self.arg = Some(arg.to_string());
        self.uid = Some(uid.to_string());
        self.valid = true;
        self
    }

    pub fn autocomplete(mut self, text: &str) -> Self {
        self.autocomplete = Some(text.to_string());
        self
    }

    pub fn icon(mut self, path: &str) -> Self {
        self.icon = Some(Icon {
            path: path.to_string(),
        });
        self
    }
}

/// Script Filter response (`{"items": [...]}`)
#[derive(Debug, Clone, Default, Serialize)]
pub struct Feedback {
    pub items: Vec<Item>,
}

impl Feedback {
    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialize feedback")
    }
}
