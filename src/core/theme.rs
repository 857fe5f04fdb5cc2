use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use log::warn;

use crate::storage::local_store::{KeyValueStore, keys};

pub const DARK_THEME_CLASS: &str = "dark-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark(dark: bool) -> Self {
        if dark { Theme::Dark } else { Theme::Light }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn toggled(self) -> Self {
        Theme::from_dark(!self.is_dark())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 界面根元素与 body 上与主题相关的属性
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PresentationAttributes {
    root_classes: BTreeSet<String>,
    body_classes: BTreeSet<String>,
    data_theme: Option<String>,
}

impl PresentationAttributes {
    pub fn apply(&mut self, theme: Theme) {
        if theme.is_dark() {
            self.root_classes.insert(DARK_THEME_CLASS.to_string());
            self.body_classes.insert(DARK_THEME_CLASS.to_string());
            self.data_theme = Some("dark".to_string());
        } else {
            self.root_classes.remove(DARK_THEME_CLASS);
            self.body_classes.remove(DARK_THEME_CLASS);
            self.data_theme = None;
        }
    }

    pub fn root_has_class(&self, class: &str) -> bool {
        self.root_classes.contains(class)
    }

    pub fn body_has_class(&self, class: &str) -> bool {
        self.body_classes.contains(class)
    }

    pub fn data_theme(&self) -> Option<&str> {
        self.data_theme.as_deref()
    }
}

pub struct ThemeController {
    store: Arc<dyn KeyValueStore>,
    theme: Theme,
    attributes: PresentationAttributes,
}

impl ThemeController {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        ThemeController {
            store,
            theme: Theme::Light,
            attributes: PresentationAttributes::default(),
        }
    }

    /// 读取保存的主题并应用，没有保存过时为浅色
    pub fn init(&mut self) {
        let saved = match self.store.get_item(keys::THEME) {
            Ok(saved) => saved,
            Err(err) => {
                warn!("Failed to load theme: {}", err);
                None
            }
        };
        self.theme = Theme::from_dark(saved.as_deref() == Some("dark"));
        self.attributes.apply(self.theme);
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn attributes(&self) -> &PresentationAttributes {
        &self.attributes
    }

    pub fn toggle(&mut self) -> Theme {
        self.set(!self.theme.is_dark());
        self.theme
    }

    pub fn set(&mut self, dark: bool) {
        self.theme = Theme::from_dark(dark);
        self.attributes.apply(self.theme);
        if let Err(err) = self.store.set_item(keys::THEME, self.theme.as_str()) {
            warn!("Failed to save theme: {}", err);
        }
    }
}
