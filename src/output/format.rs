use crate::output::traits::ExportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported export targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Webflow,
    Csv,
    Woocommerce,
    Drupal,
    Wix,
    Shopify,
    Wordpress,
    Squarespace,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 9] = [
        ExportFormat::Json,
        ExportFormat::Webflow,
        ExportFormat::Csv,
        ExportFormat::Woocommerce,
        ExportFormat::Drupal,
        ExportFormat::Wix,
        ExportFormat::Shopify,
        ExportFormat::Wordpress,
        ExportFormat::Squarespace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Webflow => "webflow",
            ExportFormat::Csv => "csv",
            ExportFormat::Woocommerce => "woocommerce",
            ExportFormat::Drupal => "drupal",
            ExportFormat::Wix => "wix",
            ExportFormat::Shopify => "shopify",
            ExportFormat::Wordpress => "wordpress",
            ExportFormat::Squarespace => "squarespace",
        }
    }

    /// File extension of a single serialized part
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json | ExportFormat::Webflow => "json",
            ExportFormat::Csv
            | ExportFormat::Woocommerce
            | ExportFormat::Drupal
            | ExportFormat::Wix
            | ExportFormat::Shopify => "csv",
            ExportFormat::Wordpress | ExportFormat::Squarespace => "xml",
        }
    }

    /// MIME type of a single serialized part
    pub fn content_type(&self) -> &'static str {
        match self.extension() {
            "json" => "application/json",
            "csv" => "text/csv",
            _ => "application/xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| ExportError::UnknownFormat(s.to_string()))
    }
}
