//! Loosely-structured input records accepted by the ingestion layer
//!
//! Field names follow what upstream discovery and analysis stages emit.
//! Unknown fields are kept in `extra` and stored as open node attributes.

use crate::graph::{PropertyMap, PropertyValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A discovered SaaS product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Single category, as emitted by older discovery stages
    pub category: Option<String>,
    pub categories: Vec<String>,
    pub feature_list: Vec<String>,
    pub pricing_model: Option<String>,
    pub target_audience: Option<String>,
    /// Competitor product names (or `product:` IDs)
    pub competitors: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductRecord {
    pub fn named(name: impl Into<String>) -> Self {
        ProductRecord {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_list = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_competitors<I, S>(mut self, competitors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.competitors = competitors.into_iter().map(Into::into).collect();
        self
    }

    /// `category` followed by `categories`, blanks removed
    pub fn all_categories(&self) -> impl Iterator<Item = &str> {
        self.category
            .iter()
            .chain(self.categories.iter())
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }
}

/// A gap identified by analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapRecord {
    /// One of `feature`, `market`, `experience`
    #[serde(rename = "type")]
    pub gap_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A company that makes one or more products
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub size: Option<String>,
    pub funding: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user need that features may address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserNeedRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub importance: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Trimmed value, or `None` when missing or blank
pub(crate) fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn extra_properties(extra: &Map<String, Value>) -> PropertyMap {
    extra
        .iter()
        .map(|(k, v)| (k.clone(), PropertyValue::from_json(v)))
        .collect()
}
