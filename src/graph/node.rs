//! Node implementation for the knowledge graph
//!
//! Each node carries the fields every entity shares (name, description),
//! a typed payload selected by its [`NodeType`], and an open map of extra
//! attributes for anything the typed payload does not model.

use super::property::{merge_properties, PropertyMap, PropertyValue};
use super::types::{GapType, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// Attribute names every exported node owns, whatever its type
pub const CORE_ATTRIBUTES: [&str; 8] = [
    "id",
    "type",
    "node_type",
    "name",
    "description",
    "gap_type",
    "created_at",
    "updated_at",
];

/// Typed attributes per node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Product {
        url: Option<String>,
        pricing: Option<String>,
        audience: Option<String>,
    },
    Feature,
    Category,
    Gap {
        gap_type: GapType,
    },
    Company {
        url: Option<String>,
        size: Option<String>,
        funding: Option<String>,
    },
    UserNeed {
        importance: Option<String>,
    },
}

impl NodeKind {
    /// Payload for `node_type` with no attributes set; `gap_type` only applies to gaps.
    pub fn empty(node_type: NodeType, gap_type: GapType) -> Self {
        match node_type {
            NodeType::Product => NodeKind::Product {
                url: None,
                pricing: None,
                audience: None,
            },
            NodeType::Feature => NodeKind::Feature,
            NodeType::Category => NodeKind::Category,
            NodeType::Gap => NodeKind::Gap { gap_type },
            NodeType::Company => NodeKind::Company {
                url: None,
                size: None,
                funding: None,
            },
            NodeType::UserNeed => NodeKind::UserNeed { importance: None },
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Product { .. } => NodeType::Product,
            NodeKind::Feature => NodeType::Feature,
            NodeKind::Category => NodeType::Category,
            NodeKind::Gap { .. } => NodeType::Gap,
            NodeKind::Company { .. } => NodeType::Company,
            NodeKind::UserNeed { .. } => NodeType::UserNeed,
        }
    }

    /// Export names of the typed string attributes of this kind
    pub fn typed_keys(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Product { .. } => &["url", "pricing", "audience"],
            NodeKind::Company { .. } => &["url", "size", "funding"],
            NodeKind::UserNeed { .. } => &["importance"],
            NodeKind::Feature | NodeKind::Category | NodeKind::Gap { .. } => &[],
        }
    }

    /// Typed string attributes that are set, keyed by their export name
    pub fn string_attributes(&self) -> Vec<(&'static str, &str)> {
        let fields: Vec<(&'static str, Option<&String>)> = match self {
            NodeKind::Product {
                url,
                pricing,
                audience,
            } => vec![
                ("url", url.as_ref()),
                ("pricing", pricing.as_ref()),
                ("audience", audience.as_ref()),
            ],
            NodeKind::Company { url, size, funding } => vec![
                ("url", url.as_ref()),
                ("size", size.as_ref()),
                ("funding", funding.as_ref()),
            ],
            NodeKind::UserNeed { importance } => vec![("importance", importance.as_ref())],
            NodeKind::Feature | NodeKind::Category | NodeKind::Gap { .. } => Vec::new(),
        };
        fields
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v.as_str())))
            .collect()
    }

    /// Set a typed string attribute by export name.
    ///
    /// Returns `false` when this kind has no typed field called `key`.
    pub fn set_string_attribute(&mut self, key: &str, value: String) -> bool {
        let slot = match self {
            NodeKind::Product {
                url,
                pricing,
                audience,
            } => match key {
                "url" => url,
                "pricing" => pricing,
                "audience" => audience,
                _ => return false,
            },
            NodeKind::Company { url, size, funding } => match key {
                "url" => url,
                "size" => size,
                "funding" => funding,
                _ => return false,
            },
            NodeKind::UserNeed { importance } if key == "importance" => importance,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Overlay the fields that are set in `other`
    fn merge(&mut self, other: NodeKind) {
        match (self, other) {
            (
                NodeKind::Product {
                    url,
                    pricing,
                    audience,
                },
                NodeKind::Product {
                    url: new_url,
                    pricing: new_pricing,
                    audience: new_audience,
                },
            ) => {
                overlay(url, new_url);
                overlay(pricing, new_pricing);
                overlay(audience, new_audience);
            }
            (
                NodeKind::Company { url, size, funding },
                NodeKind::Company {
                    url: new_url,
                    size: new_size,
                    funding: new_funding,
                },
            ) => {
                overlay(url, new_url);
                overlay(size, new_size);
                overlay(funding, new_funding);
            }
            (NodeKind::UserNeed { importance }, NodeKind::UserNeed { importance: new }) => {
                overlay(importance, new);
            }
            (NodeKind::Gap { gap_type }, NodeKind::Gap { gap_type: new }) => {
                *gap_type = new;
            }
            // Feature and Category carry no typed fields; mismatched kinds are
            // rejected by the store before reaching here.
            _ => {}
        }
    }
}

fn overlay(slot: &mut Option<String>, incoming: Option<String>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}

/// A node in the knowledge graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Deterministic `type:slug` identifier
    pub id: NodeId,

    /// Human-readable name, fixed at creation
    pub name: String,

    pub description: Option<String>,

    /// Typed attributes; also determines the node type
    pub kind: NodeKind,

    /// Open attributes not covered by `kind`
    pub extra: PropertyMap,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Node {
    /// Create a new node
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, kind: NodeKind) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Node {
            id: id.into(),
            name: name.into(),
            description: None,
            kind,
            extra: PropertyMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_extra(mut self, extra: PropertyMap) -> Self {
        self.extra = extra;
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn gap_type(&self) -> Option<GapType> {
        match self.kind {
            NodeKind::Gap { gap_type } => Some(gap_type),
            _ => None,
        }
    }

    /// Set an extra attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        let old = self.extra.insert(key.into(), value.into());
        self.update_timestamp();
        old
    }

    /// Get an extra attribute
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.extra.get(key)
    }

    /// Whether `key` names a core or typed attribute of this node and so
    /// cannot be used as an extra attribute
    pub fn is_reserved_attribute(&self, key: &str) -> bool {
        CORE_ATTRIBUTES.contains(&key) || self.kind.typed_keys().contains(&key)
    }

    /// First extra attribute that shadows a reserved name, if any
    pub fn reserved_extra_key(&self) -> Option<&str> {
        self.extra
            .keys()
            .map(String::as_str)
            .find(|key| self.is_reserved_attribute(key))
    }

    /// Check if an extra attribute exists
    pub fn has_property(&self, key: &str) -> bool {
        self.extra.contains_key(key)
    }

    /// Merge a later observation of the same entity into this node.
    ///
    /// The name and creation time are kept; every attribute set on `other`
    /// overrides or extends the current value.
    pub fn merge(&mut self, other: Node) {
        if other.description.is_some() {
            self.description = other.description;
        }
        self.kind.merge(other.kind);
        merge_properties(&mut self.extra, other.extra);
        self.update_timestamp();
    }

    /// Update the modification timestamp
    fn update_timestamp(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(url: Option<&str>, pricing: Option<&str>) -> NodeKind {
        NodeKind::Product {
            url: url.map(str::to_string),
            pricing: pricing.map(str::to_string),
            audience: None,
        }
    }

    #[test]
    fn test_node_type_follows_kind() {
        let node = Node::new("product:acme", "Acme", product(None, None));
        assert_eq!(node.node_type(), NodeType::Product);
        assert_eq!(node.gap_type(), None);

        let gap = Node::new(
            "gap:market:smb",
            "SMB",
            NodeKind::Gap {
                gap_type: GapType::Market,
            },
        );
        assert_eq!(gap.node_type(), NodeType::Gap);
        assert_eq!(gap.gap_type(), Some(GapType::Market));
    }

    #[test]
    fn test_merge_keeps_name_and_overlays_set_fields() {
        let mut node = Node::new("product:acme", "Acme", product(Some("https://acme.io"), None))
            .with_description(Some("Old".to_string()));
        let created = node.created_at;

        let update = Node::new("product:acme", "ACME", product(None, Some("freemium")));
        node.merge(update);

        assert_eq!(node.name, "Acme");
        assert_eq!(node.description.as_deref(), Some("Old"));
        assert_eq!(node.created_at, created);
        assert_eq!(
            node.kind,
            product(Some("https://acme.io"), Some("freemium"))
        );
    }

    #[test]
    fn test_merge_extends_extra_attributes() {
        let mut node = Node::new("feature:sso", "SSO", NodeKind::Feature);
        node.set_property("tier", "enterprise");

        let mut update = Node::new("feature:sso", "SSO", NodeKind::Feature);
        update.set_property("protocols", vec![PropertyValue::from("saml")]);
        node.merge(update);

        assert!(node.has_property("tier"));
        assert!(node.has_property("protocols"));
    }

    #[test]
    fn test_string_attributes() {
        let mut kind = NodeKind::empty(NodeType::Company, GapType::Feature);
        assert!(kind.string_attributes().is_empty());
        assert!(kind.set_string_attribute("funding", "Series A".to_string()));
        assert!(!kind.set_string_attribute("pricing", "free".to_string()));
        assert_eq!(kind.string_attributes(), vec![("funding", "Series A")]);
    }

    #[test]
    fn test_reserved_attributes() {
        let mut node = Node::new("product:acme", "Acme", product(None, None));
        assert!(node.is_reserved_attribute("type"));
        assert!(node.is_reserved_attribute("pricing"));
        assert!(!node.is_reserved_attribute("rating"));
        assert_eq!(node.reserved_extra_key(), None);

        node.set_property("url", "https://acme.io");
        assert_eq!(node.reserved_extra_key(), Some("url"));

        let feature = Node::new("feature:x", "x", NodeKind::Feature);
        assert!(!feature.is_reserved_attribute("url"));
    }

    #[test]
    fn test_node_equality() {
        let a = Node::new("feature:x", "x", NodeKind::Feature);
        let b = Node::new("feature:x", "X", NodeKind::Feature);
        let c = Node::new("feature:y", "y", NodeKind::Feature);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
