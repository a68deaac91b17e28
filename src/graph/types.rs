//! Core type definitions for the knowledge graph

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalize a human-readable name into an ID fragment.
///
/// Lower-cases the input and joins its whitespace-separated words with `_`,
/// so "Dark  Mode " and "dark mode" produce the same slug.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Deterministic node identifier of the form `type:slug`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    /// Build the ID for an entity of `node_type` named `name`.
    ///
    /// Gaps are keyed by gap type as well; use [`NodeId::for_gap`] for them.
    pub fn for_entity(node_type: NodeType, name: &str) -> Self {
        NodeId(format!("{}:{}", node_type.id_prefix(), slugify(name)))
    }

    pub fn for_gap(gap_type: GapType, label: &str) -> Self {
        NodeId(format!(
            "{}:{}:{}",
            NodeType::Gap.id_prefix(),
            gap_type.as_str(),
            slugify(label)
        ))
    }

    /// Accept either a full ID carrying the `node_type` prefix or a name
    pub fn from_reference(node_type: NodeType, reference: &str) -> Self {
        let reference = reference.trim();
        match reference.strip_prefix(node_type.id_prefix()) {
            Some(rest) if rest.starts_with(':') => NodeId::new(reference),
            _ => NodeId::for_entity(node_type, reference),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeId(pub u64);

impl EdgeId {
    pub fn new(id: u64) -> Self {
        EdgeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl From<u64> for EdgeId {
    fn from(id: u64) -> Self {
        EdgeId(id)
    }
}

/// Node type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Product,
    Feature,
    Category,
    Gap,
    Company,
    UserNeed,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::Product,
        NodeType::Feature,
        NodeType::Category,
        NodeType::Gap,
        NodeType::Company,
        NodeType::UserNeed,
    ];

    /// Name used in the export document's `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Product => "product",
            NodeType::Feature => "feature",
            NodeType::Category => "category",
            NodeType::Gap => "gap",
            NodeType::Company => "company",
            NodeType::UserNeed => "user_need",
        }
    }

    /// Prefix of node IDs of this type
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NodeType::UserNeed => "need",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    /// Accepts both `user_need` and `UserNeed` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "product" => Ok(NodeType::Product),
            "feature" => Ok(NodeType::Feature),
            "category" => Ok(NodeType::Category),
            "gap" => Ok(NodeType::Gap),
            "company" => Ok(NodeType::Company),
            "userneed" | "need" => Ok(NodeType::UserNeed),
            _ => Err(format!("unknown node type '{}'", s)),
        }
    }
}

/// Classification of an identified gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    Feature,
    Market,
    Experience,
}

impl GapType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapType::Feature => "feature",
            GapType::Market => "market",
            GapType::Experience => "experience",
        }
    }
}

impl fmt::Display for GapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GapType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feature" => Ok(GapType::Feature),
            "market" => Ok(GapType::Market),
            "experience" => Ok(GapType::Experience),
            _ => Err(format!(
                "unknown gap type '{}' (expected feature, market or experience)",
                s
            )),
        }
    }
}

/// Relationship label carried by an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Relationship {
    HasFeature,
    BelongsTo,
    Contains,
    CompetesWith,
    IdentifiedIn,
    Suggests,
    AddressedBy,
    Makes,
    SimilarTo,
    /// Caller-defined label outside the built-in vocabulary
    Custom(String),
}

impl Relationship {
    pub fn as_str(&self) -> &str {
        match self {
            Relationship::HasFeature => "has_feature",
            Relationship::BelongsTo => "belongs_to",
            Relationship::Contains => "contains",
            Relationship::CompetesWith => "competes_with",
            Relationship::IdentifiedIn => "identified_in",
            Relationship::Suggests => "suggests",
            Relationship::AddressedBy => "addressed_by",
            Relationship::Makes => "makes",
            Relationship::SimilarTo => "similar_to",
            Relationship::Custom(label) => label,
        }
    }

    /// Whether the direction of the edge carries meaning
    pub fn is_directed(&self) -> bool {
        matches!(
            self,
            Relationship::Suggests | Relationship::AddressedBy | Relationship::IdentifiedIn
        )
    }

    /// Whether `a -> b` and `b -> a` are distinct edges. `competes_with` is
    /// symmetric but stored as an explicit pair.
    pub fn keeps_direction(&self) -> bool {
        self.is_directed() || matches!(self, Relationship::CompetesWith)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Relationship {
    fn from(s: &str) -> Self {
        match s {
            "has_feature" => Relationship::HasFeature,
            "belongs_to" => Relationship::BelongsTo,
            "contains" => Relationship::Contains,
            "competes_with" => Relationship::CompetesWith,
            "identified_in" => Relationship::IdentifiedIn,
            "suggests" => Relationship::Suggests,
            "addressed_by" => Relationship::AddressedBy,
            "makes" => Relationship::Makes,
            "similar_to" => Relationship::SimilarTo,
            other => Relationship::Custom(other.to_string()),
        }
    }
}

impl From<String> for Relationship {
    fn from(s: String) -> Self {
        Relationship::from(s.as_str())
    }
}

impl From<Relationship> for String {
    fn from(rel: Relationship) -> Self {
        rel.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Dark mode"), "dark_mode");
        assert_eq!(slugify("  Dark   Mode "), "dark_mode");
        assert_eq!(slugify("API"), "api");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_node_id_for_entity() {
        let id = NodeId::for_entity(NodeType::Product, "Notion Clone");
        assert_eq!(id.as_str(), "product:notion_clone");
        assert_eq!(format!("{}", id), "product:notion_clone");

        let need = NodeId::for_entity(NodeType::UserNeed, "Offline access");
        assert_eq!(need.as_str(), "need:offline_access");
    }

    #[test]
    fn test_feature_ids_dedupe_by_slug() {
        assert_eq!(
            NodeId::for_entity(NodeType::Feature, "Dark mode"),
            NodeId::for_entity(NodeType::Feature, "dark mode")
        );
    }

    #[test]
    fn test_node_id_from_reference() {
        assert_eq!(
            NodeId::from_reference(NodeType::Product, "product:acme_docs").as_str(),
            "product:acme_docs"
        );
        assert_eq!(
            NodeId::from_reference(NodeType::Product, "Acme Docs").as_str(),
            "product:acme_docs"
        );
        assert_eq!(
            NodeId::from_reference(NodeType::Feature, "productivity").as_str(),
            "feature:productivity"
        );
    }

    #[test]
    fn test_gap_id() {
        let id = NodeId::for_gap(GapType::Market, "SMB Segment");
        assert_eq!(id.as_str(), "gap:market:smb_segment");
    }

    #[test]
    fn test_node_type_parse() {
        assert_eq!("product".parse::<NodeType>(), Ok(NodeType::Product));
        assert_eq!("Product".parse::<NodeType>(), Ok(NodeType::Product));
        assert_eq!("user_need".parse::<NodeType>(), Ok(NodeType::UserNeed));
        assert_eq!("UserNeed".parse::<NodeType>(), Ok(NodeType::UserNeed));
        assert!("widget".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_gap_type_parse() {
        assert_eq!("Feature".parse::<GapType>(), Ok(GapType::Feature));
        assert_eq!("experience".parse::<GapType>(), Ok(GapType::Experience));
        assert!("pricing".parse::<GapType>().is_err());
    }

    #[test]
    fn test_relationship_round_trip() {
        for label in ["has_feature", "contains", "competes_with", "similar_to"] {
            let rel = Relationship::from(label);
            assert!(!matches!(rel, Relationship::Custom(_)));
            assert_eq!(rel.as_str(), label);
        }
        let custom = Relationship::from("integrates_with");
        assert_eq!(custom, Relationship::Custom("integrates_with".to_string()));
        assert_eq!(String::from(custom), "integrates_with");
    }

    #[test]
    fn test_relationship_direction() {
        assert!(Relationship::Suggests.is_directed());
        assert!(Relationship::IdentifiedIn.is_directed());
        assert!(!Relationship::CompetesWith.is_directed());
        assert!(!Relationship::HasFeature.is_directed());

        assert!(Relationship::CompetesWith.keeps_direction());
        assert!(Relationship::AddressedBy.keeps_direction());
        assert!(!Relationship::SimilarTo.keeps_direction());
        assert!(!Relationship::Custom("integrates_with".into()).keeps_direction());
    }

    #[test]
    fn test_edge_id() {
        let id = EdgeId::new(99);
        assert_eq!(id.as_u64(), 99);
        assert_eq!(format!("{}", id), "EdgeId(99)");
    }
}
