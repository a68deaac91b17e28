//! Ingestion of product, gap, company and user-need records
//!
//! The [`Ingestor`] borrows a [`GraphStore`] mutably for the duration of a
//! batch of writes. Every entity is merged into its existing node when the
//! same logical entity was seen before, and links are only ever added.
//!
//! Records are validated before the store is touched: a missing name, an
//! unknown link target or an ID already held by a node of another type is
//! reported without leaving a half-written entity.

pub mod records;

pub use records::{CompanyRecord, GapRecord, ProductRecord, UserNeedRecord};

use crate::graph::{
    EdgeId, GapType, GraphError, GraphResult, GraphStore, Node, NodeId, NodeKind, NodeType,
    PropertyMap, Relationship,
};
use records::{clean, extra_properties};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Attach the unmodelled input fields of a record, dropping any that would
/// shadow a core or typed attribute of `node`.
fn with_open_attributes(mut node: Node, extra: &Map<String, Value>) -> Node {
    for (key, value) in extra_properties(extra) {
        if node.is_reserved_attribute(&key) {
            warn!("Ignoring reserved attribute '{}' on '{}'", key, node.id);
            continue;
        }
        node.extra.insert(key, value);
    }
    node
}

/// Characters of a gap description used as its label when it has no name
const GAP_LABEL_CHARS: usize = 30;

/// Writes input records into an injected graph store
pub struct Ingestor<'g> {
    store: &'g mut GraphStore,
}

impl<'g> Ingestor<'g> {
    pub fn new(store: &'g mut GraphStore) -> Self {
        Ingestor { store }
    }

    /// Add or merge a product together with its categories, features and
    /// competitor links. Returns the product ID.
    ///
    /// Competitors that are not yet known products are skipped; they are
    /// linked when either side is ingested again after both exist.
    pub fn add_product(&mut self, record: &ProductRecord) -> GraphResult<NodeId> {
        let name = required_name(&record.name)?;
        let product_id = NodeId::for_entity(NodeType::Product, &name);
        self.check_product_types(&product_id, record)?;

        let node = Node::new(
            product_id.clone(),
            name.as_str(),
            NodeKind::Product {
                url: clean(&record.url),
                pricing: clean(&record.pricing_model),
                audience: clean(&record.target_audience),
            },
        )
        .with_description(clean(&record.description));
        let node = with_open_attributes(node, &record.extra);
        self.store.add_node(node)?;

        for category in record.all_categories() {
            let category_id = NodeId::for_entity(NodeType::Category, category);
            self.store
                .add_node(Node::new(category_id.clone(), category, NodeKind::Category))?;
            self.link(&category_id, &product_id, Relationship::Contains)?;
        }

        for feature in feature_names(record) {
            let feature_id = NodeId::for_entity(NodeType::Feature, feature);
            self.store
                .add_node(Node::new(feature_id.clone(), feature, NodeKind::Feature))?;
            self.link(&product_id, &feature_id, Relationship::HasFeature)?;
        }

        for competitor in record.competitors.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
            let competitor_id = NodeId::from_reference(NodeType::Product, competitor);
            if competitor_id == product_id {
                continue;
            }
            let known = self
                .store
                .get_node(&competitor_id)
                .map_or(false, |n| n.node_type() == NodeType::Product);
            if !known {
                debug!(
                    "Competitor '{}' of '{}' is not in the graph yet, skipping",
                    competitor, name
                );
                continue;
            }
            self.link(&product_id, &competitor_id, Relationship::CompetesWith)?;
            self.link(&competitor_id, &product_id, Relationship::CompetesWith)?;
        }

        info!("Added product '{}' to knowledge graph", name);
        Ok(product_id)
    }

    /// Add several products. All records are validated before any is written.
    pub fn add_products(&mut self, records: &[ProductRecord]) -> GraphResult<Vec<NodeId>> {
        for (index, record) in records.iter().enumerate() {
            let name = required_name(&record.name).map_err(|_| {
                GraphError::validation(format!("products[{}].name", index), "is required")
            })?;
            self.check_product_types(&NodeId::for_entity(NodeType::Product, &name), record)?;
        }
        let ids = records
            .iter()
            .map(|record| self.add_product(record))
            .collect::<GraphResult<Vec<_>>>()?;
        info!("Added {} products to knowledge graph", ids.len());
        Ok(ids)
    }

    /// Add or merge a gap and link it to the products it was identified in.
    ///
    /// Feature gaps also create (or reuse) the feature they suggest.
    pub fn add_gap(&mut self, record: &GapRecord, related_products: &[NodeId]) -> GraphResult<NodeId> {
        let gap_type: GapType = clean(&record.gap_type)
            .ok_or_else(|| GraphError::validation("type", "is required"))?
            .parse()
            .map_err(|reason: String| GraphError::validation("type", reason))?;
        let description = clean(&record.description);
        let label = clean(&record.name)
            .or_else(|| {
                description.as_deref().map(|d| {
                    d.chars()
                        .take(GAP_LABEL_CHARS)
                        .collect::<String>()
                        .trim_end()
                        .to_string()
                })
            })
            .ok_or_else(|| GraphError::validation("name", "or description is required"))?;

        self.require_all(related_products, NodeType::Product)?;

        let gap_id = NodeId::for_gap(gap_type, &label);
        let feature_id = NodeId::for_entity(NodeType::Feature, &label);
        self.store.check_node_type(&gap_id, NodeType::Gap)?;
        if gap_type == GapType::Feature {
            self.store.check_node_type(&feature_id, NodeType::Feature)?;
        }

        let node = Node::new(gap_id.clone(), label.as_str(), NodeKind::Gap { gap_type })
            .with_description(description);
        let node = with_open_attributes(node, &record.extra);
        self.store.add_node(node)?;

        for product_id in related_products {
            self.link(&gap_id, product_id, Relationship::IdentifiedIn)?;
        }

        if gap_type == GapType::Feature {
            self.store
                .add_node(Node::new(feature_id.clone(), label.as_str(), NodeKind::Feature))?;
            self.link(&gap_id, &feature_id, Relationship::Suggests)?;
        }

        info!("Added gap '{}' to knowledge graph", label);
        Ok(gap_id)
    }

    /// Add or merge a company and link it to the products it makes
    pub fn add_company(&mut self, record: &CompanyRecord, products: &[NodeId]) -> GraphResult<NodeId> {
        let name = required_name(&record.name)?;
        self.require_all(products, NodeType::Product)?;

        let company_id = NodeId::for_entity(NodeType::Company, &name);
        let node = Node::new(
            company_id.clone(),
            name.as_str(),
            NodeKind::Company {
                url: clean(&record.url),
                size: clean(&record.size),
                funding: clean(&record.funding),
            },
        )
        .with_description(clean(&record.description));
        let node = with_open_attributes(node, &record.extra);
        self.store.add_node(node)?;

        for product_id in products {
            self.link(&company_id, product_id, Relationship::Makes)?;
        }

        info!("Added company '{}' to knowledge graph", name);
        Ok(company_id)
    }

    /// Add or merge a user need and link it to the features that address it
    pub fn add_user_need(&mut self, record: &UserNeedRecord, features: &[NodeId]) -> GraphResult<NodeId> {
        let name = required_name(&record.name)?;
        self.require_all(features, NodeType::Feature)?;

        let need_id = NodeId::for_entity(NodeType::UserNeed, &name);
        let node = Node::new(
            need_id.clone(),
            name.as_str(),
            NodeKind::UserNeed {
                importance: clean(&record.importance),
            },
        )
        .with_description(clean(&record.description));
        let node = with_open_attributes(node, &record.extra);
        self.store.add_node(node)?;

        for feature_id in features {
            self.link(&need_id, feature_id, Relationship::AddressedBy)?;
        }

        info!("Added user need '{}' to knowledge graph", name);
        Ok(need_id)
    }

    /// Add an explicit relationship between two existing nodes.
    ///
    /// Re-adding the same relationship overwrites its properties.
    pub fn add_relationship(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship: Relationship,
        properties: PropertyMap,
    ) -> GraphResult<EdgeId> {
        let edge_id = self
            .store
            .add_edge(source, target, relationship.clone(), properties)?;
        info!(
            "Added relationship '{}' between '{}' and '{}'",
            relationship, source, target
        );
        Ok(edge_id)
    }

    /// Add a property-less edge unless it already exists, so that properties
    /// recorded through [`Ingestor::add_relationship`] survive re-ingestion.
    fn link(&mut self, source: &NodeId, target: &NodeId, relationship: Relationship) -> GraphResult<()> {
        if self.store.find_edge(source, target, &relationship).is_none() {
            self.store
                .add_edge(source, target, relationship, PropertyMap::new())?;
        }
        Ok(())
    }

    /// Every node a product record writes must be free or already of its type
    fn check_product_types(&self, product_id: &NodeId, record: &ProductRecord) -> GraphResult<()> {
        self.store.check_node_type(product_id, NodeType::Product)?;
        for category in record.all_categories() {
            self.store
                .check_node_type(&NodeId::for_entity(NodeType::Category, category), NodeType::Category)?;
        }
        for feature in feature_names(record) {
            self.store
                .check_node_type(&NodeId::for_entity(NodeType::Feature, feature), NodeType::Feature)?;
        }
        Ok(())
    }

    fn require_all(&self, ids: &[NodeId], node_type: NodeType) -> GraphResult<()> {
        for id in ids {
            let node = self
                .store
                .get_node(id)
                .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;
            if node.node_type() != node_type {
                return Err(GraphError::validation(
                    id.to_string(),
                    format!("is a {}, expected a {}", node.node_type(), node_type),
                ));
            }
        }
        Ok(())
    }
}

fn feature_names(record: &ProductRecord) -> impl Iterator<Item = &str> {
    record.feature_list.iter().map(|f| f.trim()).filter(|f| !f.is_empty())
}

fn required_name(name: &Option<String>) -> GraphResult<String> {
    clean(name).ok_or_else(|| GraphError::validation("name", "is required"))
}
