//! saas-kg-cli — command-line interface for the SaaS Knowledge Graph
//!
//! Every command loads the graph file named by the configuration, runs, and
//! writes the graph back if it changed it.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use saas_kg::algo::{
    analyze_market, find_feature_gap_opportunities, find_missing_features, find_popular_features,
    find_similar_products, link_similar_products,
};
use saas_kg::{
    CompanyRecord, GapRecord, GraphStore, Ingestor, JsonFileRepository, KgConfig, NodeId,
    NodeType, ProductRecord, PropertyMap, PropertyValue, Relationship, Repository, UserNeedRecord,
};
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

#[derive(Parser)]
#[command(name = "saas-kg", version, about = "SaaS Knowledge Graph CLI")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Graph file, overriding the configuration
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or update a product
    AddProduct {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// Category name (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Feature name (repeatable, or comma-separated)
        #[arg(long = "feature", value_delimiter = ',')]
        features: Vec<String>,
        #[arg(long)]
        pricing: Option<String>,
        #[arg(long)]
        audience: Option<String>,
        /// Competitor product name or ID (repeatable)
        #[arg(long = "competitor")]
        competitors: Vec<String>,
    },
    /// Record a market gap
    AddGap {
        /// feature, market or experience
        #[arg(long = "type")]
        gap_type: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Product the gap was identified in (repeatable)
        #[arg(long = "product")]
        products: Vec<String>,
    },
    /// Add or update a company
    AddCompany {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        funding: Option<String>,
        /// Product the company makes (repeatable)
        #[arg(long = "product")]
        products: Vec<String>,
    },
    /// Add or update a user need
    AddNeed {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        importance: Option<String>,
        /// Feature that addresses the need (repeatable)
        #[arg(long = "feature")]
        features: Vec<String>,
    },
    /// Link two existing nodes by ID
    Link {
        source: String,
        target: String,
        relationship: String,
        /// Edge property as key=value; values are parsed as JSON when possible
        #[arg(long = "prop")]
        props: Vec<String>,
    },
    /// Products sharing features with a product
    Similar {
        product: String,
        #[arg(long)]
        threshold: Option<f64>,
        /// Also store similar_to edges for every pair above the threshold
        #[arg(long)]
        link: bool,
    },
    /// Features most products have but some lack
    Opportunities {
        #[arg(long)]
        min_products: Option<usize>,
    },
    /// Features competitors have that a product lacks
    Missing {
        product: String,
        /// Compare against these products instead of recorded competitors
        #[arg(long = "competitor")]
        competitors: Vec<String>,
    },
    /// Most common features
    Popular {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Market overview, optionally for one category
    Market {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Node and edge counts
    Stats,
    /// Print or write the graph document
    Export {
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        compact: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = KgConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(graph) = cli.graph {
        config.graph_path = graph;
    }
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::from_str(&config.log_level).unwrap_or(tracing::Level::WARN)
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    debug!("Using graph file {:?}", config.graph_path);

    let repo = JsonFileRepository::new(&config.graph_path).with_pretty(config.pretty);
    let mut store = repo.load().context("loading graph")?;
    let format = cli.format;
    let queries = config.queries.clone();

    let changed = match cli.command {
        Commands::AddProduct {
            name,
            description,
            url,
            categories,
            features,
            pricing,
            audience,
            competitors,
        } => {
            let record = ProductRecord {
                description,
                url,
                pricing_model: pricing,
                target_audience: audience,
                ..ProductRecord::named(name)
                    .with_categories(categories)
                    .with_features(features)
                    .with_competitors(competitors)
            };
            let id = Ingestor::new(&mut store).add_product(&record)?;
            println!("{}", id);
            true
        }
        Commands::AddGap {
            gap_type,
            name,
            description,
            products,
        } => {
            let record = GapRecord {
                gap_type: Some(gap_type),
                name,
                description,
                ..GapRecord::default()
            };
            let products = references(NodeType::Product, &products);
            let id = Ingestor::new(&mut store).add_gap(&record, &products)?;
            println!("{}", id);
            true
        }
        Commands::AddCompany {
            name,
            description,
            url,
            size,
            funding,
            products,
        } => {
            let record = CompanyRecord {
                name: Some(name),
                description,
                url,
                size,
                funding,
                ..CompanyRecord::default()
            };
            let products = references(NodeType::Product, &products);
            let id = Ingestor::new(&mut store).add_company(&record, &products)?;
            println!("{}", id);
            true
        }
        Commands::AddNeed {
            name,
            description,
            importance,
            features,
        } => {
            let record = UserNeedRecord {
                name: Some(name),
                description,
                importance,
                ..UserNeedRecord::default()
            };
            let features = references(NodeType::Feature, &features);
            let id = Ingestor::new(&mut store).add_user_need(&record, &features)?;
            println!("{}", id);
            true
        }
        Commands::Link {
            source,
            target,
            relationship,
            props,
        } => {
            let properties = parse_props(&props)?;
            Ingestor::new(&mut store).add_relationship(
                &NodeId::from(source.as_str()),
                &NodeId::from(target.as_str()),
                Relationship::from(relationship.as_str()),
                properties,
            )?;
            println!("{} -[{}]- {}", source, relationship, target);
            true
        }
        Commands::Similar {
            product,
            threshold,
            link,
        } => {
            let threshold = threshold.unwrap_or(queries.similarity_threshold);
            let product = NodeId::from_reference(NodeType::Product, &product);
            let similar = find_similar_products(&store, &product, threshold);
            let rows = similar
                .iter()
                .map(|s| vec![s.product_id.to_string(), name_of(&store, &s.product_id), format!("{:.3}", s.score)])
                .collect();
            emit(&format, serde_json::to_value(&similar)?, &["Product", "Name", "Similarity"], rows)?;
            if link {
                let linked = link_similar_products(&mut store, threshold)?;
                eprintln!("Linked {} similar product pairs", linked);
            }
            link
        }
        Commands::Opportunities { min_products } => {
            let min_products = min_products.unwrap_or(queries.min_products);
            let opportunities = find_feature_gap_opportunities(&store, min_products);
            let rows = opportunities
                .iter()
                .map(|o| {
                    vec![
                        name_of(&store, &o.feature_id),
                        format!("{:.3}", o.opportunity_strength),
                        join_ids(&o.missing_products),
                    ]
                })
                .collect();
            emit(
                &format,
                serde_json::to_value(&opportunities)?,
                &["Feature", "Strength", "Missing from"],
                rows,
            )?;
            false
        }
        Commands::Missing {
            product,
            competitors,
        } => {
            let product = NodeId::from_reference(NodeType::Product, &product);
            let competitors = references(NodeType::Product, &competitors);
            let explicit = (!competitors.is_empty()).then_some(competitors.as_slice());
            let missing = find_missing_features(&store, &product, explicit);
            let rows = missing
                .iter()
                .map(|(competitor, features)| {
                    let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
                    vec![competitor.to_string(), names.join(", ")]
                })
                .collect();
            emit(&format, serde_json::to_value(&missing)?, &["Competitor", "Missing features"], rows)?;
            false
        }
        Commands::Popular { category, limit } => {
            let limit = limit.unwrap_or(queries.popular_limit);
            let popular = find_popular_features(&store, category.as_deref(), limit);
            let rows = popular
                .iter()
                .map(|f| vec![f.name.clone(), f.count.to_string()])
                .collect();
            emit(&format, serde_json::to_value(&popular)?, &["Feature", "Products"], rows)?;
            false
        }
        Commands::Market { category, limit } => {
            let limit = limit.unwrap_or(queries.popular_limit);
            let analysis = analyze_market(&store, category.as_deref(), limit);
            let mut rows = vec![
                vec!["Products".to_string(), analysis.product_count.to_string()],
                vec!["Names".to_string(), analysis.products.join(", ")],
            ];
            for feature in &analysis.popular_features {
                rows.push(vec![format!("Feature: {}", feature.name), feature.count.to_string()]);
            }
            for (name, count) in &analysis.category_distribution {
                rows.push(vec![format!("Category: {}", name), count.to_string()]);
            }
            emit(&format, serde_json::to_value(&analysis)?, &["Market", "Value"], rows)?;
            false
        }
        Commands::Stats => {
            let stats = store.statistics();
            let mut rows = vec![
                vec!["nodes".to_string(), stats.node_count.to_string()],
                vec!["edges".to_string(), stats.edge_count.to_string()],
            ];
            for (node_type, count) in &stats.nodes_by_type {
                rows.push(vec![format!("nodes: {}", node_type), count.to_string()]);
            }
            for (relationship, count) in &stats.edges_by_relationship {
                rows.push(vec![format!("edges: {}", relationship), count.to_string()]);
            }
            emit(&format, serde_json::to_value(&stats)?, &["Metric", "Count"], rows)?;
            false
        }
        Commands::Export { output, compact } => {
            match output {
                Some(path) => {
                    JsonFileRepository::new(path.clone())
                        .with_pretty(!compact)
                        .save(&store)?;
                    eprintln!("Exported graph to {}", path.display());
                }
                None => println!("{}", store.to_json_string(!compact)?),
            }
            false
        }
    };

    if changed {
        repo.save(&store).context("saving graph")?;
    }
    Ok(())
}

fn references(node_type: NodeType, values: &[String]) -> Vec<NodeId> {
    values
        .iter()
        .filter(|v| !v.trim().is_empty())
        .map(|v| NodeId::from_reference(node_type, v))
        .collect()
}

fn parse_props(props: &[String]) -> Result<PropertyMap> {
    let mut properties = PropertyMap::new();
    for prop in props {
        let Some((key, raw)) = prop.split_once('=') else {
            bail!("property '{}' is not of the form key=value", prop);
        };
        let value = serde_json::from_str::<Value>(raw)
            .map(|json| PropertyValue::from_json(&json))
            .unwrap_or_else(|_| PropertyValue::String(raw.to_string()));
        properties.insert(key.trim().to_string(), value);
    }
    Ok(properties)
}

fn name_of(store: &GraphStore, id: &NodeId) -> String {
    store
        .get_node(id)
        .map_or_else(|| id.to_string(), |node| node.name.clone())
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter().map(NodeId::as_str).collect::<Vec<_>>().join(", ")
}

fn emit(format: &OutputFormat, json: Value, columns: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Csv => {
            println!("{}", columns.join(","));
            for row in &rows {
                let cells: Vec<String> = row.iter().map(|cell| csv_cell(cell)).collect();
                println!("{}", cells.join(","));
            }
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("(no results)");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(columns);
            let count = rows.len();
            for row in rows {
                table.add_row(row);
            }
            println!("{}", table);
            println!("{} row(s)", count);
        }
    }
    Ok(())
}

fn csv_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_props() {
        let props = parse_props(&[
            "weight=0.5".to_string(),
            "note=close rival".to_string(),
            "tags=[\"a\",\"b\"]".to_string(),
        ])
        .unwrap();
        assert_eq!(props.get("weight"), Some(&PropertyValue::Float(0.5)));
        assert_eq!(
            props.get("note"),
            Some(&PropertyValue::String("close rival".to_string()))
        );
        assert!(props.get("tags").and_then(|v| v.as_array()).is_some());
        assert!(parse_props(&["novalue".to_string()]).is_err());
    }

    #[test]
    fn test_references() {
        let ids = references(
            NodeType::Product,
            &["Acme Docs".to_string(), "product:beta".to_string(), " ".to_string()],
        );
        assert_eq!(ids, vec![NodeId::from("product:acme_docs"), NodeId::from("product:beta")]);
    }

    #[test]
    fn test_csv_cell() {
        assert_eq!(csv_cell("plain"), "plain");
        assert_eq!(csv_cell("a, b"), "\"a, b\"");
        assert_eq!(csv_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "saas-kg",
            "--format",
            "json",
            "add-product",
            "Acme",
            "--feature",
            "sso,audit log",
            "--category",
            "Security",
        ])
        .unwrap();
        match cli.command {
            Commands::AddProduct {
                name,
                features,
                categories,
                ..
            } => {
                assert_eq!(name, "Acme");
                assert_eq!(features, vec!["sso", "audit log"]);
                assert_eq!(categories, vec!["Security"]);
            }
            _ => panic!("expected add-product"),
        }
    }
}
