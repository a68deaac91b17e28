use anyhow::Result;
use saas_kg::algo::{
    analyze_market, find_feature_gap_opportunities, find_missing_features, find_popular_features,
    find_similar_products, link_similar_products,
};
use saas_kg::{
    GapRecord, GraphStore, Ingestor, KgConfig, MemoryRepository, NodeId, ProductRecord,
    Repository, UserNeedRecord,
};
use std::str::FromStr;

fn main() -> Result<()> {
    let config = KgConfig::load(None)?;
    let level = tracing::Level::from_str(&config.log_level).unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    println!("SaaS Knowledge Graph v{}", saas_kg::version());
    println!("==========================================");
    println!();

    let mut store = GraphStore::new();
    let ids = demo_ingestion(&mut store)?;
    demo_queries(&mut store, &ids, &config)?;
    demo_round_trip(&store)?;
    Ok(())
}

fn demo_ingestion(store: &mut GraphStore) -> Result<Vec<NodeId>> {
    println!("=== Demo 1: Ingestion ===");
    let mut ingestor = Ingestor::new(store);

    let products = [
        ProductRecord::named("Notion")
            .with_features(["Docs", "Wikis", "Databases", "Real-time collaboration"])
            .with_categories(["Productivity"]),
        ProductRecord::named("Coda")
            .with_features(["Docs", "Databases", "Automations", "Real-time collaboration"])
            .with_categories(["Productivity"])
            .with_competitors(["Notion"]),
        ProductRecord::named("Airtable")
            .with_features(["Databases", "Automations", "Forms"])
            .with_categories(["Productivity", "No-code"])
            .with_competitors(["Notion", "Coda"]),
        ProductRecord::named("Webflow")
            .with_features(["Site builder", "Forms"])
            .with_categories(["No-code"]),
    ];
    let ids = ingestor.add_products(&products)?;
    for id in &ids {
        println!("✓ Ingested {}", id);
    }

    let gap = GapRecord {
        gap_type: Some("feature".to_string()),
        name: Some("Offline mode".to_string()),
        description: Some("Editing without a connection".to_string()),
        ..GapRecord::default()
    };
    let gap_id = ingestor.add_gap(&gap, &ids[..2])?;
    println!("✓ Recorded gap {}", gap_id);

    let need = UserNeedRecord {
        name: Some("Team knowledge base".to_string()),
        importance: Some("high".to_string()),
        ..UserNeedRecord::default()
    };
    let need_id = ingestor.add_user_need(&need, &[NodeId::from("feature:wikis")])?;
    println!("✓ Recorded user need {}", need_id);

    println!("\nGraph Statistics:");
    println!("  Total nodes: {}", store.node_count());
    println!("  Total edges: {}", store.edge_count());
    Ok(ids)
}

fn demo_queries(store: &mut GraphStore, ids: &[NodeId], config: &KgConfig) -> Result<()> {
    println!("\n=== Demo 2: Queries ===");
    let queries = &config.queries;
    let notion = &ids[0];

    println!("\nProducts similar to {} (threshold {}):", notion, queries.similarity_threshold);
    for similar in find_similar_products(store, notion, queries.similarity_threshold) {
        println!("  → {} ({:.2})", similar.product_id, similar.score);
    }

    println!("\nFeature gap opportunities (min {} products):", queries.min_products);
    for opportunity in find_feature_gap_opportunities(store, queries.min_products) {
        println!(
            "  → {} missing from {} product(s), strength {:.2}",
            opportunity.feature_id,
            opportunity.missing_products.len(),
            opportunity.opportunity_strength
        );
    }

    println!("\nFeatures {} lacks against its competitors:", notion);
    for (competitor, features) in find_missing_features(store, notion, None) {
        let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
        println!("  → {}: {}", competitor, names.join(", "));
    }

    println!("\nPopular features in Productivity:");
    for feature in find_popular_features(store, Some("Productivity"), queries.popular_limit) {
        println!("  → {} ({})", feature.name, feature.count);
    }

    let market = analyze_market(store, None, 3);
    println!("\nMarket: {} products", market.product_count);
    for (category, count) in &market.category_distribution {
        println!("  → {}: {}", category, count);
    }

    let linked = link_similar_products(store, queries.similarity_threshold)?;
    println!("\n✓ Linked {} similar product pairs", linked);
    Ok(())
}

fn demo_round_trip(store: &GraphStore) -> Result<()> {
    println!("\n=== Demo 3: Persistence ===");
    let repo = MemoryRepository::new();
    repo.save(store)?;
    let restored = repo.load()?;
    println!(
        "✓ Restored {} nodes and {} edges from snapshot",
        restored.node_count(),
        restored.edge_count()
    );
    Ok(())
}
