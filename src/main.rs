use std::env;
use std::error::Error;
use std::fs;
use std::process;
use std::sync::Arc;

use deck_engine::game::{Strategy, SynergyDatabase};
use deck_engine::service::{
    build_candidates, build_multiple, BuilderConfig, CollectionCard, DeckBuilder, DeckRecommendation, PoolOptions,
    StrategyKind,
};

// ============================================================================
// 命令列
// ============================================================================

const USAGE: &str = "usage: deck_engine <collection.json> [strategy]";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let path = args.first().ok_or(USAGE)?;
    let strategy = match args.get(1) {
        Some(name) => Strategy::parse(name)?,
        None => Strategy::default(),
    };

    let raw = fs::read_to_string(path)?;
    let collection: Vec<CollectionCard> = serde_json::from_str(&raw)?;
    let synergy = Arc::new(SynergyDatabase::new());

    let recommendation = DeckBuilder::new(strategy)
        .with_synergy(Arc::clone(&synergy))
        .build(&collection)?;
    print_recommendation(&recommendation);

    let pool = build_candidates(&collection, &PoolOptions::new(strategy));
    let config = BuilderConfig::new(pool).with_synergy(synergy);
    let names: Vec<&str> = StrategyKind::all().iter().map(|k| k.name()).collect();
    let decks = build_multiple(&names, &config);

    println!();
    println!("Alternative builders:");
    for name in &names {
        match decks.get(*name) {
            Some(deck) => println!("  {:<24} {}", name, deck.join(", ")),
            None => println!("  {:<24} (no deck)", name),
        }
    }
    Ok(())
}

fn print_recommendation(recommendation: &DeckRecommendation) {
    println!("Strategy: {}", recommendation.strategy);
    println!("Average elixir: {:.2}", recommendation.avg_elixir);
    println!();
    for card in &recommendation.deck_detail {
        let role = card.role.map(|r| r.key()).unwrap_or("-");
        let evo = if recommendation.evolution_slots.contains(&card.name) { " [evo]" } else { "" };
        println!(
            "  {:<20} {:>2} elixir  lv {:>2}/{:<2} {:<14} {:.2}{}",
            card.name, card.elixir, card.level, card.max_level, role, card.score, evo
        );
    }

    if let Some(metrics) = &recommendation.metrics {
        println!();
        println!("Deck score: {:.3}", metrics.score.final_score);
        println!("Coherence:  {:.3}", metrics.coherence.coherence_score);
        if let Some(archetype) = metrics.coherence.primary_archetype {
            println!("Archetype:  {}", archetype.key());
        }
    }

    if !recommendation.notes.is_empty() {
        println!();
        println!("Notes:");
        for note in &recommendation.notes {
            println!("  - {}", note);
        }
    }
}
