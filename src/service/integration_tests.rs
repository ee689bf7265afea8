//! Service-layer integration tests (collection → pool → builders / fuzzer)

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use crate::game::{
        ArchetypeAvoidanceScorer, CardCandidate, CardPopularity, Strategy, SynergyDatabase, UniquenessConfig,
        UniquenessScorer, DECK_SIZE,
    };
    use crate::service::{
        build_candidates, build_multiple, rescore, BuilderConfig, CoOccurrenceMatrix, CollectionCard, DeckBuilder,
        DeckError, DeckFuzzer, DeckStrategy, FuzzingConfig, MetaLearningBuilder, PoolOptions, StrategyKind,
    };

    const COLLECTION_JSON: &str = r#"[
        {"name": "Hog Rider", "level": 13, "maxLevel": 14, "rarity": "Rare"},
        {"name": "Giant", "level": 11, "maxLevel": 14, "rarity": "Rare"},
        {"name": "Golem", "level": 11, "maxLevel": 14, "rarity": "Epic"},
        {"name": "Fireball", "level": 12, "maxLevel": 14, "rarity": "Rare"},
        {"name": "The Log", "level": 12, "maxLevel": 14, "rarity": "Legendary"},
        {"name": "Zap", "level": 13, "maxLevel": 14, "rarity": "Common"},
        {"name": "Musketeer", "level": 12, "maxLevel": 14, "rarity": "Rare",
         "stats": {"hitpoints": 720, "damage": 218, "damagePerSecond": 181, "range": 6, "targets": "Air & Ground"}},
        {"name": "Baby Dragon", "level": 11, "maxLevel": 14, "rarity": "Epic",
         "stats": {"hitpoints": 1152, "damage": 161, "damagePerSecond": 107, "range": 3.5, "targets": "Air & Ground", "radius": 1.5}},
        {"name": "Valkyrie", "level": 12, "maxLevel": 14, "rarity": "Rare", "evolutionLevel": 1, "maxEvolutionLevel": 1,
         "stats": {"hitpoints": 1900, "damage": 267, "damagePerSecond": 178, "range": 1.2, "targets": "Ground", "radius": 2}},
        {"name": "Cannon", "level": 12, "maxLevel": 14, "rarity": "Common"},
        {"name": "Ice Spirit", "level": 13, "maxLevel": 14, "rarity": "Common"},
        {"name": "Skeletons", "level": 13, "maxLevel": 14, "rarity": "Common"},
        {"name": "Knight", "level": 13, "maxLevel": 14, "rarity": "Common", "maxEvolutionLevel": 1},
        {"name": "Night Witch", "level": 9, "maxLevel": 14, "rarity": "Legendary"}
    ]"#;

    fn collection() -> Vec<CollectionCard> {
        serde_json::from_str(COLLECTION_JSON).unwrap()
    }

    fn owned_names() -> HashSet<String> {
        collection().iter().map(|c| c.to_candidate().name).collect()
    }

    fn assert_owned_deck(deck: &[String]) {
        assert_eq!(deck.len(), DECK_SIZE);
        let unique: HashSet<&String> = deck.iter().collect();
        assert_eq!(unique.len(), DECK_SIZE, "duplicates in {:?}", deck);
        let owned = owned_names();
        for name in deck {
            assert!(owned.contains(name), "{} not owned", name);
        }
    }

    fn score_of(pool: &[CardCandidate], name: &str) -> f64 {
        pool.iter().find(|c| c.name == name).unwrap().score
    }

    #[test]
    fn test_collection_json_to_recommendation() {
        let cards = collection();
        assert_eq!(cards.len(), 14);
        assert_eq!(cards[9].elixir, None);

        let builder = DeckBuilder::new(Strategy::Balanced).with_synergy(Arc::new(SynergyDatabase::new()));
        let recommendation = builder.build(&cards).unwrap();

        recommendation.validate().unwrap();
        assert_owned_deck(&recommendation.deck);
        assert_eq!(recommendation.strategy, "balanced");
        assert!(recommendation.deck.contains(&"Hog Rider".to_string()));

        assert!(recommendation.evolution_slots.len() <= 2);
        for slot in &recommendation.evolution_slots {
            let detail = recommendation.deck_detail.iter().find(|d| &d.name == slot).unwrap();
            assert!(detail.max_evolution_level > 0);
        }

        let metrics = recommendation.metrics.as_ref().unwrap();
        assert!(metrics.synergy.is_some());
        assert!(!metrics.counter_coverage.is_empty());
        assert!((0.0..=1.0).contains(&metrics.coherence.coherence_score));
        assert!((0.0..=1.0).contains(&metrics.score.final_score));
    }

    #[test]
    fn test_recommendation_json_shape() {
        let recommendation = DeckBuilder::new(Strategy::Cycle).build(&collection()).unwrap();
        let value = serde_json::to_value(&recommendation).unwrap();

        assert!(value["average_elixir"].is_number());
        assert_eq!(value["deck"].as_array().unwrap().len(), DECK_SIZE);
        assert_eq!(value["deck_detail"].as_array().unwrap().len(), DECK_SIZE);
        assert_eq!(value["strategy"], "cycle");
        assert!(value.get("metrics").is_some());
    }

    #[test]
    fn test_every_builder_from_collection() {
        let pool = build_candidates(&collection(), &PoolOptions::default());
        let config = BuilderConfig::new(pool).with_synergy(Arc::new(SynergyDatabase::new()));
        let names: Vec<&str> = StrategyKind::all().iter().map(|k| k.name()).collect();

        let decks = build_multiple(&names, &config);
        assert_eq!(decks.len(), StrategyKind::all().len(), "built: {:?}", decks.keys());
        for deck in decks.values() {
            assert_owned_deck(deck);
        }
    }

    #[test]
    fn test_missing_synergy_skips_graph_builder() {
        let pool = build_candidates(&collection(), &PoolOptions::default());
        let config = BuilderConfig::new(pool);
        let names: Vec<&str> = StrategyKind::all().iter().map(|k| k.name()).collect();

        let decks = build_multiple(&names, &config);
        assert!(!decks.contains_key("synergy_graph"));
        assert_eq!(decks.len(), StrategyKind::all().len() - 1);
    }

    #[test]
    fn test_strategy_rescoring() {
        let strategy = Strategy::parse("  Cycle ").unwrap();
        assert_eq!(strategy, Strategy::Cycle);
        assert!(matches!(Strategy::parse("turtle"), Err(DeckError::InvalidStrategy(_))));

        let balanced = build_candidates(&collection(), &PoolOptions::default());
        let cycle = rescore(&balanced, &PoolOptions::new(strategy));
        assert_eq!(cycle.len(), balanced.len());
        assert!(score_of(&cycle, "Golem") < score_of(&balanced, "Golem"));
    }

    #[test]
    fn test_avoidance_flows_into_builder() {
        let plain = DeckBuilder::new(Strategy::Balanced).candidates(&collection());
        let avoiding = DeckBuilder::new(Strategy::Balanced)
            .with_avoidance(ArchetypeAvoidanceScorer::new(&["BeAtDoWn"]))
            .candidates(&collection());

        assert!((score_of(&plain, "Golem") - score_of(&avoiding, "Golem") - 0.3).abs() < 1e-9);
        assert_eq!(score_of(&plain, "Hog Rider"), score_of(&avoiding, "Hog Rider"));
    }

    #[test]
    fn test_fuzzed_decks_ranked_by_evaluation() {
        let config = FuzzingConfig { count: 30, workers: 3, seed: 7, ..Default::default() };
        let fuzzer = DeckFuzzer::with_synergy(&collection(), config, Arc::new(SynergyDatabase::new())).unwrap();

        let decks = fuzzer.generate_decks_parallel();
        assert_eq!(decks.len(), 30);
        assert_eq!(fuzzer.stats().success, 30);

        let mut evaluated: Vec<_> = decks.iter().map(|d| fuzzer.evaluate(d)).collect();
        evaluated.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
        for result in &evaluated {
            assert_owned_deck(&result.deck);
            assert!((0.0..=1.0).contains(&result.overall_score));
            assert!(result.archetype_free_score >= 0.0);
            assert!(result.avg_elixir > 0.0 && result.avg_elixir <= 10.0);
        }
        assert!(evaluated[0].overall_score >= evaluated[evaluated.len() - 1].overall_score);
    }

    #[test]
    fn test_meta_learning_from_fuzzed_decks() {
        let config = FuzzingConfig { seed: 11, include_cards: vec!["hog".to_string()], ..Default::default() };
        let fuzzer = DeckFuzzer::new(&collection(), config).unwrap();
        let decks = fuzzer.generate_decks(25);
        assert!(decks.iter().all(|d| d.contains(&"Hog Rider".to_string())));

        let mut matrix = CoOccurrenceMatrix::new();
        matrix.learn_from_decks(&decks);
        assert_eq!(matrix.probability("Hog Rider", "Hog Rider"), 0.0);

        let pool = build_candidates(&collection(), &PoolOptions::default());
        let deck = MetaLearningBuilder::with_co_occurrence(BuilderConfig::new(pool), matrix).build().unwrap();
        assert_owned_deck(&deck);
        assert_eq!(deck[0], "Hog Rider");
    }

    #[test]
    fn test_uniqueness_from_fuzzed_popularity() {
        let config = FuzzingConfig { seed: 5, include_cards: vec!["Hog Rider".to_string()], ..Default::default() };
        let decks = DeckFuzzer::new(&collection(), config).unwrap().generate_decks(20);
        assert!(!decks.is_empty());

        let mut popularity = CardPopularity::new();
        popularity.update_from_decks(&decks);
        assert_eq!(popularity.popularity("Hog Rider"), 1.0);

        let scorer = UniquenessScorer::with_popularity(Arc::new(popularity), UniquenessConfig::enabled(0.2));
        assert_eq!(scorer.score_card("Hog Rider"), 0.0);

        let recommendation = DeckBuilder::new(Strategy::Balanced).with_uniqueness(scorer).build(&collection()).unwrap();
        recommendation.validate().unwrap();
        let metrics = recommendation.metrics.unwrap();
        assert!(metrics.uniqueness.is_some());
        assert!((0.0..=1.0).contains(&metrics.redundancy.penalty));
    }

    #[test]
    fn test_exclusions_shrink_pool_below_deck_size() {
        let exclude = ["Hog Rider", "Giant", "Golem", "Fireball", "Log", "Zap", "Musketeer"];
        let err = DeckBuilder::new(Strategy::Balanced).with_exclude(&exclude).build(&collection()).unwrap_err();
        assert!(matches!(err, DeckError::InsufficientCandidates { need: 8, got: 7 }));
        assert!(err.is_recoverable());
    }
}
