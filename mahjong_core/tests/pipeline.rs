use mahjong_scoring::{
    compute_score, reference_catalog, Claim, Group, GroupSearch, GroupingRules,
    IdentifiablePattern, Outcome, PatternCatalog, PlayerSet, PlayerSituation, ScoringError,
    ScoringPolicy, ScoringSystem, Tile,
};
use std::time::{Duration, Instant};

fn hand(codes: &str) -> PlayerSituation {
    PlayerSituation::from_codes(codes).unwrap()
}

fn every_triplet(s: &PlayerSet) -> Vec<Claim> {
    s.sets()
        .filter(|(_, g)| g.is_triplet())
        .map(|(i, _)| Claim::group(i))
        .collect()
}

fn every_chow(s: &PlayerSet) -> Vec<Claim> {
    s.sets()
        .filter(|(_, g)| g.is_chow())
        .map(|(i, _)| Claim::group(i))
        .collect()
}

fn complete(s: &PlayerSet) -> Vec<Claim> {
    if s.is_empty() {
        vec![]
    } else {
        vec![Claim::all(s)]
    }
}

#[test]
fn identical_chows_or_pungs_pick_the_richer_reading() {
    let catalog = PatternCatalog::builder("pungs-pay")
        .pattern(IdentifiablePattern::new("triplet", 3, every_triplet))
        .pattern(IdentifiablePattern::new("chow", 1, every_chow))
        .build()
        .unwrap();
    let system = ScoringSystem::new(catalog, ScoringPolicy::sequential()).unwrap();
    let situation = hand("2m 3m 4m 2m 3m 4m 2m 3m 4m 6s 7s 8s 1p 1p");

    let arranged = system.create_sets_from_situation(&situation);
    assert_eq!(arranged.sets.len(), 2);

    let out = system.score(&situation).unwrap();
    let h = out.hand().unwrap();
    // 222 333 444 + 678: 3 * 3 + 1
    assert_eq!(h.score, 10);
    assert_eq!(
        h.arrangement.groups().iter().filter(|g| g.is_triplet()).count(),
        3
    );
}

#[test]
fn conflicting_patterns_keep_the_higher_value() {
    let catalog = PatternCatalog::builder("ab")
        .pattern(IdentifiablePattern::new("A", 2, complete))
        .pattern(IdentifiablePattern::new("B", 3, complete))
        .exclusive("A", "B")
        .build()
        .unwrap();
    let system = ScoringSystem::new(catalog, ScoringPolicy::sequential()).unwrap();
    let set = system
        .create_sets_from_situation(&hand("5p 5p"))
        .sets
        .remove(0);

    let found = system.identify_patterns(&set).unwrap();
    let groups = system.split_incompatible_patterns(&found).unwrap();
    let names: Vec<Vec<&str>> = groups
        .iter()
        .map(|g| g.iter().map(|p| p.name).collect())
        .collect();
    assert_eq!(names, vec![vec!["B"], vec!["A"]]);
    assert_eq!(system.compute_score(&groups[0]), 3);

    let out = system.score(&hand("5p 5p")).unwrap();
    assert!(out.is_mahjong());
    assert_eq!(out.hand().unwrap().patterns.len(), 1);
    assert_eq!(out.hand().unwrap().patterns[0].name, "B");
}

#[test]
fn every_pattern_lands_in_some_group() {
    let catalog = reference_catalog().unwrap();
    let system = ScoringSystem::new(catalog, ScoringPolicy::sequential()).unwrap();
    let situation = hand("P P P F F F C C C 1s 2s 3s 1s 1s");

    for set in &system.create_sets_from_situation(&situation).sets {
        let found = system.identify_patterns(set).unwrap();
        let groups = system.split_incompatible_patterns(&found).unwrap();
        for p in &found {
            assert!(groups.iter().any(|g| g.contains(p)), "{} missing", p.name);
        }
        let scores: Vec<u32> = groups.iter().map(|g| compute_score(g)).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }
}

#[test]
fn big_three_dragons_scores_once() {
    let system = ScoringSystem::new(reference_catalog().unwrap(), ScoringPolicy::default()).unwrap();
    let out = system
        .score(&hand("P P P F F F C C C 1s 2s 3s 1s 1s"))
        .unwrap();
    let names: Vec<&str> = out.hand().unwrap().patterns.iter().map(|p| p.name).collect();
    assert!(names.contains(&"Big Three Dragons"));
    assert!(!names.contains(&"Dragon Pung"));
    assert!(!names.contains(&"Little Three Dragons"));
}

#[test]
fn branch_and_bound_matches_exhaustive_search() {
    let situations = [
        "1s 2s 3s 1s 2s 3s 1s 2s 3s 7m 8m 9m 5p 5p",
        "2m 3m 4m 2p 3p 4p 2s 3s 4s 2s 3s 4s W W",
        "1p 2p 3p 4p 5p 6p 7p 8p 9p 2p 3p 4p N N",
        "P P P F F F C C 2m 3m 4m 6p 7p 8p",
    ];
    let exhaustive =
        ScoringSystem::new(reference_catalog().unwrap(), ScoringPolicy::sequential()).unwrap();
    let pruned = ScoringSystem::new(
        reference_catalog().unwrap(),
        ScoringPolicy {
            group_search: GroupSearch::BranchAndBound,
            ..ScoringPolicy::sequential()
        },
    )
    .unwrap();

    for codes in situations {
        let situation = hand(codes);
        assert_eq!(
            exhaustive.score(&situation).unwrap(),
            pruned.score(&situation).unwrap(),
            "{}",
            codes
        );
    }
}

fn per_group_flags(s: &PlayerSet) -> Vec<Claim> {
    // several free markers per group, none worth anything
    (0..s.len())
        .flat_map(|i| std::iter::repeat(Claim::group(i)).take(6))
        .collect()
}

#[test]
fn zero_value_patterns_keep_both_searches_fast() {
    let catalog = || {
        PatternCatalog::builder("flags")
            .pattern(IdentifiablePattern::new("flag", 0, per_group_flags))
            .pattern(IdentifiablePattern::new("triplet", 3, every_triplet))
            .pattern(IdentifiablePattern::new("chow", 1, every_chow))
            .build()
            .unwrap()
    };
    let exhaustive = ScoringSystem::new(catalog(), ScoringPolicy::sequential()).unwrap();
    let pruned = ScoringSystem::new(
        catalog(),
        ScoringPolicy {
            group_search: GroupSearch::BranchAndBound,
            ..ScoringPolicy::sequential()
        },
    )
    .unwrap();

    let situation = hand("2m 3m 4m 2m 3m 4m 2m 3m 4m 6s 7s 8s 1p 1p");
    let start = Instant::now();
    let expected = exhaustive.score(&situation).unwrap();
    let found = pruned.score(&situation).unwrap();
    assert!(start.elapsed() < Duration::from_secs(2));

    assert_eq!(found, expected);
    let h = found.hand().unwrap();
    assert_eq!(h.score, 10);
    // 30 flags + 3 triplets + 1 chow
    assert_eq!(h.patterns.len(), 34);
}

#[test]
fn melds_without_a_pair_have_no_arrangement() {
    let t = |c: &str| Tile::from_code(c).unwrap();
    let situation = PlayerSituation::default().with_melds(vec![
        Group::pung(t("E")).exposed(),
        Group::pung(t("C")).exposed(),
    ]);
    let system =
        ScoringSystem::new(reference_catalog().unwrap(), ScoringPolicy::sequential()).unwrap();
    assert_eq!(
        system.score(&situation).unwrap(),
        Outcome::NoArrangement { truncated: false }
    );

    // the same melds completed by a concealed pair are a hand
    let completed = PlayerSituation::from_codes("9p 9p")
        .unwrap()
        .with_melds(situation.melds.clone());
    assert!(system.score(&completed).unwrap().hand().is_some());
}

#[test]
fn exhausted_budget_is_reported() {
    let system = ScoringSystem::new(
        reference_catalog().unwrap(),
        ScoringPolicy {
            grouping: GroupingRules {
                max_branches: 1,
                ..Default::default()
            },
            ..ScoringPolicy::sequential()
        },
    )
    .unwrap();

    let out = system.score(&hand("1m 2m 3m 5p 5p")).unwrap();
    assert_eq!(out, Outcome::NoArrangement { truncated: true });

    // a lone pair never needs a second branch
    let out = system.score(&hand("5p 5p")).unwrap();
    assert!(!out.hand().unwrap().truncated);
}

#[test]
fn concealed_kongs_only_when_allowed() {
    let situation = hand("1m 1m 1m 1m 2m 3m 4m 9s 9s");

    let strict = ScoringSystem::new(reference_catalog().unwrap(), ScoringPolicy::sequential())
        .unwrap();
    assert!(matches!(
        strict.score(&situation),
        Err(ScoringError::Precondition { .. })
    ));

    let lenient = ScoringSystem::new(
        reference_catalog().unwrap(),
        ScoringPolicy {
            grouping: GroupingRules {
                allow_concealed_kongs: true,
                ..Default::default()
            },
            ..ScoringPolicy::sequential()
        },
    )
    .unwrap();
    let out = lenient.score(&situation).unwrap();
    assert!(out.hand().is_some());
}

#[test]
fn too_many_copies_is_a_precondition_error() {
    let system =
        ScoringSystem::new(reference_catalog().unwrap(), ScoringPolicy::sequential()).unwrap();
    let err = system.score(&hand("7p 7p 7p 7p 7p")).unwrap_err();
    assert!(matches!(err, ScoringError::Precondition { .. }));
    assert!(err.to_string().contains("7p"));
}

#[test]
fn out_of_range_claims_are_catalog_errors() {
    fn stray(_: &PlayerSet) -> Vec<Claim> {
        vec![Claim::group(40)]
    }
    let catalog = PatternCatalog::builder("broken")
        .pattern(IdentifiablePattern::new("stray", 1, stray))
        .build()
        .unwrap();
    let system = ScoringSystem::new(catalog, ScoringPolicy::default()).unwrap();
    assert!(matches!(
        system.score(&hand("5p 5p")),
        Err(ScoringError::Catalog { .. })
    ));
}
