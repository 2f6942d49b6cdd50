use roguequiz_game::map::{allocate_stage_types, edges_cross, fallback_layout, is_valid_layout};
use roguequiz_game::{
    EdgeKind, MapGraphBuilder, MatchType, Question, QuestionPools, Quiz, RngBundle, RunConfig,
    StageMap, StageType,
};

fn sample_pools() -> (Quiz, QuestionPools) {
    let quiz = Quiz::sample().unwrap();
    let pools = QuestionPools::index(&quiz);
    (quiz, pools)
}

/// Whether two planned edges leaving the same round cross each other.
fn planned_edges_cross(map: &StageMap) -> bool {
    let planned: Vec<_> = map
        .edges()
        .iter()
        .filter(|edge| edge.kind == EdgeKind::Planned)
        .collect();
    let x = |id| map.node(id).map_or(0.0, |node| node.position.x);
    let round = |id| map.node(id).map_or(0, |node| node.round);
    planned.iter().any(|a| {
        planned.iter().any(|b| {
            round(a.source) == round(b.source)
                && edges_cross((x(a.source), x(a.target)), (x(b.source), x(b.target)))
        })
    })
}

fn generate(pools: &QuestionPools, cfg: &RunConfig, seed: u64) -> StageMap {
    MapGraphBuilder::new(pools, cfg).generate(&mut RngBundle::from_user_seed(seed))
}

#[test]
fn every_round_count_produces_sound_maps() {
    let (_, pools) = sample_pools();
    for rounds in 3..=12 {
        let cfg = RunConfig::default().with_rounds(rounds);
        for seed in 0..60 {
            let map = generate(&pools, &cfg, seed);
            let layout = map.layout();
            assert_eq!(layout.len(), rounds);
            assert_eq!(layout[0], 1);
            assert_eq!(layout[rounds - 1], 1);
            assert!(is_valid_layout(layout), "{layout:?}");
            assert!(
                map.violations().is_empty(),
                "rounds {rounds} seed {seed}: {:?}",
                map.violations()
            );
        }
    }
}

#[test]
fn first_interior_round_never_holds_elite() {
    let (_, pools) = sample_pools();
    let cfg = RunConfig::default();
    for seed in 0..300 {
        let map = generate(&pools, &cfg, seed);
        for id in &map.rounds()[1] {
            assert_ne!(map.node(*id).unwrap().kind, StageType::Elite, "seed {seed}");
        }
    }
}

#[test]
fn fifteen_node_layout_allocates_fifteen_slots() {
    let (_, pools) = sample_pools();
    let cfg = RunConfig::default();
    let layout = [1, 2, 4, 3, 4, 2, 1];
    let interior: usize = layout[1..layout.len() - 1].iter().sum();
    assert_eq!(interior, 15);
    let counts = allocate_stage_types(interior, 5, &pools, &cfg.stage_mix);
    assert_eq!(counts.total(), 15);

    let mut seen = false;
    for seed in 0..300 {
        let map = generate(&pools, &cfg, seed);
        if map.layout() == layout {
            seen = true;
            assert_eq!(map.interior_nodes().count(), 15);
            assert!(map.interior_nodes().count() <= counts.total());
        }
    }
    assert!(seen, "catalogue layout never drawn in 300 seeds");
}

#[test]
fn stages_carry_questions_of_matching_kind() {
    let (quiz, pools) = sample_pools();
    let cfg = RunConfig::default();
    for seed in 0..100 {
        let map = generate(&pools, &cfg, seed);
        for (id, stage) in map.stages() {
            assert_eq!(stage.stage_type, map.node(id).unwrap().kind);
            assert_eq!(stage.question_indices.len(), stage.stage_type.question_count());
            for &index in &stage.question_indices {
                let scored = quiz.questions[index].kind().is_scored();
                match stage.stage_type {
                    StageType::Normal | StageType::Elite => assert!(scored),
                    StageType::Campfire => assert!(!scored),
                    _ => unreachable!("{} holds questions", stage.stage_type),
                }
            }
        }
    }
}

#[test]
fn normal_questions_do_not_repeat_before_pool_is_used_up() {
    let (_, pools) = sample_pools();
    let cfg = RunConfig::default();
    let scored_pool = pools.scored().len();
    for seed in 0..50 {
        let map = generate(&pools, &cfg, seed);
        let normals: Vec<usize> = map
            .stages()
            .filter(|(_, stage)| stage.stage_type == StageType::Normal)
            .filter_map(|(_, stage)| stage.first_question())
            .collect();
        if normals.len() <= scored_pool {
            let mut unique = normals.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), normals.len(), "seed {seed}");
        }
    }
}

#[test]
fn planned_edges_between_rounds_do_not_cross() {
    let (_, pools) = sample_pools();
    let cfg = RunConfig::default();
    for seed in 0..100 {
        let map = generate(&pools, &cfg, seed);
        assert!(!planned_edges_cross(&map), "seed {seed}");
    }
}

#[test]
fn scored_only_quiz_has_no_campfires() {
    let quiz = Quiz::new(
        "facts",
        (0..6)
            .map(|i| {
                Question::short_answer(
                    format!("q{i}"),
                    format!("a{i}"),
                    MatchType::Exact,
                    Vec::<String>::new(),
                )
            })
            .collect(),
    );
    let pools = QuestionPools::index(&quiz);
    let cfg = RunConfig::default();
    for seed in 0..50 {
        let map = generate(&pools, &cfg, seed);
        assert_eq!(map.count_kind(StageType::Campfire), 0);
        assert!(map.violations().is_empty());
    }
}

#[test]
fn opinion_only_quiz_builds_campfire_map() {
    let quiz = Quiz::new(
        "poll",
        vec![
            Question::opinion("tea or coffee?", ["tea", "coffee"]),
            Question::opinion("cats or dogs?", ["cats", "dogs"]),
        ],
    );
    let pools = QuestionPools::index(&quiz);
    let map = generate(&pools, &RunConfig::default(), 5);
    assert!(map.violations().is_empty());
    assert_eq!(
        map.interior_nodes().count(),
        map.count_kind(StageType::Campfire)
    );
}

#[test]
fn fallback_layout_is_always_valid() {
    for rounds in 2..=30 {
        assert!(is_valid_layout(&fallback_layout(rounds)));
    }
}
