use sbva::{dimacs, Config, Formula, Lit, Tiebreak};

fn build(num_vars: u32, clauses: &[&[i32]], opts: Config) -> Formula {
    let mut f = Formula::new(opts);
    f.init_cnf(num_vars);
    for c in clauses {
        f.add_cl(c);
    }
    f.finish_cnf();
    f
}

fn parse(input: &str, opts: Config) -> Formula {
    let mut f = Formula::new(opts);
    dimacs::parse(&mut input.as_bytes(), &mut f).expect("parse failed");
    f
}

fn proved_config() -> Config {
    Config {
        generate_proof: true,
        ..Config::default()
    }
}

fn cnf_string(f: &Formula) -> String {
    let mut out = Vec::new();
    f.to_cnf(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn live_clauses(f: &Formula) -> Vec<Vec<i32>> {
    f.clauses()
        .filter(|c| !c.deleted)
        .map(|c| c.lits.iter().map(|l| l.to_dimacs()).collect())
        .collect()
}

/// Invariants that must hold at every quiescent point: exact effective
/// counts, strictly ascending duplicate-free literal vectors.
fn check_invariants(f: &Formula) {
    for v in 1..=f.num_vars() as i32 {
        for &l in &[v, -v] {
            let lit = Lit::from_dimacs(l);
            let live = f
                .clauses()
                .filter(|c| !c.deleted && c.lits.contains(&lit))
                .count();
            assert_eq!(
                f.effective_count(lit) as usize,
                live,
                "effective_count drifted for literal {}",
                l
            );
            assert_eq!(f.iter_live(lit).count(), live);
        }
    }
    for c in f.clauses() {
        let lits: Vec<i32> = c.lits.iter().map(|l| l.to_dimacs()).collect();
        assert!(
            lits.windows(2).all(|w| w[0] < w[1]),
            "clause not strictly ascending: {:?}",
            lits
        );
    }
}

/// Replay the DRAT trail against the pre-run clauses and compare the
/// resulting multiset with the formula's live clauses.
fn check_proof_replay(before: &[Vec<i32>], f: &Formula) {
    use std::collections::HashMap;
    let mut state: HashMap<Vec<i32>, i64> = HashMap::new();
    for c in before {
        *state.entry(c.clone()).or_insert(0) += 1;
    }
    for step in f.proof().steps() {
        let mut lits = step.lits.to_vec();
        lits.sort_unstable();
        if step.is_delete {
            let n = state.entry(lits.clone()).or_insert(0);
            assert!(*n > 0, "proof deletes a clause not in the formula: {:?}", lits);
            *n -= 1;
        } else {
            *state.entry(lits).or_insert(0) += 1;
        }
    }
    let mut replayed: Vec<Vec<i32>> = state
        .into_iter()
        .flat_map(|(c, n)| std::iter::repeat(c).take(n as usize))
        .collect();
    let mut live: Vec<Vec<i32>> = live_clauses(f)
        .into_iter()
        .map(|mut c| {
            c.sort_unstable();
            c
        })
        .collect();
    replayed.sort();
    live.sort();
    assert_eq!(replayed, live, "proof replay does not reach the emitted CNF");
}

/// Exhaustive model count; fine for the small formulas used here.
fn count_models(num_vars: u32, clauses: &[Vec<i32>]) -> u64 {
    assert!(num_vars <= 20);
    let mut count = 0;
    for m in 0u64..(1 << num_vars) {
        let sat = clauses.iter().all(|c| {
            c.iter().any(|&l| {
                let assigned = (m >> (l.abs() - 1)) & 1 == 1;
                if l > 0 {
                    assigned
                } else {
                    !assigned
                }
            })
        });
        if sat {
            count += 1;
        }
    }
    count
}

fn satisfiable(f: &Formula) -> bool {
    count_models(f.num_vars(), &live_clauses(f)) > 0
}

// S1: no tile is worth a fresh variable; the formula passes through.
#[test]
fn trivial_passthrough() {
    let mut f = parse("p cnf 2 2\n1 2 0\n-1 2 0\n", proved_config());
    f.run(Tiebreak::ThreeHop);
    assert_eq!(cnf_string(&f), "p cnf 2 2\n1 2 0\n-1 2 0\n");
    assert!(f.proof().is_empty());
    assert_eq!(f.num_replacements(), 0);
    check_invariants(&f);
}

// S2: the canonical 2x2 tile collapses through one fresh variable.
#[test]
fn canonical_2x2_tile() {
    let mut f = parse("p cnf 4 4\n1 3 0\n1 4 0\n2 3 0\n2 4 0\n", proved_config());
    let before = live_clauses(&f);
    f.run(Tiebreak::ThreeHop);

    assert_eq!(f.num_replacements(), 1);
    assert_eq!(f.num_vars(), 5);
    let mut live = live_clauses(&f);
    live.sort();
    let mut expected = vec![vec![1, 5], vec![2, 5], vec![-5, 3], vec![-5, 4]];
    expected.sort();
    assert_eq!(live, expected);
    assert_eq!(f.num_clauses() - f.num_live_clauses(), 4); // the whole tile
    check_invariants(&f);
    check_proof_replay(&before, &f);
}

// S2 continued: satisfiability is preserved; with the blocking clause the
// model count is preserved exactly.
#[test]
fn tile_2x2_preserves_semantics() {
    let input = "p cnf 4 4\n1 3 0\n1 4 0\n2 3 0\n2 4 0\n";

    let original = parse(input, Config::default());
    let models_before = count_models(4, &live_clauses(&original));
    assert_eq!(models_before, 7);

    let mut plain = parse(input, Config::default());
    plain.run(Tiebreak::ThreeHop);
    assert_eq!(satisfiable(&plain), models_before > 0);

    let mut exact = parse(
        input,
        Config {
            preserve_model_cnt: true,
            ..proved_config()
        },
    );
    let before = live_clauses(&exact);
    exact.run(Tiebreak::ThreeHop);
    assert_eq!(exact.num_live_clauses(), 5); // 4 bridges + 1 blocking clause
    assert_eq!(count_models(exact.num_vars(), &live_clauses(&exact)), models_before);
    check_invariants(&exact);
    check_proof_replay(&before, &exact);
}

// S3: a 3x3 tile, nine binary clauses from (A v B v C) x (D v E v F).
#[test]
fn tile_3x3() {
    let clauses: Vec<Vec<i32>> = (1..=3)
        .flat_map(|a| (4..=6).map(move |d| vec![a, d]))
        .collect();
    let refs: Vec<&[i32]> = clauses.iter().map(|c| c.as_slice()).collect();
    let mut f = build(6, &refs, proved_config());
    let before = live_clauses(&f);
    let models_before = count_models(6, &before);
    f.run(Tiebreak::ThreeHop);

    assert_eq!(f.num_replacements(), 1);
    assert_eq!(f.num_vars(), 7);
    // reduction(3, 3) = 3: nine tile clauses deleted, six added
    assert_eq!(f.num_clauses(), 9 + 6);
    assert_eq!(f.num_live_clauses(), 6);
    let mut live = live_clauses(&f);
    live.sort();
    let mut expected = vec![
        vec![1, 7],
        vec![2, 7],
        vec![3, 7],
        vec![-7, 4],
        vec![-7, 5],
        vec![-7, 6],
    ];
    expected.sort();
    assert_eq!(live, expected);
    assert_eq!(satisfiable(&f), models_before > 0);
    check_invariants(&f);
    check_proof_replay(&before, &f);
}

// S4: identical clauses are tombstoned at ingest, in both ingest modes.
#[test]
fn duplicate_at_ingest() {
    let f = parse("p cnf 2 2\n1 2 0\n2 1 0\n", Config::default());
    assert_eq!(f.num_clauses(), 2);
    assert_eq!(f.num_live_clauses(), 1);
    check_invariants(&f);

    let g = build(2, &[&[1, 2], &[2, 1]], Config::default());
    assert_eq!(g.num_live_clauses(), 1);
    assert_eq!(g.get_cnf(), f.get_cnf());
}

/// Deterministic xorshift, used to generate a reproducible random CNF.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

fn random_cnf(num_vars: u32, num_clauses: usize, seed: u64) -> Vec<Vec<i32>> {
    let mut rng = XorShift(seed);
    let mut clauses = Vec::with_capacity(num_clauses);
    for _ in 0..num_clauses {
        let mut cl = Vec::with_capacity(3);
        while cl.len() < 3 {
            let v = (rng.next() % num_vars as u64) as i32 + 1;
            if cl.iter().any(|&l: &i32| l.abs() == v) {
                continue;
            }
            cl.push(if rng.next() & 1 == 1 { v } else { -v });
        }
        clauses.push(cl);
    }
    clauses
}

// S5: an exhausted budget stops the engine cleanly; whatever was rewritten
// so far is coherent and the proof still replays.
#[test]
fn budget_exhaustion() {
    let clauses = random_cnf(14, 60, 0x9E3779B97F4A7C15);
    let refs: Vec<&[i32]> = clauses.iter().map(|c| c.as_slice()).collect();

    for &steps in &[100i64, 5_000] {
        let opts = Config {
            steps,
            ..proved_config()
        };
        let mut f = build(14, &refs, opts);
        let before = live_clauses(&f);
        let sat_before = count_models(14, &before) > 0;
        f.run(Tiebreak::ThreeHop);
        check_invariants(&f);
        check_proof_replay(&before, &f);
        if f.num_vars() <= 20 {
            assert_eq!(satisfiable(&f), sat_before);
        }
    }
}

// S6: a crafted tie broken differently by the two modes. Variable 1 seeds a
// tile whose first extension is a tie between variables 2 and 3; the extra
// ternary clauses make variable 3 the heavier three-hop neighbor of 1
// without ever matching the tile themselves.
#[test]
fn tiebreak_modes_diverge() {
    let clauses: &[&[i32]] = &[
        &[1, 8],
        &[1, 9],
        &[2, 8],
        &[2, 9],
        &[3, 8],
        &[3, 9],
        &[1, 10, 11],
        &[3, 10, 12],
    ];

    let run_mode = |mode: Tiebreak| {
        let mut f = build(12, clauses, proved_config());
        f.run(mode);
        check_invariants(&f);
        let mut proof = Vec::new();
        f.to_proof(&mut proof).unwrap();
        (cnf_string(&f), String::from_utf8(proof).unwrap())
    };

    let (cnf_none, proof_none) = run_mode(Tiebreak::None);
    let (cnf_hop, proof_hop) = run_mode(Tiebreak::ThreeHop);

    // each mode is deterministic across reruns...
    assert_eq!(run_mode(Tiebreak::None), (cnf_none.clone(), proof_none));
    assert_eq!(run_mode(Tiebreak::ThreeHop), (cnf_hop.clone(), proof_hop));
    // ...and the two modes disagree
    assert_ne!(cnf_none, cnf_hop);

    // same clauses either way, substituted in a different order
    let sorted = |s: &str| {
        let mut lines: Vec<&str> = s.lines().skip(1).collect();
        lines.sort();
        lines.join("\n")
    };
    assert_eq!(sorted(&cnf_none), sorted(&cnf_hop));
}

// The two ingest front-ends share one admission path and agree exactly.
#[test]
fn ingest_modes_agree() {
    let input = "p cnf 6 4\nc a comment\n1 5 -3 0\n2 -4 0\n1 5 -3 0\n6 0\n";
    let parsed = parse(input, Config::default());
    let built = build(
        6,
        &[&[1, 5, -3], &[2, -4], &[1, 5, -3], &[6]],
        Config::default(),
    );
    assert_eq!(parsed.get_cnf(), built.get_cnf());
    assert_eq!(parsed.num_clauses(), built.num_clauses());
}

// A capped run stops after exactly the requested number of substitutions.
#[test]
fn replacement_cap() {
    // two independent 2x2 tiles
    let clauses: &[&[i32]] = &[
        &[1, 3],
        &[1, 4],
        &[2, 3],
        &[2, 4],
        &[5, 7],
        &[5, 8],
        &[6, 7],
        &[6, 8],
    ];
    let opts = Config {
        max_replacements: 1,
        ..proved_config()
    };
    let mut f = build(8, clauses, opts);
    let before = live_clauses(&f);
    f.run(Tiebreak::ThreeHop);
    assert_eq!(f.num_replacements(), 1);
    assert_eq!(f.num_vars(), 9);
    check_invariants(&f);
    check_proof_replay(&before, &f);

    let mut unbounded = build(8, clauses, proved_config());
    unbounded.run(Tiebreak::ThreeHop);
    assert_eq!(unbounded.num_replacements(), 2);
    assert_eq!(unbounded.num_vars(), 10);
    check_invariants(&unbounded);
}

// Proof lines put the fresh variable first on additions and prefix
// deletions with `d`.
#[test]
fn proof_pivot_order() {
    let mut f = parse("p cnf 4 4\n1 3 0\n1 4 0\n2 3 0\n2 4 0\n", proved_config());
    f.run(Tiebreak::ThreeHop);

    let steps: Vec<_> = f.proof().steps().collect();
    assert_eq!(steps.len(), 8); // 4 additions, then 4 deletions
    for step in &steps[..4] {
        assert!(!step.is_delete);
        assert_eq!(step.lits[0].abs(), 5, "pivot literal must come first");
    }
    for step in &steps[4..] {
        assert!(step.is_delete);
    }

    let mut out = Vec::new();
    f.to_proof(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 8);
    assert!(text.lines().all(|l| l.ends_with(" 0")));
    assert_eq!(text.lines().filter(|l| l.starts_with("d ")).count(), 4);
}
