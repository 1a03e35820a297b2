//! Criterion benchmarks for lumen-trust hot paths.
//!
//! Covers: rater weights, full score aggregation, and relation reconciliation
//! for a heavily connected account.

use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lumen_core::relation::RelationTables;
use lumen_core::types::{AccountId, Direction, RatingEdge, RelationshipDeclaration};
use lumen_trust::{ConfirmedIndex, Reconciler, WeightCalculator, calculate_scores};

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

fn random_account(rng: &mut StdRng) -> String {
    let body: String = (0..55)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("G{body}")
}

fn population(rng: &mut StdRng, size: usize) -> Vec<String> {
    (0..size).map(|_| random_account(rng)).collect()
}

fn bench_weight(c: &mut Criterion) {
    let weights = WeightCalculator::default();
    c.bench_function("rater_weight", |b| {
        b.iter(|| weights.weight(black_box(250_000.0), black_box(12)))
    });
}

fn bench_calculate_scores(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let accounts = population(&mut rng, 2_000);
    let letters = ["A", "B", "C", "D"];

    let edges: Vec<RatingEdge> = (0..20_000)
        .map(|_| {
            let rater = &accounts[rng.gen_range(0..accounts.len())];
            let ratee = &accounts[rng.gen_range(0..accounts.len())];
            RatingEdge::new(rater.as_str(), ratee.as_str(), letters[rng.gen_range(0..4)])
        })
        .collect();
    let mut portfolios = HashMap::new();
    let mut connections = HashMap::new();
    for raw in &accounts {
        if let Some(id) = AccountId::parse(raw) {
            portfolios.insert(id.clone(), rng.gen_range(0.0..1e7));
            connections.insert(id, rng.gen_range(0..20));
        }
    }
    let weights = WeightCalculator::default();

    c.bench_function("calculate_scores_20k_edges", |b| {
        b.iter(|| {
            calculate_scores(
                black_box(&edges),
                black_box(&portfolios),
                black_box(&connections),
                &weights,
                0,
            )
        })
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let viewer = random_account(&mut rng);
    let others = population(&mut rng, 200);
    let types = ["Employer", "Employee", "Spouse", "Love", "MyPart", "PartOf", "FactionMember"];

    let mut declarations = Vec::new();
    for other in &others {
        let ty = types[rng.gen_range(0..types.len())];
        declarations.push(RelationshipDeclaration::new(
            viewer.as_str(),
            other.as_str(),
            ty,
            Direction::Outgoing,
        ));
        if rng.gen_bool(0.5) {
            let back = types[rng.gen_range(0..types.len())];
            declarations.push(RelationshipDeclaration::new(
                other.as_str(),
                viewer.as_str(),
                back,
                Direction::Incoming,
            ));
        }
    }

    let tables = RelationTables::default();
    let viewer_id = AccountId::parse(&viewer).expect("generated id is valid");
    let confirmed = ConfirmedIndex::derive(&declarations, &tables);
    let reconciler = Reconciler::new(&tables);

    c.bench_function("reconcile_200_counterparts", |b| {
        b.iter(|| reconciler.reconcile(black_box(&viewer_id), &declarations, &confirmed))
    });
}

criterion_group!(benches, bench_weight, bench_calculate_scores, bench_reconcile);
criterion_main!(benches);
