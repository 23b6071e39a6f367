use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use rewards_claims::{ClaimEngine, FixedRound, RewardPolicy};
use rewards_nullables::{NullClaimStore, NullClock};
use rewards_types::{ParticipantId, Rank, RoundId, Score, UserId};

fn bench_policy_amount(c: &mut Criterion) {
    let mut group = c.benchmark_group("reward_policy");
    let policy = RewardPolicy::default();
    let score = Score::from_points(12_345);

    for position in [1u32, 50, 150, 500] {
        let rank = Rank::new(position).unwrap();
        group.bench_with_input(BenchmarkId::new("usd_amount", position), &rank, |b, rank| {
            b.iter(|| black_box(policy.usd_amount(black_box(score), black_box(*rank))));
        });
    }

    group.finish();
}

fn bench_check_eligibility(c: &mut Criterion) {
    let engine = ClaimEngine::new(
        Arc::new(NullClaimStore::new()),
        NullClock::new(0),
        FixedRound::new(RoundId::new("round-1").unwrap()),
        RewardPolicy::default(),
    );
    let user = UserId::new("alice").unwrap();
    let participant = ParticipantId::new("talent-1").unwrap();
    let rank = Some(Rank::new(42).unwrap());

    c.bench_function("check_eligibility_in_memory", |b| {
        b.iter(|| {
            black_box(
                engine
                    .check_eligibility(&user, &participant, black_box(Score::from_points(900)), rank)
                    .unwrap(),
            )
        });
    });
}

criterion_group!(benches, bench_policy_amount, bench_check_eligibility);
criterion_main!(benches);
