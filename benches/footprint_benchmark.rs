use criterion::{criterion_group, criterion_main, Criterion};
use ecotrack::models::footprint::{
    EnergyAnswers, FoodAnswers, FootprintAnswers, TransportAnswers, WasteAnswers,
};
use ecotrack::services::footprint::{parse_answers, score};
use std::collections::HashMap;
use std::hint::black_box;

fn sample_answers() -> FootprintAnswers {
    FootprintAnswers {
        transport: TransportAnswers {
            car_miles: 150.0,
            flight_hours: 10.0,
            public_transport: 5.0,
        },
        energy: EnergyAnswers {
            electricity: 300.0,
            heating: 80.0,
            renewable: false,
        },
        food: FoodAnswers {
            meat: 4.0,
            local: 60.0,
            organic: false,
        },
        waste: WasteAnswers {
            recycling: 70.0,
            composting: false,
            plastic: 3.0,
        },
    }
}

fn sample_form() -> HashMap<String, String> {
    [
        ("carMiles", "150"),
        ("flightHours", "10"),
        ("publicTransport", "5"),
        ("electricity", "300"),
        ("heating", "80"),
        ("renewable", "no"),
        ("meat", "4"),
        ("local", "60"),
        ("organic", "no"),
        ("recycling", "70"),
        ("composting", "no"),
        ("plastic", "3"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn benchmark_footprint(c: &mut Criterion) {
    let answers = sample_answers();
    let form = sample_form();

    let mut group = c.benchmark_group("footprint");

    group.bench_function("score", |b| b.iter(|| score(black_box(&answers))));

    group.bench_function("parse_and_score_form", |b| {
        b.iter(|| parse_answers(black_box(&form)).map(|a| score(&a)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_footprint);
criterion_main!(benches);
