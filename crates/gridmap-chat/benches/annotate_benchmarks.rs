//! Benchmarks for reply annotation and rendering.
//!
//! Every model message is annotated on each render of the assistant panel,
//! so the tokenizer runs once per message per frame. These benchmarks cover
//! typical offline replies, long online replies with citations, and
//! adversarial inputs full of unterminated openers.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use gridmap_chat::annotator::{annotate, reconstruct, render};
use gridmap_core::StationDirectory;

/// Offline-style reply with one station tag and a similar-results line.
fn generate_offline_reply(index: usize) -> String {
    let id = ["w1", "w3", "n1", "s2", "e1"][index % 5];
    format!(
        "ETD Exemplo {} é uma subestação localizada na zona Oeste. \
         Endereço: Rua {}, São Paulo - SP. {{{{STATION_ID:{}}}}}\n\n\
         Resultados semelhantes: ETD Osasco, Base Operacional Osasco, ESD Cotia",
        index, index, id
    )
}

/// Long online-style reply with several tags, bold text and citation links.
fn generate_online_reply(index: usize) -> String {
    let mut reply = String::new();
    for i in 0..10 {
        reply.push_str(&format!(
            "A estação **{}** atende a região {} com folga de carga. \
             Veja {{{{STATION_ID:w{}}}}} para detalhes.\n",
            i,
            index,
            i % 5 + 1
        ));
    }
    reply.push_str("\n\n**Encontrado no Google Maps:**\n");
    for i in 0..5 {
        reply.push_str(&format!(
            "- Local {}: [Ver no Mapa](https://maps.google.com/?cid={})\n",
            i, index
        ));
    }
    reply
}

/// Text full of openers that never close.
fn generate_malformed_reply(index: usize) -> String {
    let mut reply = String::new();
    for i in 0..50 {
        reply.push_str(&format!("{{{{STATION_ID:x{} {} {{{{ ", i, index));
    }
    reply
}

fn bench_annotate(c: &mut Criterion) {
    let offline: Vec<String> = (0..500).map(generate_offline_reply).collect();
    let online: Vec<String> = (0..500).map(generate_online_reply).collect();
    let malformed: Vec<String> = (0..500).map(generate_malformed_reply).collect();

    let mut group = c.benchmark_group("annotate");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("offline_reply", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let segments = annotate(&offline[idx % offline.len()]);
            idx += 1;
            segments
        });
    });

    group.bench_function("online_reply_with_citations", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let segments = annotate(&online[idx % online.len()]);
            idx += 1;
            segments
        });
    });

    group.bench_function("malformed_openers", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let segments = annotate(&malformed[idx % malformed.len()]);
            idx += 1;
            segments
        });
    });

    group.bench_function("annotate_and_reconstruct", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let text = &online[idx % online.len()];
            let rebuilt = reconstruct(&annotate(text));
            idx += 1;
            rebuilt
        });
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let directory = StationDirectory::builtin().expect("bundled directory");
    let segments: Vec<_> = (0..100)
        .map(|i| annotate(&generate_online_reply(i)))
        .collect();

    let mut group = c.benchmark_group("render");
    group.sample_size(100);

    group.bench_function("online_reply", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let nodes = render(&segments[idx % segments.len()], &directory);
            idx += 1;
            nodes
        });
    });

    group.finish();
}

criterion_group!(benches, bench_annotate, bench_render);
criterion_main!(benches);
