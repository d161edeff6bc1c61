use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use exicodec::{Alignment, Event, Grammar, QName, Scriber, Value};

const RECORD_COUNT: usize = 2_000;

fn sample_events() -> Vec<Event> {
    let mut events = vec![Event::StartDocument, Event::start("log")];
    for idx in 0..RECORD_COUNT {
        events.push(Event::start("entry"));
        events.push(Event::value("id", idx as i64));
        events.push(Event::value("level", if idx % 5 == 0 { "warn" } else { "info" }));
        events.push(Event::value(QName::new("urn:host", "host"), format!("node-{}", idx % 8)));
        events.push(Event::value("ok", idx % 3 != 0));
        events.push(Event::value("payload", Value::Binary(vec![(idx % 251) as u8; 16])));
        events.push(Event::EndContainer);
    }
    events.push(Event::EndContainer);
    events.push(Event::EndDocument);
    events
}

fn bench_scriber(c: &mut Criterion) {
    let grammar = Arc::new(Grammar::schemaless().expect("schemaless grammar"));
    let events = sample_events();

    let mut alignments = vec![
        ("bit-packed", Alignment::BitPacked),
        ("byte-aligned", Alignment::ByteAligned),
        ("pre-compression", Alignment::PreCompression),
    ];
    #[cfg(feature = "deflate")]
    {
        alignments.push(("compression", Alignment::Compression));
    }

    let mut group = c.benchmark_group("scriber_encode");
    for (label, alignment) in alignments {
        group.bench_with_input(BenchmarkId::from_parameter(label), &alignment, |b, &alignment| {
            b.iter(|| {
                let mut scriber = Scriber::builder(Vec::new(), grammar.clone())
                    .alignment(alignment)
                    .block_size(1_000)
                    .build()
                    .unwrap();
                scriber.scribe_all(&events).unwrap();
                std::hint::black_box(scriber.finish().unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scriber);
criterion_main!(benches);
