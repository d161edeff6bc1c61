use std::sync::Arc;

use anyhow::Result;
use exicodec::{
    Alignment, CodecOptions, DateTime, DateTimeKind, Decimal, Error, Event, Float, Grammar,
    NamePattern, Production, QName, Scanner, Scriber, Value, ValueDomain, decode_events,
    encode_events,
};

const ALIGNMENTS: [Alignment; 4] = [
    Alignment::BitPacked,
    Alignment::ByteAligned,
    Alignment::PreCompression,
    Alignment::Compression,
];

fn schemaless() -> Result<Arc<Grammar>> {
    Ok(Arc::new(Grammar::schemaless()?))
}

fn document(body: Vec<Event>) -> Vec<Event> {
    let mut events = vec![Event::StartDocument, Event::start("root")];
    events.extend(body);
    events.push(Event::EndContainer);
    events.push(Event::EndDocument);
    events
}

fn round_trip(grammar: &Arc<Grammar>, options: CodecOptions, events: &[Event]) -> Result<Vec<Event>> {
    let bytes = encode_events(grammar.clone(), options, events)?;
    Ok(decode_events(grammar.clone(), &bytes)?)
}

/// Grammar for a fixed record: exact names carry typed domains, a namespace
/// wildcard carries strings and anything else must be a float.
fn reading_grammar() -> Result<Arc<Grammar>> {
    let mut builder = Grammar::builder();
    let doc = builder.state("Document");
    let root = builder.state("Root");
    let body = builder.state("Body");
    let end = builder.state("End");

    builder.production(doc, Production::start_document(root));
    builder.production(
        root,
        Production::start_container(NamePattern::exact("reading"), body, end),
    );
    builder.production(
        body,
        Production::value(
            NamePattern::exact("when"),
            ValueDomain::DateTime(DateTimeKind::DateTime),
            body,
        ),
    );
    builder.production(
        body,
        Production::value(NamePattern::exact("temp"), ValueDomain::Decimal, body),
    );
    builder.production(
        body,
        Production::value(
            NamePattern::exact("level"),
            ValueDomain::BoundedInteger { min: -10, width: 5 },
            body,
        ),
    );
    builder.production(
        body,
        Production::value(NamePattern::Namespace("urn:tags".into()), ValueDomain::String, body),
    );
    builder.production(body, Production::value(NamePattern::Any, ValueDomain::Float, body));
    builder.production(body, Production::end_container().in_tier(1));
    builder.production(end, Production::end_document());
    Ok(Arc::new(builder.build()?))
}

fn mixed_body() -> Vec<Event> {
    vec![
        Event::value("n", 42i64),
        Event::value("s", "text"),
        Event::value("s", "text"),
        Event::value("flag", true),
        Event::value("d", Value::Decimal("-12.75".parse::<Decimal>().unwrap())),
        Event::value("f", Value::Float(Float::finite(15, -1).unwrap())),
        Event::value("raw", Value::Binary(vec![0, 1, 2, 255])),
        Event::value("none", Value::Null),
        Event::start_anonymous(),
        Event::anonymous_value(7i64),
        Event::anonymous_value("member"),
        Event::EndContainer,
        Event::start(QName::new("urn:other", "nested")),
        Event::value(QName::new("urn:other", "x"), -3i64),
        Event::EndContainer,
    ]
}

#[test]
fn every_alignment_round_trips() -> Result<()> {
    let grammar = schemaless()?;
    let events = document(mixed_body());
    for alignment in ALIGNMENTS {
        let decoded = round_trip(&grammar, CodecOptions::with_alignment(alignment), &events)?;
        assert_eq!(decoded, events, "alignment {alignment:?}");
    }
    Ok(())
}

#[test]
fn single_value_document_is_deterministic() -> Result<()> {
    let grammar = schemaless()?;
    let events = vec![
        Event::StartDocument,
        Event::start("a"),
        Event::value("number", 42i64),
        Event::EndContainer,
        Event::EndDocument,
    ];
    for alignment in ALIGNMENTS {
        let options = CodecOptions::with_alignment(alignment);
        let first = encode_events(grammar.clone(), options.clone(), &events)?;
        let second = encode_events(grammar.clone(), options, &events)?;
        assert_eq!(first, second);
        assert_eq!(decode_events(grammar.clone(), &first)?, events);
    }
    Ok(())
}

#[test]
fn repeated_string_values_are_shorter() -> Result<()> {
    let grammar = schemaless()?;
    let options = CodecOptions::with_alignment(Alignment::ByteAligned);
    let len = |count: usize| -> Result<usize> {
        let body = vec![Event::value("k", "repeated value"); count];
        Ok(encode_events(grammar.clone(), options.clone(), &document(body))?.len())
    };
    let (none, once, twice) = (len(0)?, len(1)?, len(2)?);
    assert!(twice - once < once - none);
    Ok(())
}

#[test]
fn long_strings_are_not_remembered() -> Result<()> {
    let grammar = schemaless()?;
    let options = CodecOptions {
        value_max_length: Some(4),
        ..CodecOptions::with_alignment(Alignment::ByteAligned)
    };
    let body = vec![Event::value("k", "longer than four"); 2];
    let bytes = encode_events(grammar.clone(), options, &document(body.clone()))?;
    let literal = "longer than four".len();
    assert!(bytes.len() > 2 * literal);
    assert_eq!(decode_events(grammar, &bytes)?, document(body));
    Ok(())
}

#[test]
fn numeric_values_canonicalise() -> Result<()> {
    let grammar = schemaless()?;
    let decimal = |text: &str| Value::Decimal(text.parse::<Decimal>().unwrap());
    let events = document(vec![
        Event::value("a", decimal("0")),
        Event::value("b", decimal("-0.0")),
        Event::value("c", decimal("99.00")),
        Event::value("d", Value::Float(Float::Infinity)),
        Event::value("e", Value::Float(Float::NegativeInfinity)),
        Event::value("f", Value::Float(Float::NaN)),
    ]);
    let decoded = round_trip(&grammar, CodecOptions::default(), &events)?;

    let values: Vec<String> = decoded
        .iter()
        .filter_map(|event| match event {
            Event::Value { value, .. } => Some(value.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(values, ["0", "0", "99", "INF", "-INF", "NaN"]);
    Ok(())
}

#[test]
fn typed_record_round_trips() -> Result<()> {
    let grammar = reading_grammar()?;
    let when = DateTime::parse(DateTimeKind::DateTime, "2004-02-29T23:30:00-01:00")?;
    let events = vec![
        Event::StartDocument,
        Event::start("reading"),
        Event::value("when", Value::DateTime(when.clone())),
        Event::value("temp", "21.50"),
        Event::value("level", 5i64),
        Event::value(QName::new("urn:tags", "site"), "north"),
        Event::value("ratio", Value::Float(Float::finite(25, -2)?)),
        Event::EndContainer,
        Event::EndDocument,
    ];
    for alignment in ALIGNMENTS {
        let decoded = round_trip(&grammar, CodecOptions::with_alignment(alignment), &events)?;
        assert_eq!(decoded[2], events[2]);
        assert_eq!(decoded[3], Event::value("temp", Value::Decimal("21.5".parse::<Decimal>()?)));
        assert_eq!(decoded[4], events[4]);
        assert_eq!(decoded[5], events[5]);
        assert_eq!(decoded.len(), events.len());
    }

    assert_eq!(when.normalize()?.to_string(), "2004-03-01T00:30:00Z");
    Ok(())
}

#[test]
fn out_of_domain_values_fall_back_or_fail() -> Result<()> {
    let grammar = reading_grammar()?;

    // Too large for the bounded integer, but the float wildcard accepts it.
    let events = vec![
        Event::StartDocument,
        Event::start("reading"),
        Event::value("level", 99i64),
        Event::EndContainer,
        Event::EndDocument,
    ];
    let decoded = round_trip(&grammar, CodecOptions::default(), &events)?;
    assert_eq!(decoded[2], Event::value("level", Value::Float(Float::finite(99, 0)?)));

    let mut scriber = Scriber::builder(Vec::new(), grammar).build()?;
    scriber.scribe(&Event::StartDocument)?;
    scriber.scribe(&Event::start("reading"))?;
    let err = scriber.scribe(&Event::value("level", "high")).unwrap_err();
    assert!(matches!(err, Error::ValueDomain { .. }));
    Ok(())
}

#[test]
fn events_outside_the_grammar_are_rejected() -> Result<()> {
    let grammar = reading_grammar()?;
    let mut scriber = Scriber::builder(Vec::new(), grammar).build()?;
    scriber.scribe(&Event::StartDocument)?;
    let err = scriber.scribe(&Event::start("other")).unwrap_err();
    assert!(matches!(err, Error::GrammarMismatch { .. }));
    Ok(())
}

#[test]
fn cookie_and_options_are_read_from_the_header() -> Result<()> {
    let grammar = schemaless()?;
    let events = document(mixed_body());
    let options = CodecOptions {
        include_cookie: true,
        block_size: 3,
        value_partition_capacity: Some(1),
        ..CodecOptions::with_alignment(Alignment::Compression)
    };
    let bytes = encode_events(grammar.clone(), options, &events)?;
    assert!(bytes.starts_with(b"$EXI"));

    let mut scanner = Scanner::builder(bytes.as_slice(), grammar).build()?;
    assert_eq!(scanner.options().block_size, 3);
    assert_eq!(scanner.options().alignment, Alignment::Compression);
    let mut decoded = Vec::new();
    while let Some(event) = scanner.next_event()? {
        decoded.push(event);
    }
    assert_eq!(decoded, events);
    Ok(())
}

#[test]
fn scanning_with_the_wrong_grammar_fails() -> Result<()> {
    let events = document(mixed_body());
    let bytes = encode_events(schemaless()?, CodecOptions::default(), &events)?;
    let result = decode_events(reading_grammar()?, &bytes);
    assert!(result.map_or(true, |decoded| decoded != events));
    Ok(())
}
