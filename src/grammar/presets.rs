use crate::error::Result;
use crate::grammar::{Grammar, NamePattern, Production};
use crate::types::{DateTimeKind, ValueDomain};

/// Typed domains tried, in order, after the string domain of the schemaless grammar.
const TYPED_DOMAINS: [ValueDomain; 14] = [
    ValueDomain::Boolean,
    ValueDomain::Integer,
    ValueDomain::Decimal,
    ValueDomain::Float,
    ValueDomain::Binary,
    ValueDomain::Null,
    ValueDomain::DateTime(DateTimeKind::DateTime),
    ValueDomain::DateTime(DateTimeKind::Time),
    ValueDomain::DateTime(DateTimeKind::Date),
    ValueDomain::DateTime(DateTimeKind::GYearMonth),
    ValueDomain::DateTime(DateTimeKind::GYear),
    ValueDomain::DateTime(DateTimeKind::GMonthDay),
    ValueDomain::DateTime(DateTimeKind::GDay),
    ValueDomain::DateTime(DateTimeKind::GMonth),
];

impl Grammar {
    /// Grammar accepting any well-nested document of named or anonymous containers
    /// and values.
    ///
    /// Names are written through wildcards and learned as the stream goes. String
    /// values use the first tier; other typed values fall back to the second tier,
    /// one production per domain and per date/time kind.
    pub fn schemaless() -> Result<Grammar> {
        let mut builder = Grammar::builder();
        let document = builder.state("Document");
        let root = builder.state("DocumentContent");
        let end = builder.state("DocumentEnd");
        let content = builder.state("Content");

        builder.production(document, Production::start_document(root));
        for pattern in [NamePattern::Any, NamePattern::Anonymous] {
            builder.production(root, Production::start_container(pattern, content, end));
        }
        builder.production(end, Production::end_document());

        builder.production(content, Production::end_container());
        for pattern in [NamePattern::Any, NamePattern::Anonymous] {
            builder.production(
                content,
                Production::start_container(pattern.clone(), content, content),
            );
            builder.production(
                content,
                Production::value(pattern, ValueDomain::String, content),
            );
        }
        for domain in TYPED_DOMAINS {
            for pattern in [NamePattern::Any, NamePattern::Anonymous] {
                builder.production(content, Production::value(pattern, domain, content).in_tier(1));
            }
        }

        builder.build()
    }
}
