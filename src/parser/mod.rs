pub mod literal;
pub mod record;
pub mod scripts;

use tracing::{debug, warn};

use crate::error::RecordParseFailure;
use literal::Scanned;
pub use record::RawRecord;

/// Records pulled out of one page, plus the literals that were skipped.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<RawRecord>,
    pub failures: Vec<RecordParseFailure>,
}

/// Two passes: HTML → inline script texts → embedded `json<N>` objects.
pub fn extract_records(html: &str) -> Extraction {
    let mut out = Extraction::default();
    let scripts = scripts::inline_scripts(html);
    debug!("Scanning {} inline scripts", scripts.len());

    for script in &scripts {
        for scanned in literal::object_literals(script) {
            let parsed = match scanned {
                Scanned::Object(text) => RawRecord::parse(text),
                Scanned::Unterminated(text) => Err(RecordParseFailure {
                    error: "object literal is not closed by `};`".into(),
                    text: text.to_string(),
                }),
            };
            match parsed {
                Ok(record) => out.records.push(record),
                Err(failure) => {
                    warn!("Failed to parse JSON: {}", failure.error);
                    warn!("JSON string: {}", failure.text);
                    out.failures.push(failure);
                }
            }
        }
    }

    out
}
