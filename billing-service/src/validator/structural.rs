use crate::models::MAX_GUIDES_PER_LOT;
use crate::version::ProtocolVersion;
use crate::wire::{guide_elements, ROOT_ELEMENT, TISS_NAMESPACE, VERSION_ELEMENT, WIRE_ENCODING};
use error_common::codes::structure;
use error_common::ValidationIssue;
use integrity_engine::tree::Document;
use integrity_engine::{EPILOGUE_ELEMENT, HASH_ELEMENT};

/// Envelope checks. Each violation yields one issue; nothing here fails hard.
pub(crate) fn check(doc: &Document) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let root = &doc.root;

    match &doc.declaration {
        None => issues.push(ValidationIssue::error(
            structure::MISSING_DECLARATION,
            "XML declaration is missing",
        )),
        Some(decl) => {
            let encoding = decl.encoding.as_deref().unwrap_or("UTF-8");
            if !encoding.eq_ignore_ascii_case(WIRE_ENCODING) {
                issues.push(
                    ValidationIssue::error(
                        structure::INVALID_ENCODING,
                        format!("encoding must be {}, found {}", WIRE_ENCODING, encoding),
                    )
                    .with_field("encoding"),
                );
            }
        }
    }

    if root.local_name != ROOT_ELEMENT {
        issues.push(ValidationIssue::error(
            structure::MISSING_ROOT,
            format!("root element must be {}, found {}", ROOT_ELEMENT, root.name),
        ));
    }

    match root.namespace_for(root.prefix()) {
        Some(ns) if ns == TISS_NAMESPACE => {}
        Some(ns) => issues.push(ValidationIssue::error(
            structure::MISSING_NAMESPACE,
            format!("namespace must be {}, found {}", TISS_NAMESPACE, ns),
        )),
        None => issues.push(ValidationIssue::error(
            structure::MISSING_NAMESPACE,
            format!("namespace {} is not declared", TISS_NAMESPACE),
        )),
    }

    let header = root.child("cabecalho");
    match header.and_then(|h| h.text_of(VERSION_ELEMENT)) {
        None => issues.push(
            ValidationIssue::error(structure::MISSING_VERSION, "version tag is missing")
                .with_field(VERSION_ELEMENT),
        ),
        Some(label) => {
            if label.parse::<ProtocolVersion>().is_err() {
                issues.push(
                    ValidationIssue::error(
                        structure::UNKNOWN_VERSION,
                        format!("unknown protocol version {}", label),
                    )
                    .with_field(VERSION_ELEMENT),
                );
            }
        }
    }

    let sections = [
        ("identificacaoTransacao", structure::MISSING_TRANSACTION_ID),
        ("origem", structure::MISSING_ORIGIN),
        ("destino", structure::MISSING_DESTINATION),
    ];
    for (section, code) in sections {
        if header.and_then(|h| h.child(section)).is_none() {
            issues.push(
                ValidationIssue::error(code, format!("header section {} is missing", section))
                    .with_field(section),
            );
        }
    }

    let has_digest = root
        .child(EPILOGUE_ELEMENT)
        .and_then(|e| e.text_of(HASH_ELEMENT))
        .is_some();
    if !has_digest {
        issues.push(
            ValidationIssue::error(structure::MISSING_EPILOGUE, "epilogue digest is missing")
                .with_field(EPILOGUE_ELEMENT),
        );
    }

    let guide_count: usize = guide_elements().map(|e| root.find_all(e).len()).sum();
    if guide_count > MAX_GUIDES_PER_LOT {
        issues.push(ValidationIssue::error(
            structure::LOT_SIZE_EXCEEDED,
            format!(
                "document holds {} guides, the limit is {}",
                guide_count, MAX_GUIDES_PER_LOT
            ),
        ));
    }

    issues
}
