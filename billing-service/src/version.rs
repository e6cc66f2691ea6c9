//! Supported TISS protocol revisions and what changes between them.

use crate::error::BillingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[allow(clippy::unwrap_used)]
mod patterns {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        pub static ref VERSION_TAG_REGEX: Regex =
            Regex::new(r"<(?:[A-Za-z_][\w.-]*:)?(?:Padrao|padrao|versaoPadrao)>\s*([0-9.]+)\s*<").unwrap();
    }
}

/// TISS standard revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolVersion {
    #[serde(rename = "3.05.00")]
    V3_05_00,
    #[serde(rename = "4.00.01")]
    V4_00_01,
    #[serde(rename = "4.01.00")]
    V4_01_00,
}

/// Major revision family; versions inside a family interoperate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionFamily {
    V3,
    V4,
}

/// Optional wire features, used by the builder and to describe migrations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionFeatures {
    /// `nomeSocialBeneficiario` in the beneficiary block
    pub beneficiary_social_name: bool,
    /// `horaInicial`/`horaFinal` on executed procedure lines
    pub procedure_time_window: bool,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 3] = [
        ProtocolVersion::V3_05_00,
        ProtocolVersion::V4_00_01,
        ProtocolVersion::V4_01_00,
    ];

    /// The revision new documents should be built for
    pub fn current() -> Self {
        ProtocolVersion::V4_01_00
    }

    /// Label carried in the `Padrao` header element
    pub fn label(&self) -> &'static str {
        match self {
            ProtocolVersion::V3_05_00 => "3.05.00",
            ProtocolVersion::V4_00_01 => "4.00.01",
            ProtocolVersion::V4_01_00 => "4.01.00",
        }
    }

    /// XSD file name, also used to recognize the version from `schemaLocation`
    pub fn schema_file(&self) -> &'static str {
        match self {
            ProtocolVersion::V3_05_00 => "tissV3_05_00.xsd",
            ProtocolVersion::V4_00_01 => "tissV4_00_01.xsd",
            ProtocolVersion::V4_01_00 => "tissV4_01_00.xsd",
        }
    }

    pub fn family(&self) -> VersionFamily {
        match self {
            ProtocolVersion::V3_05_00 => VersionFamily::V3,
            ProtocolVersion::V4_00_01 | ProtocolVersion::V4_01_00 => VersionFamily::V4,
        }
    }

    pub fn features(&self) -> VersionFeatures {
        match self.family() {
            VersionFamily::V3 => VersionFeatures {
                beneficiary_social_name: false,
                procedure_time_window: false,
            },
            VersionFamily::V4 => VersionFeatures {
                beneficiary_social_name: true,
                procedure_time_window: true,
            },
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProtocolVersion {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', ".");
        let normalized = normalized.trim_start_matches(['v', 'V']);
        ProtocolVersion::ALL
            .into_iter()
            .find(|v| v.label() == normalized)
            .ok_or_else(|| BillingError::UnsupportedVersion(s.to_string()))
    }
}

/// Two versions interoperate when they are identical or both belong to the 4.x family.
pub fn compatible(a: ProtocolVersion, b: ProtocolVersion) -> bool {
    a == b || (a.family() == VersionFamily::V4 && b.family() == VersionFamily::V4)
}

/// Human-readable migration notes from one version to another.
pub fn differences(from: ProtocolVersion, to: ProtocolVersion) -> Vec<String> {
    if from == to {
        return Vec::new();
    }

    let mut notes = Vec::new();
    if from.family() != to.family() {
        notes.push(format!(
            "schema changes from {} to {}; documents are not interchangeable",
            from.schema_file(),
            to.schema_file()
        ));
    }

    let (a, b) = (from.features(), to.features());
    let toggles = [
        (
            a.beneficiary_social_name,
            b.beneficiary_social_name,
            "nomeSocialBeneficiario in dadosBeneficiario",
        ),
        (
            a.procedure_time_window,
            b.procedure_time_window,
            "horaInicial/horaFinal on procedimentoExecutado",
        ),
    ];
    for (before, after, field) in toggles {
        match (before, after) {
            (false, true) => notes.push(format!("field added: {}", field)),
            (true, false) => notes.push(format!("field removed: {}", field)),
            _ => {}
        }
    }

    if notes.is_empty() {
        notes.push(format!(
            "{} and {} share the same message layout",
            from.label(),
            to.label()
        ));
    }
    notes
}

/// Declared version of a document.
///
/// Reads the `Padrao` header tag first and falls back to a known schema file name anywhere in
/// the text (usually `schemaLocation`). `None` means the version is unknown.
pub fn detect_version(doc: &str) -> Option<ProtocolVersion> {
    if let Some(caps) = patterns::VERSION_TAG_REGEX.captures(doc) {
        if let Some(version) = caps.get(1).and_then(|m| m.as_str().parse().ok()) {
            return Some(version);
        }
    }

    ProtocolVersion::ALL.into_iter().find(|v| {
        let stem = v.schema_file().trim_end_matches(".xsd");
        doc.contains(stem)
    })
}
