use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use sha2::{Digest, Sha256};

#[allow(clippy::unwrap_used)]
mod patterns {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        // CNS: national health card, 15 digits
        pub static ref HEALTH_CARD_REGEX: Regex = Regex::new(r"\b\d{15}\b").unwrap();
        pub static ref CNPJ_REGEX: Regex =
            Regex::new(r"\b(?:\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}|\d{14})\b").unwrap();
        pub static ref CPF_REGEX: Regex =
            Regex::new(r"\b(?:\d{3}\.\d{3}\.\d{3}-\d{2}|\d{11})\b").unwrap();
        // Element bodies that identify a person or carry credentials
        pub static ref WIRE_FIELD_REGEX: Regex = Regex::new(
            r"(<(?:[A-Za-z_][\w.-]*:)?(?:numeroCarteira|loginPrestador|senhaPrestador|nomeBeneficiario|nomeSocialBeneficiario)>)([^<]+)(</)"
        )
        .unwrap();
    }
}

use patterns::{CNPJ_REGEX, CPF_REGEX, HEALTH_CARD_REGEX, WIRE_FIELD_REGEX};

/// Redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_tax_ids: bool,
    pub redact_health_cards: bool,
    pub redact_wire_fields: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_tax_ids: true,
            redact_health_cards: true,
            redact_wire_fields: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

impl RedactionConfig {
    /// Every rule switched off
    pub fn none() -> Self {
        Self {
            redact_tax_ids: false,
            redact_health_cards: false,
            redact_wire_fields: false,
            hash_for_correlation: false,
            custom_patterns: Vec::new(),
        }
    }
}

/// Redactor for payloads and log messages
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    /// A redactor that returns its input untouched
    pub fn disabled() -> Self {
        Self::new(RedactionConfig::none())
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_wire_fields {
            result = self.redact_wire_fields(&result);
        }

        if self.config.redact_health_cards {
            result = self.redact_with(&HEALTH_CARD_REGEX, "CNS", "***************", &result);
        }

        if self.config.redact_tax_ids {
            result = self.redact_with(&CNPJ_REGEX, "CNPJ", "**.***.***/****-**", &result);
            result = self.redact_with(&CPF_REGEX, "CPF", "***.***.***-**", &result);
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    fn redact_wire_fields(&self, text: &str) -> String {
        WIRE_FIELD_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let masked = if self.config.hash_for_correlation {
                    format!("[{}]", self.hash_value(&caps[2]))
                } else {
                    "[REDACTED]".to_string()
                };
                format!("{}{}{}", &caps[1], masked, &caps[3])
            })
            .to_string()
    }

    fn redact_with(&self, pattern: &Regex, label: &str, mask: &str, text: &str) -> String {
        pattern
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("{}[{}]", label, self.hash_value(&caps[0]))
                } else {
                    mask.to_string()
                }
            })
            .to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        general_purpose::STANDARD.encode(&result[..8]) // Use first 8 bytes for shorter hash
    }
}

impl Default for PiiRedactor {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masking_redactor() -> PiiRedactor {
        PiiRedactor::new(RedactionConfig {
            hash_for_correlation: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_tax_id_redaction() {
        let redactor = masking_redactor();

        let text = "prestador 12.345.678/0001-90 profissional 123.456.789-09";
        let redacted = redactor.redact(text);
        assert!(redacted.contains("**.***.***/****-**"));
        assert!(redacted.contains("***.***.***-**"));
        assert!(!redacted.contains("12.345.678"));
    }

    #[test]
    fn test_bare_cnpj_is_not_split_into_cpf() {
        let redactor = masking_redactor();
        let redacted = redactor.redact("cnpj=12345678000190");
        assert_eq!(redacted, "cnpj=**.***.***/****-**");
    }

    #[test]
    fn test_wire_fields_redaction() {
        let redactor = masking_redactor();

        let xml = "<ans:loginPrestador>clinica</ans:loginPrestador>\
                   <ans:senhaPrestador>s3cr3t</ans:senhaPrestador>\
                   <ans:numeroCarteira>0012345</ans:numeroCarteira>\
                   <ans:codigoProcedimento>10101012</ans:codigoProcedimento>";
        let redacted = redactor.redact(xml);
        assert!(!redacted.contains("s3cr3t"));
        assert!(!redacted.contains("clinica"));
        assert!(!redacted.contains("0012345"));
        assert!(redacted.contains("<ans:senhaPrestador>[REDACTED]</ans:senhaPrestador>"));
        // procedure codes are not personal data
        assert!(redacted.contains("10101012"));
    }

    #[test]
    fn test_hash_is_stable_for_correlation() {
        let redactor = PiiRedactor::default();
        let a = redactor.redact("<numeroCarteira>999</numeroCarteira>");
        let b = redactor.redact("<numeroCarteira>999</numeroCarteira>");
        assert_eq!(a, b);
        assert!(!a.contains(">999<"));
    }

    #[test]
    fn test_disabled_redactor_is_identity() {
        let text = "<ans:senhaPrestador>s3cr3t</ans:senhaPrestador> 12345678000190";
        assert_eq!(PiiRedactor::disabled().redact(text), text);
    }
}
