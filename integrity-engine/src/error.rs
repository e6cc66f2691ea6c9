use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("Malformed document: {0}")]
    Structure(String),

    #[error("Document has no embedded digest")]
    MissingDigest,

    #[error("Text contains characters outside Latin-1: {}", format_code_points(.0))]
    Encoding(Vec<char>),

    #[error("XML parse error: {0}")]
    Xml(String),
}

fn format_code_points(chars: &[char]) -> String {
    chars
        .iter()
        .map(|c| format!("U+{:04X}", u32::from(*c)))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<quick_xml::Error> for IntegrityError {
    fn from(err: quick_xml::Error) -> Self {
        IntegrityError::Xml(err.to_string())
    }
}

pub type IntegrityResult<T> = Result<T, IntegrityError>;
