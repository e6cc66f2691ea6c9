// Error codes implementation
// Stable codes emitted by the message validator. Codes never change meaning once published;
// callers persist them and feed them back into remediation workflows.

pub mod structure {
    pub const MISSING_DECLARATION: &str = "TISS_S001";
    pub const INVALID_ENCODING: &str = "TISS_S002";
    pub const MISSING_NAMESPACE: &str = "TISS_S003";
    pub const MISSING_ROOT: &str = "TISS_S004";
    pub const MISSING_VERSION: &str = "TISS_S005";
    pub const UNKNOWN_VERSION: &str = "TISS_S006";
    pub const MISSING_TRANSACTION_ID: &str = "TISS_S007";
    pub const MISSING_ORIGIN: &str = "TISS_S008";
    pub const MISSING_DESTINATION: &str = "TISS_S009";
    pub const MISSING_EPILOGUE: &str = "TISS_S010";
    pub const LOT_SIZE_EXCEEDED: &str = "TISS_S011";
}

pub mod rules {
    pub const DIGEST_MISMATCH: &str = "TISS_R001";
    pub const DIGEST_UNVERIFIABLE: &str = "TISS_R002";
    pub const INVALID_REGISTRY_ID: &str = "TISS_R010";
    pub const INVALID_TAX_ID: &str = "TISS_R011";
    pub const INVALID_DIAGNOSIS: &str = "TISS_R012";
    pub const INVALID_PROCEDURE_CODE: &str = "TISS_R013";
    pub const INVALID_OCCUPATION_CODE: &str = "TISS_R014";
    pub const INVALID_STATE: &str = "TISS_R015";
    pub const INVALID_DATE: &str = "TISS_R016";
    pub const INVALID_TIME: &str = "TISS_R017";
    pub const INVALID_LENGTH: &str = "TISS_R018";
    pub const NEGATIVE_VALUE: &str = "TISS_R019";
    pub const INVALID_MONETARY_VALUE: &str = "TISS_R020";
    pub const INCONSISTENT_TOTAL: &str = "TISS_R021";
}

pub mod warnings {
    pub const FUTURE_DATE: &str = "TISS_W001";
    pub const LOOSE_DIAGNOSIS: &str = "TISS_W002";
}
