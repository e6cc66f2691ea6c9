//! Client certificate loading for mutual TLS
//!
//! The PEM file carries the certificate chain and one private key. The key may be a plain
//! PKCS#8 `PRIVATE KEY` block or a passphrase-protected `ENCRYPTED PRIVATE KEY` block; the
//! latter is decrypted in memory before it reaches the TLS stack.

use crate::config::ClientCertificate;
use crate::error::{InsuranceError, InsuranceResult};
use pem::Pem;
use pkcs8::EncryptedPrivateKeyInfo;
use reqwest::Identity;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

const ENCRYPTED_KEY_TAG: &str = "ENCRYPTED PRIVATE KEY";
const KEY_TAG: &str = "PRIVATE KEY";

fn config_error(message: impl Into<String>) -> InsuranceError {
    InsuranceError::Config(message.into())
}

/// PEM bundle with every encrypted key block replaced by its decrypted PKCS#8 form
pub fn decrypt_bundle(pem_text: &str, passphrase: Option<&SecretString>) -> InsuranceResult<String> {
    let blocks = pem::parse_many(pem_text)
        .map_err(|e| config_error(format!("client certificate is not valid PEM: {}", e)))?;
    if blocks.is_empty() {
        return Err(config_error("client certificate file holds no PEM blocks"));
    }

    let mut decrypted = 0;
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        if block.tag() != ENCRYPTED_KEY_TAG {
            out.push(block);
            continue;
        }
        let passphrase = passphrase.ok_or_else(|| {
            config_error("client key is encrypted but no passphrase is configured")
        })?;
        let info = EncryptedPrivateKeyInfo::try_from(block.contents())
            .map_err(|e| config_error(format!("malformed encrypted client key: {}", e)))?;
        let key = info
            .decrypt(passphrase.expose_secret().as_bytes())
            .map_err(|_| config_error("client key passphrase is wrong or the cipher is unsupported"))?;
        out.push(Pem::new(KEY_TAG, key.as_bytes().to_vec()));
        decrypted += 1;
    }

    if decrypted == 0 && passphrase.is_some() {
        debug!("passphrase configured but the client key is not encrypted");
    }
    Ok(pem::encode_many(&out))
}

/// TLS identity for `certificate`
pub fn load_identity(certificate: &ClientCertificate) -> InsuranceResult<Identity> {
    let pem_text = std::fs::read_to_string(&certificate.pem_path).map_err(|e| {
        config_error(format!(
            "cannot read client certificate {}: {}",
            certificate.pem_path.display(),
            e
        ))
    })?;
    let bundle = decrypt_bundle(&pem_text, certificate.passphrase.as_ref())?;
    Identity::from_pem(bundle.as_bytes())
        .map_err(|e| config_error(format!("invalid client certificate: {}", e)))
}
