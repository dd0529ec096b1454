//! HTTP digest access authentication (RFC 2617 / RFC 7616 subset).
//!
//! Cameras answer the unauthenticated snapshot GET with a `401` carrying a
//! `Digest` challenge; this module parses the challenge and computes the
//! `Authorization` response header for the single authenticated re-request.
//! Supported: MD5 and MD5-sess, `qop=auth` and legacy RFC 2069 (no qop).
//! `auth-int` and SHA-256 variants are not, and surface as errors.

use anyhow::{anyhow, Result};
use md5::{Digest, Md5};
use rand::RngCore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Md5,
    Md5Sess,
}

/// A parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone)]
pub struct DigestChallenge {
    realm: String,
    nonce: String,
    opaque: Option<String>,
    qop_auth: bool,
    algorithm: Algorithm,
}

impl DigestChallenge {
    /// Parses a `WWW-Authenticate` header value.
    pub fn parse(header: &str) -> Result<Self> {
        let rest = header
            .trim_start()
            .strip_prefix("Digest")
            .or_else(|| header.trim_start().strip_prefix("digest"))
            .ok_or_else(|| anyhow!("not a digest challenge: {}", header))?;

        let mut realm = None;
        let mut nonce = None;
        let mut opaque = None;
        let mut qop = None;
        let mut algorithm = Algorithm::Md5;

        for (key, value) in split_params(rest) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "opaque" => opaque = Some(value),
                "qop" => qop = Some(value),
                "algorithm" => {
                    algorithm = match value.to_ascii_uppercase().as_str() {
                        "MD5" => Algorithm::Md5,
                        "MD5-SESS" => Algorithm::Md5Sess,
                        other => return Err(anyhow!("unsupported digest algorithm {}", other)),
                    }
                }
                // stale, domain, charset: irrelevant to a single-shot request
                _ => {}
            }
        }

        let qop_auth = match qop.as_deref() {
            None => false,
            Some(offered) if offered.split(',').any(|q| q.trim() == "auth") => true,
            Some(offered) => {
                return Err(anyhow!("no supported qop in challenge (offered: {})", offered))
            }
        };

        Ok(Self {
            realm: realm.ok_or_else(|| anyhow!("digest challenge missing realm"))?,
            nonce: nonce.ok_or_else(|| anyhow!("digest challenge missing nonce"))?,
            opaque,
            qop_auth,
            algorithm,
        })
    }

    /// Computes the `Authorization` header value for one request, using a
    /// random client nonce.
    pub fn authorize(&self, method: &str, uri: &str, user: &str, password: &str) -> String {
        let mut cnonce_bytes = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut cnonce_bytes);
        self.authorize_with_cnonce(method, uri, user, password, &hex::encode(cnonce_bytes))
    }

    fn authorize_with_cnonce(
        &self,
        method: &str,
        uri: &str,
        user: &str,
        password: &str,
        cnonce: &str,
    ) -> String {
        const NC: &str = "00000001";

        let mut ha1 = md5_hex(format!("{}:{}:{}", user, self.realm, password).as_bytes());
        if self.algorithm == Algorithm::Md5Sess {
            ha1 = md5_hex(format!("{}:{}:{}", ha1, self.nonce, cnonce).as_bytes());
        }
        let ha2 = md5_hex(format!("{}:{}", method, uri).as_bytes());

        let response = if self.qop_auth {
            md5_hex(
                format!("{}:{}:{}:{}:auth:{}", ha1, self.nonce, NC, cnonce, ha2).as_bytes(),
            )
        } else {
            md5_hex(format!("{}:{}:{}", ha1, self.nonce, ha2).as_bytes())
        };

        let mut header = format!(
            r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", response="{}""#,
            user, self.realm, self.nonce, uri, response
        );
        match self.algorithm {
            Algorithm::Md5 => header.push_str(r#", algorithm=MD5"#),
            Algorithm::Md5Sess => header.push_str(r#", algorithm=MD5-sess"#),
        }
        if self.qop_auth {
            header.push_str(&format!(r#", qop=auth, nc={}, cnonce="{}""#, NC, cnonce));
        }
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(r#", opaque="{}""#, opaque));
        }
        header
    }
}

fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Splits `key=value, key="quoted, value"` parameter lists, respecting
/// quotes.
fn split_params(input: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut rest = input;

    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim_matches(|c: char| c.is_whitespace() || c == ',');
        let after = &rest[eq + 1..];

        let (value, consumed) = if let Some(stripped) = after.strip_prefix('"') {
            match stripped.find('"') {
                Some(end) => (&stripped[..end], eq + 2 + end + 1),
                None => (stripped, rest.len()),
            }
        } else {
            let end = after.find(',').unwrap_or(after.len());
            (after[..end].trim(), eq + 1 + end)
        };

        if !key.is_empty() {
            params.push((key.to_string(), value.to_string()));
        }
        rest = &rest[consumed.min(rest.len())..];
    }
    params
}
