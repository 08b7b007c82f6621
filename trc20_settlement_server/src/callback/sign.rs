use std::fmt::Write;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs a set of payload fields with the merchant's shared secret.
///
/// The canonical form is deterministic: fields are sorted by key, empty values and any `signature` field are
/// dropped, and the rest are joined as `k=v&k=v`. The signature is the lowercase hex HMAC-SHA256 of that string.
/// Merchants recompute it the same way to authenticate the notification.
pub fn sign_fields(fields: &[(&str, String)], secret: &str) -> String {
    let mut fields = fields
        .iter()
        .filter(|(k, v)| *k != "signature" && !v.is_empty())
        .map(|(k, v)| (*k, v.as_str()))
        .collect::<Vec<_>>();
    fields.sort_by_key(|(k, _)| *k);
    let canonical = fields.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    // HMAC accepts keys of any length, so this never fails
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    let digest = mac.finalize().into_bytes();
    digest.iter().fold(String::with_capacity(64), |mut hex, b| {
        let _ = write!(hex, "{b:02x}");
        hex
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn signature_is_deterministic_and_order_independent() {
        let secret = "hunter2";
        let a = sign_fields(&[("trade_id", "T-1".into()), ("amount", "10.0000".into())], secret);
        let b = sign_fields(&[("amount", "10.0000".into()), ("trade_id", "T-1".into())], secret);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn empty_values_and_the_signature_field_are_excluded() {
        let secret = "hunter2";
        let base = sign_fields(&[("trade_id", "T-1".into())], secret);
        let with_noise = sign_fields(
            &[
                ("trade_id", "T-1".into()),
                ("block_transaction_id", String::new()),
                ("signature", "deadbeef".into()),
            ],
            secret,
        );
        assert_eq!(base, with_noise);
    }

    #[test]
    fn different_secrets_produce_different_signatures() {
        let fields = [("trade_id", "T-1".to_string())];
        assert_ne!(sign_fields(&fields, "secret-a"), sign_fields(&fields, "secret-b"));
    }

    #[test]
    fn different_payloads_produce_different_signatures() {
        let secret = "hunter2";
        let a = sign_fields(&[("amount", "10.0000".into())], secret);
        let b = sign_fields(&[("amount", "10.0001".into())], secret);
        assert_ne!(a, b);
    }
}
