//! RFC 6979 deterministic nonce generation with HMAC-SHA256, as libsecp256k1 does it. Extra data,
//! when present, is appended to the key material (RFC 6979 section 3.6).

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn hmac(key: &[u8; 32], parts: &[&[u8]]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// The HMAC-DRBG of RFC 6979 section 3.2. Each call to `next_candidate` produces one 32-byte
/// nonce candidate; callers discard candidates outside `[1, n)` and ask again.
pub(crate) struct NonceGenerator {
    k: [u8; 32],
    v: [u8; 32],
    retry: bool,
}

impl NonceGenerator {
    /// `secret` is the private key, `digest` the message hash already reduced mod n.
    pub(crate) fn new(secret: &[u8; 32], digest: &[u8; 32], extra: Option<&[u8; 32]>) -> Self {
        let extra: &[u8] = match extra {
            Some(e) => e,
            None => &[],
        };
        let mut v = [0x01u8; 32];
        let mut k = [0x00u8; 32];

        k = hmac(&k, &[&v[..], &[0x00u8][..], &secret[..], &digest[..], extra]);
        v = hmac(&k, &[&v[..]]);
        k = hmac(&k, &[&v[..], &[0x01u8][..], &secret[..], &digest[..], extra]);
        v = hmac(&k, &[&v[..]]);

        Self { k, v, retry: false }
    }

    pub(crate) fn next_candidate(&mut self) -> [u8; 32] {
        if self.retry {
            self.k = hmac(&self.k, &[&self.v[..], &[0x00u8][..]]);
            self.v = hmac(&self.k, &[&self.v[..]]);
        }
        self.v = hmac(&self.k, &[&self.v[..]]);
        self.retry = true;
        self.v
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_is_deterministic() {
        let secret = [1u8; 32];
        let digest = [2u8; 32];
        let mut a = NonceGenerator::new(&secret, &digest, None);
        let mut b = NonceGenerator::new(&secret, &digest, None);
        let first = a.next_candidate();
        assert_eq!(first, b.next_candidate());
        assert_ne!(first, a.next_candidate());
    }

    #[test]
    fn it_mixes_in_extra_data() {
        let secret = [1u8; 32];
        let digest = [2u8; 32];
        let plain = NonceGenerator::new(&secret, &digest, None).next_candidate();
        let extra = NonceGenerator::new(&secret, &digest, Some(&[3u8; 32])).next_candidate();
        assert_ne!(plain, extra);
    }
}
