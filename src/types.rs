/// OpenPGP public key algorithm identifiers (RFC 4880 section 9.1).
pub mod algorithm {
    pub const RSA: u32 = 1;
    pub const RSA_ENCRYPT_ONLY: u32 = 2;
    pub const RSA_SIGN_ONLY: u32 = 3;
    pub const ELGAMAL: u32 = 16;
    pub const DSA: u32 = 17;
    /// Reported by keyservers for ECDH keys.
    pub const ECC: u32 = 18;
    pub const ECDSA: u32 = 19;
    pub const ELGAMAL_SIGN: u32 = 20;
    pub const EDDSA: u32 = 22;
}

/// The cryptographic algorithm and key size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyType {
    pub algorithm: u32,
    pub bits: u32,
}

impl KeyType {
    pub fn algorithm_name(&self) -> String {
        use algorithm::*;

        match self.algorithm {
            RSA | RSA_ENCRYPT_ONLY | RSA_SIGN_ONLY => "RSA".to_string(),
            ELGAMAL | ELGAMAL_SIGN => "Elgamal".to_string(),
            DSA => "DSA".to_string(),
            ECC => "ECDH".to_string(),
            ECDSA => "ECDSA".to_string(),
            EDDSA => "EdDSA".to_string(),
            code => format!("ALG{}", code),
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.algorithm_name().to_lowercase(), self.bits)
    }
}

/// Options for keyserver requests.
#[derive(Debug, Clone, Default)]
pub struct KeyserverOptions {
    /// Timeout for each keyserver request, in seconds.
    /// If None, no timeout is applied.
    pub timeout_secs: Option<u64>,
}
