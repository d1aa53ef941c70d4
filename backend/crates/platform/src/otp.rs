//! One-Time Password Verification (TOTP / HOTP)
//!
//! Verification sits on the attacker-facing boundary, so every internal
//! fault (malformed base32 secret, bad code length, unsupported method)
//! converts to `false` - this module never propagates an error to the
//! caller.

use std::str::FromStr;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use totp_rs::{Algorithm, Secret, TOTP};

/// Code length in digits
const OTP_DIGITS: usize = 6;
/// TOTP time step in seconds
const TOTP_STEP: u64 = 30;
/// Accepted TOTP drift in steps (one step before/after)
const TOTP_SKEW: u8 = 1;

/// OTP scheme selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpMethod {
    /// Time-based (RFC 6238)
    Totp,
    /// Counter-based (RFC 4226)
    Hotp,
}

impl FromStr for OtpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TOTP" => Ok(OtpMethod::Totp),
            "HOTP" => Ok(OtpMethod::Hotp),
            _ => Err(()),
        }
    }
}

/// Generate a new base32-encoded OTP secret (160-bit)
pub fn generate_otp_secret() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

/// Verify a one-time password against a base32-encoded secret.
///
/// `method` is the stored scheme name (`"TOTP"` or `"HOTP"`, case
/// insensitive); `counter` is only consulted for HOTP. Unknown methods
/// and malformed inputs verify as `false`, never as an error.
pub fn verify_otp(secret_base32: &str, code: &str, method: &str, counter: u64) -> bool {
    match method.parse::<OtpMethod>() {
        Ok(OtpMethod::Totp) => verify_totp(secret_base32, code),
        Ok(OtpMethod::Hotp) => verify_hotp(secret_base32, code, counter),
        Err(()) => false,
    }
}

fn verify_totp(secret_base32: &str, code: &str) -> bool {
    let Ok(secret) = Secret::Encoded(secret_base32.to_string()).to_bytes() else {
        return false;
    };

    let Ok(totp) = TOTP::new(
        Algorithm::SHA1,
        OTP_DIGITS,
        TOTP_SKEW,
        TOTP_STEP,
        secret,
        None,
        String::new(),
    ) else {
        return false;
    };

    totp.check_current(code).unwrap_or(false)
}

fn verify_hotp(secret_base32: &str, code: &str, counter: u64) -> bool {
    let Ok(secret) = Secret::Encoded(secret_base32.to_string()).to_bytes() else {
        return false;
    };

    if code.len() != OTP_DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    format!("{:06}", hotp_value(&secret, counter)) == code
}

/// RFC 4226 dynamic truncation of HMAC-SHA1(secret, counter)
fn hotp_value(secret: &[u8], counter: u64) -> u32 {
    let mut mac =
        Hmac::<Sha1>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    binary % 1_000_000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_totp_code(secret_base32: &str) -> String {
        let secret = Secret::Encoded(secret_base32.to_string()).to_bytes().unwrap();
        let totp = TOTP::new(
            Algorithm::SHA1,
            OTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            secret,
            None,
            String::new(),
        )
        .unwrap();
        totp.generate_current().unwrap()
    }

    #[test]
    fn test_totp_fresh_code_verifies() {
        let secret = generate_otp_secret();
        let code = current_totp_code(&secret);
        assert!(verify_otp(&secret, &code, "TOTP", 0));
    }

    #[test]
    fn test_totp_wrong_code_fails() {
        let secret = generate_otp_secret();
        let code = current_totp_code(&secret);
        let wrong = if code == "000000" { "000001" } else { "000000" };
        assert!(!verify_otp(&secret, wrong, "TOTP", 0));
    }

    #[test]
    fn test_hotp_rfc4226_vectors() {
        // RFC 4226 appendix D, secret "12345678901234567890" (base32 below)
        let secret = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";
        let expected = ["755224", "287082", "359152", "969429", "338314"];
        for (counter, code) in expected.iter().enumerate() {
            assert!(verify_otp(secret, code, "HOTP", counter as u64));
        }
        assert!(!verify_otp(secret, "755224", "HOTP", 1));
    }

    #[test]
    fn test_unsupported_method_is_false() {
        let secret = generate_otp_secret();
        let code = current_totp_code(&secret);
        assert!(!verify_otp(&secret, &code, "SMS", 0));
        assert!(!verify_otp(&secret, &code, "", 0));
    }

    #[test]
    fn test_malformed_inputs_are_false() {
        assert!(!verify_otp("not base32 at all!!", "123456", "TOTP", 0));
        let secret = generate_otp_secret();
        assert!(!verify_otp(&secret, "12345", "HOTP", 0));
        assert!(!verify_otp(&secret, "abcdef", "HOTP", 0));
    }

    #[test]
    fn test_method_parse_case_insensitive() {
        assert_eq!("totp".parse::<OtpMethod>(), Ok(OtpMethod::Totp));
        assert_eq!("Hotp".parse::<OtpMethod>(), Ok(OtpMethod::Hotp));
        assert!("sms".parse::<OtpMethod>().is_err());
    }
}
