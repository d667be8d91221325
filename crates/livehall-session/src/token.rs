//! Session token generation.

/// Produces a candidate session token.
///
/// Directories call this in a loop until the candidate is not already
/// taken, so a source only has to be random, not unique.
pub type TokenSource = Box<dyn FnMut() -> String + Send + Sync>;

/// Generates a random 32-character hex string (128 bits of entropy).
///
/// The token is the only credential a client holds, so it must not be
/// guessable. 16 random bytes, each rendered as two lowercase hex digits.
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
