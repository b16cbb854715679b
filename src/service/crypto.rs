use rand::{rngs::OsRng, RngCore};

pub const TOKEN_BYTES: usize = 16;

/// Opaque invitation token: 128 bits from the OS generator, lowercase hex.
pub fn generate_invitation_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
