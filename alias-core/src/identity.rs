use alias_types::{GameError, PlayerId, RoomCode};
use rand::Rng;

pub const ROOM_CODE_LENGTH: usize = 6;
pub const SESSION_ID_LENGTH: usize = 9;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SESSION_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn sample<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

/// Random identifier distinguishing this client from its peers. Lives only as
/// long as the process.
pub fn generate_session_id<R: Rng + ?Sized>(rng: &mut R) -> PlayerId {
    sample(rng, SESSION_ID_ALPHABET, SESSION_ID_LENGTH)
}

/// Short room code. Not globally unique; collisions are accepted.
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    sample(rng, ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH)
}

fn is_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LENGTH
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Accepts user-typed codes in any case, surrounding whitespace ignored.
pub fn normalize_room_code(input: &str) -> Result<RoomCode, GameError> {
    let code = input.trim().to_uppercase();
    if is_room_code(&code) {
        Ok(code)
    } else {
        Err(GameError::InvalidRoomCode {
            code: input.to_string(),
        })
    }
}
