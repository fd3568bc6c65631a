use std::sync::Arc;

pub const SHORT_CODE_LEN: usize = 6;

const ALPHABET: [char; 62] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L',
    'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3', '4',
    '5', '6', '7', '8', '9',
];

/// Source of candidate short codes.
pub type CodeGenerator = Arc<dyn Fn() -> String + Send + Sync>;

pub fn random_code() -> String {
    nanoid::nanoid!(SHORT_CODE_LEN, &ALPHABET)
}

pub fn random() -> CodeGenerator {
    Arc::new(random_code)
}
