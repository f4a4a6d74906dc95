#![no_main]
use libfuzzer_sys::fuzz_target;
use newstrends::tokenize;

/// Fuzz the tokenizer: splitting, cleaning, and every noise classifier.
/// None of these should ever panic, and cleaned output must never contain
/// a token the noise predicate rejects.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let tokens = tokenize::split_and_clean(s);
        for token in &tokens {
            assert!(!tokenize::is_noise(token));
            assert!(token.chars().count() >= 3);
        }
        let _ = tokenize::is_noise(s);
        let _ = tokenize::is_numeric_vector(s);
    }
});
