//! Languages command implementation.

use crate::cli::Output;
use crate::language::ISO_639_1;

/// Print every language code the resolver knows.
pub fn run_languages() {
    Output::header("Language codes (ISO 639-1)");
    for (code, name) in ISO_639_1 {
        Output::kv(code, name);
    }
}
