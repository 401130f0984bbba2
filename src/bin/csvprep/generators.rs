//! Synthetic CSV generators for benchmarking and testing the scanner.
//!
//! Each pattern stresses a different part of stage 1: plain text exercises
//! the fast path, quoted delimiters and line breaks exercise sanitization,
//! and escaped quotes or CRLF inside quotes exercise deferral.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy)]
pub enum CsvPattern {
    /// Standard tabular data without quotes
    Tabular,
    /// Quoted fields containing delimiters
    Quoted,
    /// Quoted fields containing newlines
    Multiline,
    /// Quoted fields containing doubled (escaped) quotes
    Escaped,
    /// CRLF record terminators with CRLF inside quoted fields
    Crlf,
    /// Worst case: every field quoted with delimiters, escapes and line breaks
    Pathological,
}

/// Generate CSV of approximately `target_size` bytes.
pub fn generate_csv(
    target_size: usize,
    pattern: CsvPattern,
    seed: Option<u64>,
    delimiter: char,
) -> String {
    let mut rng = seed.map(ChaCha8Rng::seed_from_u64);
    match pattern {
        CsvPattern::Tabular => generate_tabular(target_size, &mut rng, delimiter),
        CsvPattern::Quoted => generate_quoted(target_size, &mut rng, delimiter),
        CsvPattern::Multiline => generate_multiline(target_size, &mut rng, delimiter),
        CsvPattern::Escaped => generate_escaped(target_size, &mut rng, delimiter),
        CsvPattern::Crlf => generate_crlf(target_size, &mut rng, delimiter),
        CsvPattern::Pathological => generate_pathological(target_size, &mut rng, delimiter),
    }
}

fn generate_tabular(target_size: usize, rng: &mut Option<ChaCha8Rng>, d: char) -> String {
    let mut csv = String::with_capacity(target_size);
    csv.push_str(&format!("id{d}name{d}email{d}age{d}score\n"));

    let mut row_id = 1;
    while csv.len() < target_size {
        let age = rng.as_mut().map(|r| r.gen_range(18..80)).unwrap_or(25);
        let score = rng
            .as_mut()
            .map(|r| r.gen_range(0..10000))
            .unwrap_or(row_id * 10);

        csv.push_str(&format!(
            "{row_id}{d}User{row_id}{d}user{row_id}@example.com{d}{age}{d}{score}\n"
        ));
        row_id += 1;
    }

    csv
}

fn generate_quoted(target_size: usize, rng: &mut Option<ChaCha8Rng>, d: char) -> String {
    let mut csv = String::with_capacity(target_size);
    csv.push_str(&format!("id{d}name{d}address\n"));

    let streets = ["Main St", "Oak Ave", "Maple Dr", "Cedar Ln", "Pine Rd"];
    let cities = ["New York", "Chicago", "Houston", "Seattle"];

    let mut row_id = 1;
    while csv.len() < target_size {
        let number = rng.as_mut().map(|r| r.gen_range(1..9999)).unwrap_or(123);
        let street = streets[row_id % streets.len()];
        let city = cities[row_id % cities.len()];

        // Address contains the delimiter, must be quoted
        csv.push_str(&format!(
            "{row_id}{d}\"User {row_id}\"{d}\"{number} {street}{d} {city}\"\n"
        ));
        row_id += 1;
    }

    csv
}

fn generate_multiline(target_size: usize, rng: &mut Option<ChaCha8Rng>, d: char) -> String {
    let mut csv = String::with_capacity(target_size);
    csv.push_str(&format!("id{d}title{d}body\n"));

    let mut row_id = 1;
    while csv.len() < target_size {
        let num_lines = rng.as_mut().map(|r| r.gen_range(2..5)).unwrap_or(3);
        let body: Vec<String> = (0..num_lines)
            .map(|i| format!("Line {} of entry {}", i + 1, row_id))
            .collect();

        csv.push_str(&format!(
            "{row_id}{d}Title {row_id}{d}\"{}\"\n",
            body.join("\n")
        ));
        row_id += 1;
    }

    csv
}

fn generate_escaped(target_size: usize, rng: &mut Option<ChaCha8Rng>, d: char) -> String {
    let mut csv = String::with_capacity(target_size);
    csv.push_str(&format!("id{d}quote\n"));

    let words = ["hello", "yes", "no", "maybe", "quoted"];

    let mut row_id = 1;
    while csv.len() < target_size {
        let word = rng
            .as_mut()
            .map(|r| words[r.gen_range(0..words.len())])
            .unwrap_or(words[row_id % words.len()]);

        // Doubled quotes are the CSV escape for a literal quote
        csv.push_str(&format!("{row_id}{d}\"said \"\"{word}\"\" twice\"\n"));
        row_id += 1;
    }

    csv
}

fn generate_crlf(target_size: usize, rng: &mut Option<ChaCha8Rng>, d: char) -> String {
    let mut csv = String::with_capacity(target_size);
    csv.push_str(&format!("id{d}comment\r\n"));

    let mut row_id = 1;
    while csv.len() < target_size {
        let multiline = rng
            .as_mut()
            .map(|r| r.gen_bool(0.3))
            .unwrap_or(row_id % 3 == 0);

        if multiline {
            csv.push_str(&format!("{row_id}{d}\"first line\r\nsecond line\"\r\n"));
        } else {
            csv.push_str(&format!("{row_id}{d}plain comment {row_id}\r\n"));
        }
        row_id += 1;
    }

    csv
}

fn generate_pathological(target_size: usize, rng: &mut Option<ChaCha8Rng>, d: char) -> String {
    let mut csv = String::with_capacity(target_size);
    csv.push_str(&format!("\"id\"{d}\"field1\"{d}\"field2\"{d}\"field3\"\n"));

    let mut row_id = 1;
    while csv.len() < target_size {
        let extra = rng.as_mut().map(|r| r.gen_range(0..100)).unwrap_or(row_id);

        let field1 = format!("value{d}with{extra}{d}delimiter");
        let field2 = format!("say \"\"hello\"\" {row_id}");
        let field3 = format!("complex{d}\r\n\"\"data\"\"");

        csv.push_str(&format!(
            "\"{row_id}\"{d}\"{field1}\"{d}\"{field2}\"{d}\"{field3}\"\n"
        ));
        row_id += 1;
    }

    csv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_tabular() {
        let csv = generate_csv(1024, CsvPattern::Tabular, Some(42), ',');
        assert!(csv.len() >= 1024);
        assert!(csv.starts_with("id,name,email,"));
        assert!(!csv.contains('"'));
    }

    #[test]
    fn test_generate_quoted() {
        let csv = generate_csv(1024, CsvPattern::Quoted, Some(42), ',');
        assert!(csv.len() >= 1024);
        assert!(csv.contains("St, "));
    }

    #[test]
    fn test_generate_multiline() {
        let csv = generate_csv(1024, CsvPattern::Multiline, Some(42), ',');
        assert!(csv.contains("\"Line 1"));
    }

    #[test]
    fn test_generate_escaped() {
        let csv = generate_csv(1024, CsvPattern::Escaped, None, ',');
        assert!(csv.contains("\"\""));
    }

    #[test]
    fn test_generate_crlf() {
        let csv = generate_csv(1024, CsvPattern::Crlf, None, ',');
        assert!(csv.contains("\"first line\r\nsecond line\""));
        assert!(csv.ends_with("\r\n"));
        assert!(!csv.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_tsv_generation() {
        let tsv = generate_csv(1024, CsvPattern::Pathological, Some(42), '\t');
        assert!(tsv.contains('\t'));
        assert!(!tsv.contains(','));
    }

    #[test]
    fn test_deterministic_generation() {
        let csv1 = generate_csv(2048, CsvPattern::Crlf, Some(42), ',');
        let csv2 = generate_csv(2048, CsvPattern::Crlf, Some(42), ',');
        assert_eq!(csv1, csv2);
    }
}
