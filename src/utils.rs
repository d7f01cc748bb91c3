use anyhow::{bail, Result};

/// Convert a line of '0'/'1' characters into a bit vector, MSB first.
/// Whitespace at either end is ignored; any other character is an error.
pub fn bit_vec_from_string(s: &str) -> Result<Vec<u8>> {
    let mut bits = Vec::with_capacity(32);
    for c in s.trim().chars() {
        match c {
            '0' => bits.push(0),
            '1' => bits.push(1),
            _ => bail!("invalid character in binary string: {c:?}"),
        }
    }
    Ok(bits)
}

/// Fold a MSB-first bit vector into an integer.
#[must_use]
pub fn bit_vec_to_int(bits: &[u8]) -> u32 {
    bits.iter().fold(0, |acc, &bit| (acc << 1) | u32::from(bit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_instruction_words() {
        let bits = bit_vec_from_string("00000000010001010010000110000011").unwrap();
        assert_eq!(bits.len(), 32);
        assert_eq!(bit_vec_to_int(&bits), 0b0000_0000_0100_0101_0010_0001_1000_0011);
    }

    #[test]
    fn rejects_non_binary_characters() {
        assert!(bit_vec_from_string("0102").is_err());
    }

    #[test]
    fn empty_line_is_an_empty_vec() {
        assert_eq!(bit_vec_from_string("  ").unwrap(), Vec::<u8>::new());
    }
}
