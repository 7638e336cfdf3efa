//! Charsets for `@size,datatype` value generators and the `b`/`k`/`m`/`g`
//! size-unit table.

use std::fmt;

/// One of the fixed charsets a `Generate` value draws random bytes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datatype {
    AsciiLetters,
    AsciiLowercase,
    AsciiUppercase,
    Digits,
    Hexdigits,
    Octdigits,
    Punctuation,
    Whitespace,
    Ascii,
    /// All 256 octets. The default when no datatype is named.
    Bytes,
}

impl Default for Datatype {
    fn default() -> Datatype {
        Datatype::Bytes
    }
}

const ASCII_LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const ASCII_UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const HEXDIGITS: &[u8] = b"0123456789abcdefABCDEF";
const OCTDIGITS: &[u8] = b"01234567";
const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";
const WHITESPACE: &[u8] = b" \t\n\r\x0b\x0c";

impl Datatype {
    /// The keyword used for this datatype in a spec, e.g. `ascii_letters`.
    /// `Bytes` has no keyword: it is the unnamed default.
    pub fn keyword(&self) -> Option<&'static str> {
        use self::Datatype::*;
        match *self {
            AsciiLetters => Some("ascii_letters"),
            AsciiLowercase => Some("ascii_lowercase"),
            AsciiUppercase => Some("ascii_uppercase"),
            Digits => Some("digits"),
            Hexdigits => Some("hexdigits"),
            Octdigits => Some("octdigits"),
            Punctuation => Some("punctuation"),
            Whitespace => Some("whitespace"),
            Ascii => Some("ascii"),
            Bytes => None,
        }
    }

    pub fn from_keyword(kw: &str) -> Option<Datatype> {
        use self::Datatype::*;
        Some(match kw {
            "ascii_letters" => AsciiLetters,
            "ascii_lowercase" => AsciiLowercase,
            "ascii_uppercase" => AsciiUppercase,
            "digits" => Digits,
            "hexdigits" => Hexdigits,
            "octdigits" => Octdigits,
            "punctuation" => Punctuation,
            "whitespace" => Whitespace,
            "ascii" => Ascii,
            "bytes" => Bytes,
            _ => return None,
        })
    }

    /// Sample space this datatype draws from. Always non-empty.
    pub fn charset(&self) -> Charset {
        use self::Datatype::*;
        match *self {
            AsciiLetters => Charset::Bytes(&[ASCII_LOWERCASE, ASCII_UPPERCASE]),
            AsciiLowercase => Charset::Bytes(&[ASCII_LOWERCASE]),
            AsciiUppercase => Charset::Bytes(&[ASCII_UPPERCASE]),
            Digits => Charset::Bytes(&[DIGITS]),
            Hexdigits => Charset::Bytes(&[HEXDIGITS]),
            Octdigits => Charset::Bytes(&[OCTDIGITS]),
            Punctuation => Charset::Bytes(&[PUNCTUATION]),
            Whitespace => Charset::Bytes(&[WHITESPACE]),
            Ascii => Charset::Bytes(&[DIGITS, ASCII_LOWERCASE, ASCII_UPPERCASE, PUNCTUATION, WHITESPACE]),
            Bytes => Charset::AllBytes,
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.keyword() {
            Some(kw) => f.write_str(kw),
            None => f.write_str("bytes"),
        }
    }
}

/// A concatenation of byte ranges to sample uniformly from.
pub enum Charset {
    Bytes(&'static [&'static [u8]]),
    /// All 256 possible octets.
    AllBytes,
}

impl Charset {
    pub fn len(&self) -> usize {
        match *self {
            Charset::Bytes(parts) => parts.iter().map(|p| p.len()).sum(),
            Charset::AllBytes => 256,
        }
    }

    /// The `i`th byte of the charset, in a stable but otherwise
    /// unspecified order.
    pub fn nth(&self, i: usize) -> u8 {
        match *self {
            Charset::Bytes(parts) => {
                let mut idx = i;
                for part in parts {
                    if idx < part.len() {
                        return part[idx];
                    }
                    idx -= part.len();
                }
                unreachable!("index out of range for charset")
            }
            Charset::AllBytes => i as u8,
        }
    }
}

/// A `@size<unit>` size multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Bytes,
    Kilo,
    Mega,
    Giga,
}

impl Default for SizeUnit {
    fn default() -> SizeUnit {
        SizeUnit::Bytes
    }
}

impl SizeUnit {
    pub fn multiplier(&self) -> u64 {
        match *self {
            SizeUnit::Bytes => 1,
            SizeUnit::Kilo => 1024,
            SizeUnit::Mega => 1024 * 1024,
            SizeUnit::Giga => 1024 * 1024 * 1024,
        }
    }

    pub fn letter(&self) -> char {
        match *self {
            SizeUnit::Bytes => 'b',
            SizeUnit::Kilo => 'k',
            SizeUnit::Mega => 'm',
            SizeUnit::Giga => 'g',
        }
    }

    pub fn from_letter(c: char) -> Option<SizeUnit> {
        match c {
            'b' => Some(SizeUnit::Bytes),
            'k' => Some(SizeUnit::Kilo),
            'm' => Some(SizeUnit::Mega),
            'g' => Some(SizeUnit::Giga),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keyword_roundtrip() {
        for &dt in &[
            Datatype::AsciiLetters, Datatype::AsciiLowercase,
            Datatype::AsciiUppercase, Datatype::Digits, Datatype::Hexdigits,
            Datatype::Octdigits, Datatype::Punctuation, Datatype::Whitespace,
            Datatype::Ascii,
        ] {
            let kw = dt.keyword().unwrap();
            assert_eq!(Datatype::from_keyword(kw), Some(dt));
        }
        assert_eq!(Datatype::from_keyword("bytes"), Some(Datatype::Bytes));
    }

    #[test]
    fn all_bytes_charset_covers_every_octet() {
        let cs = Datatype::Bytes.charset();
        assert_eq!(cs.len(), 256);
        assert_eq!(cs.nth(0), 0);
        assert_eq!(cs.nth(255), 255);
    }

    #[test]
    fn ascii_letters_is_upper_and_lower() {
        let cs = Datatype::AsciiLetters.charset();
        assert_eq!(cs.len(), 52);
        assert_eq!(cs.nth(0), b'a');
        assert_eq!(cs.nth(25), b'z');
        assert_eq!(cs.nth(26), b'A');
        assert_eq!(cs.nth(51), b'Z');
    }

    #[test]
    fn ascii_charset_matches_pythons_string_printable() {
        // digits(10) + lowercase(26) + uppercase(26) + punctuation(32) + whitespace(6)
        let cs = Datatype::Ascii.charset();
        assert_eq!(cs.len(), 100);
        assert_eq!(cs.nth(0), b'0');
        assert_eq!(cs.nth(9), b'9');
        assert_eq!(cs.nth(10), b'a');
        assert_eq!(cs.nth(99), b'\x0c');
    }

    #[test]
    fn size_unit_multipliers() {
        assert_eq!(SizeUnit::Bytes.multiplier(), 1);
        assert_eq!(SizeUnit::Kilo.multiplier(), 1024);
        assert_eq!(SizeUnit::Mega.multiplier(), 1024 * 1024);
        assert_eq!(SizeUnit::Giga.multiplier(), 1024 * 1024 * 1024);
    }
}
