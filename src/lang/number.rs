//! Numeric literal tokens.
//!
//! Floating point literals are stored in Microsoft Binary Format: a
//! little-endian mantissa with the sign in its top bit, followed by an
//! exponent byte biased by 128. An exponent byte of zero means zero.

use super::token::{self, C_0, C_10, T_BYTE, T_DOUBLE, T_HEX, T_INT, T_OCT, T_SINGLE};
use super::Error;
use crate::error;

/// A numeric literal as it appears in tokenised code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Int(i16),
    Hex(u16),
    Oct(u16),
    Single([u8; 4]),
    Double([u8; 8]),
}

impl Literal {
    /// Parses a literal as returned by `CodeStream::read_number`.
    pub fn parse(word: &[u8]) -> Result<Literal, Error> {
        let word = word.to_ascii_uppercase();
        let start = word
            .iter()
            .position(|c| !b" \n".contains(c))
            .unwrap_or(word.len());
        let word = &word[start..];
        if word.starts_with(b"&H") {
            return Ok(Literal::Hex(parse_radix(&word[2..], 16)?));
        } else if word.starts_with(b"&O") {
            return Ok(Literal::Oct(parse_radix(&word[2..], 8)?));
        } else if word.starts_with(b"&") {
            return Ok(Literal::Oct(parse_radix(&word[1..], 8)?));
        }
        if let Some(value) = parse_int(word) {
            return Ok(Literal::Int(value));
        }
        let decimal = Decimal::parse(word);
        let mut wide = Wide::from_int(decimal.mantissa);
        wide.scale10(decimal.exp10);
        if decimal.is_double {
            let mut bytes = [0; 8];
            bytes.copy_from_slice(&wide.to_mbf(DOUBLE, decimal.negative)?);
            Ok(Literal::Double(bytes))
        } else {
            let mut bytes = [0; 4];
            bytes.copy_from_slice(&wide.to_mbf(SINGLE, decimal.negative)?);
            Ok(Literal::Single(bytes))
        }
    }

    /// Decodes a literal token. A payload cut short is padded with zeros.
    pub fn from_token(bytes: &[u8]) -> Option<Literal> {
        let (&lead, trail) = bytes.split_first()?;
        let mut padded = [0u8; 8];
        let n = trail.len().min(8);
        padded[..n].copy_from_slice(&trail[..n]);
        let word = u16::from_le_bytes([padded[0], padded[1]]);
        match lead {
            C_0..=C_10 => Some(Literal::Int(i16::from(lead - C_0))),
            T_BYTE => Some(Literal::Int(i16::from(padded[0]))),
            T_INT => Some(Literal::Int(word as i16)),
            T_HEX => Some(Literal::Hex(word)),
            T_OCT => Some(Literal::Oct(word)),
            T_SINGLE => {
                let mut bytes = [0; 4];
                bytes.copy_from_slice(&padded[..4]);
                Some(Literal::Single(bytes))
            }
            T_DOUBLE => Some(Literal::Double(padded)),
            _ => None,
        }
    }

    pub fn to_token(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(9);
        match *self {
            Literal::Int(n) if (0..10).contains(&n) => out.push(C_0 + n as u8),
            Literal::Int(n) if (0..256).contains(&n) => out.extend(&[T_BYTE, n as u8]),
            Literal::Int(n) => {
                out.push(T_INT);
                out.extend(&n.to_le_bytes());
            }
            Literal::Hex(n) => {
                out.push(T_HEX);
                out.extend(&n.to_le_bytes());
            }
            Literal::Oct(n) => {
                out.push(T_OCT);
                out.extend(&n.to_le_bytes());
            }
            Literal::Single(bytes) => {
                out.push(T_SINGLE);
                out.extend(&bytes);
            }
            Literal::Double(bytes) => {
                out.push(T_DOUBLE);
                out.extend(&bytes);
            }
        }
        out
    }

    /// Approximate value, for inspection.
    pub fn to_f64(&self) -> f64 {
        match self {
            Literal::Int(n) => f64::from(*n),
            Literal::Hex(n) | Literal::Oct(n) => f64::from(*n),
            Literal::Single(bytes) => mbf_to_f64(bytes),
            Literal::Double(bytes) => mbf_to_f64(bytes),
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Hex(n) => write!(f, "&H{:X}", n),
            Literal::Oct(n) => write!(f, "&O{:o}", n),
            Literal::Single(bytes) => f.write_str(&mbf_to_string(bytes, SINGLE)),
            Literal::Double(bytes) => f.write_str(&mbf_to_string(bytes, DOUBLE)),
        }
    }
}

/// Listing text of a number or line number token.
pub fn detokenise(bytes: &[u8]) -> String {
    match bytes.split_first() {
        Some((&lead, trail)) if token::is_line_number(lead) => {
            let lo = trail.get(0).copied().unwrap_or(0);
            let hi = trail.get(1).copied().unwrap_or(0);
            u16::from_le_bytes([lo, hi]).to_string()
        }
        _ => Literal::from_token(bytes).map_or_else(String::new, |lit| lit.to_string()),
    }
}

fn parse_radix(digits: &[u8], radix: u32) -> Result<u16, Error> {
    let mut value: u32 = 0;
    for &c in digits.iter().filter(|c| !b" \t\n".contains(c)) {
        let d = (c as char).to_digit(radix).ok_or_else(|| error!(SyntaxError))?;
        value = value * radix + d;
        if value > 0xffff {
            return Err(error!(Overflow));
        }
    }
    Ok(value as u16)
}

fn parse_int(word: &[u8]) -> Option<i16> {
    let trimmed = trim_blanks(word);
    if trimmed.is_empty() || !trimmed.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let mut value: u32 = 0;
    for &c in trimmed {
        value = value * 10 + u32::from(c - b'0');
        if value > i16::max_value() as u32 {
            return None;
        }
    }
    Some(value as i16)
}

fn trim_blanks(word: &[u8]) -> &[u8] {
    let start = word
        .iter()
        .position(|c| !b" \t\n".contains(c))
        .unwrap_or(word.len());
    let end = word
        .iter()
        .rposition(|c| !b" \t\n".contains(c))
        .map_or(start, |i| i + 1);
    &word[start..end]
}

/// A decimal literal broken down into sign, integer mantissa and exponent.
#[derive(Debug, Default, PartialEq)]
struct Decimal {
    is_double: bool,
    negative: bool,
    mantissa: u128,
    exp10: i32,
}

impl Decimal {
    fn parse(word: &[u8]) -> Decimal {
        let mut dec = Decimal::default();
        let (mut found_sign, mut found_point, mut found_exp) = (false, false, false);
        let (mut found_exp_sign, mut exp_neg, mut is_single) = (false, false, false);
        let (mut exponent, mut digits, mut zeros) = (0i32, 0, 0);
        for &c in word {
            if b" \t\n".contains(&c) {
                continue;
            }
            // ASCII separators make the whole number zero
            if b"\x1c\x1d\x1f".contains(&c) {
                return Decimal::default();
            }
            if !found_sign {
                found_sign = true;
                if c == b'+' || c == b'-' {
                    dec.negative = c == b'-';
                    continue;
                }
            }
            if !found_exp {
                match c {
                    b'0'..=b'9' => {
                        if dec.mantissa < 10u128.pow(36) {
                            dec.mantissa = dec.mantissa * 10 + u128::from(c - b'0');
                            if found_point {
                                dec.exp10 -= 1;
                            }
                        } else if !found_point {
                            dec.exp10 += 1;
                        }
                        if dec.mantissa != 0 {
                            digits += 1;
                            if found_point && c == b'0' {
                                zeros += 1;
                            } else {
                                zeros = 0;
                            }
                        }
                    }
                    b'.' => found_point = true,
                    b'D' | b'E' => {
                        found_exp = true;
                        dec.is_double = c == b'D';
                    }
                    b'!' => {
                        is_single = true;
                        break;
                    }
                    b'#' => {
                        dec.is_double = true;
                        break;
                    }
                    _ => break,
                }
                continue;
            }
            if !found_exp_sign {
                found_exp_sign = true;
                if c == b'+' || c == b'-' {
                    exp_neg = c == b'-';
                    continue;
                }
            }
            match c {
                b'0'..=b'9' => exponent = (exponent * 10 + i32::from(c - b'0')).min(9999),
                _ => break,
            }
        }
        dec.exp10 += if exp_neg { -exponent } else { exponent };
        // eight or more significant digits make a double
        if digits - zeros > 7 && !is_single {
            dec.is_double = true;
        }
        if is_single {
            dec.is_double = false;
        }
        dec
    }
}

/// Mantissa width in bits and significant decimal digits of an MBF type.
#[derive(Debug, Clone, Copy)]
struct Precision {
    bits: u32,
    digits: u32,
    exp_sign: char,
    sigil: char,
}

const SINGLE: Precision = Precision {
    bits: 24,
    digits: 7,
    exp_sign: 'E',
    sigil: '!',
};

const DOUBLE: Precision = Precision {
    bits: 56,
    digits: 16,
    exp_sign: 'D',
    sigil: '#',
};

/// Working form for decimal conversion: `man * 2^exp` with a wide mantissa.
#[derive(Debug, Clone, Copy)]
struct Wide {
    man: u128,
    exp: i32,
}

impl Wide {
    fn from_int(n: u128) -> Wide {
        let mut w = Wide { man: n, exp: 0 };
        w.normalise();
        w
    }

    fn is_zero(&self) -> bool {
        self.man == 0
    }

    fn normalise(&mut self) {
        if self.man != 0 {
            let lz = self.man.leading_zeros();
            self.man <<= lz;
            self.exp -= lz as i32;
        }
    }

    fn mul10(&mut self) {
        self.man >>= 4;
        self.exp += 4;
        self.man *= 10;
        self.normalise();
    }

    fn div10(&mut self) {
        self.man /= 10;
        self.normalise();
    }

    fn scale10(&mut self, exp10: i32) {
        if self.is_zero() {
            return;
        }
        for _ in 0..exp10.max(0) {
            self.mul10();
        }
        for _ in 0..(-exp10).max(0) {
            self.div10();
            if self.exp < -1000 {
                self.man = 0;
                return;
            }
        }
    }

    /// Nearest integer, saturating.
    fn round(&self) -> u128 {
        if self.exp >= 0 {
            return u128::max_value();
        }
        let shift = (-self.exp) as u32;
        if shift > 128 {
            0
        } else if shift == 128 {
            (self.man >> 127) & 1
        } else {
            (self.man >> shift) + ((self.man >> (shift - 1)) & 1)
        }
    }

    fn to_mbf(self, p: Precision, negative: bool) -> Result<Vec<u8>, Error> {
        let size = (p.bits / 8 + 1) as usize;
        let mut out = vec![0u8; size];
        if self.is_zero() {
            return Ok(out);
        }
        let mut top = self.man >> (128 - p.bits);
        top += (self.man >> (127 - p.bits)) & 1;
        let mut exp = self.exp + 256;
        if top >> p.bits != 0 {
            top >>= 1;
            exp += 1;
        }
        if exp > 255 {
            return Err(error!(Overflow));
        } else if exp < 1 {
            return Ok(out);
        }
        let sign_bit = 1u128 << (p.bits - 1);
        let stored = (top & !sign_bit) | if negative { sign_bit } else { 0 };
        out[..size - 1].copy_from_slice(&stored.to_le_bytes()[..size - 1]);
        out[size - 1] = exp as u8;
        Ok(out)
    }

    /// Returns the absolute value and the sign.
    fn from_mbf(bytes: &[u8], p: Precision) -> (Wide, bool) {
        let size = bytes.len();
        let exp = bytes[size - 1];
        if exp == 0 {
            return (Wide { man: 0, exp: 0 }, false);
        }
        let mut le = [0u8; 16];
        le[..size - 1].copy_from_slice(&bytes[..size - 1]);
        let stored = u128::from_le_bytes(le);
        let sign_bit = 1u128 << (p.bits - 1);
        let top = stored | sign_bit;
        let wide = Wide {
            man: top << (128 - p.bits),
            exp: i32::from(exp) - 256,
        };
        (wide, stored & sign_bit != 0)
    }
}

fn mbf_to_f64(bytes: &[u8]) -> f64 {
    let p = if bytes.len() == 4 { SINGLE } else { DOUBLE };
    let (wide, negative) = Wide::from_mbf(bytes, p);
    if wide.is_zero() {
        return 0.0;
    }
    let value = (wide.man >> 64) as f64 * 2f64.powi(wide.exp + 64);
    if negative {
        -value
    } else {
        value
    }
}

fn mbf_to_string(bytes: &[u8], p: Precision) -> String {
    let (mut wide, negative) = Wide::from_mbf(bytes, p);
    if wide.is_zero() {
        return format!("0{}", p.sigil);
    }
    let lim_top = 10u128.pow(p.digits);
    let lim_bot = 10u128.pow(p.digits - 1);
    let mut exp10: i32 = 0;
    while wide.round() >= lim_top {
        wide.div10();
        exp10 += 1;
    }
    while wide.round() < lim_bot {
        wide.mul10();
        exp10 -= 1;
    }
    let digits = wide.round().to_string();
    let digits = digits.trim_end_matches('0');
    let exp10 = exp10 + p.digits as i32 - 1;
    let digits_len = digits.len() as i32;
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if exp10 > p.digits as i32 - 1 || digits_len - exp10 > p.digits as i32 + 1 {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        let sign = if exp10 < 0 { '-' } else { '+' };
        out.push_str(&format!("{}{}{:02}", p.exp_sign, sign, exp10.abs()));
    } else {
        let to_dot = exp10 + 1;
        if to_dot >= digits_len {
            out.push_str(digits);
            out.extend(std::iter::repeat('0').take((to_dot - digits_len) as usize));
        } else if to_dot > 0 {
            out.push_str(&digits[..to_dot as usize]);
            out.push('.');
            out.push_str(&digits[to_dot as usize..]);
        } else {
            out.push('.');
            out.extend(std::iter::repeat('0').take((-to_dot) as usize));
            out.push_str(digits);
        }
        if !out.contains('.') || p.sigil == '#' {
            out.push(p.sigil);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(word: &str) -> String {
        Literal::parse(word.as_bytes()).unwrap().to_string()
    }

    #[test]
    fn test_int_tokens() {
        assert_eq!(Literal::parse(b"1").unwrap().to_token(), vec![0x12]);
        assert_eq!(Literal::parse(b"10").unwrap().to_token(), vec![0x0f, 0x0a]);
        assert_eq!(Literal::parse(b"300").unwrap().to_token(), vec![0x1c, 0x2c, 0x01]);
        assert_eq!(Literal::parse(b"32767").unwrap(), Literal::Int(32767));
    }

    #[test]
    fn test_hex_oct() {
        assert_eq!(Literal::parse(b"&HFF").unwrap().to_token(), vec![0x0c, 0xff, 0x00]);
        assert_eq!(Literal::parse(b"&O17").unwrap(), Literal::Oct(15));
        assert_eq!(listed("&O17"), "&O17");
        assert_eq!(listed("&hff"), "&HFF");
        assert_eq!(listed("&O0"), "&O0");
        assert_eq!(Literal::parse(b"&H10000"), Err(error!(Overflow)));
    }

    #[test]
    fn test_single() {
        assert_eq!(
            Literal::parse(b"1.0").unwrap(),
            Literal::Single([0x00, 0x00, 0x00, 0x81])
        );
        assert_eq!(
            Literal::parse(b"-1.0").unwrap(),
            Literal::Single([0x00, 0x00, 0x80, 0x81])
        );
        assert_eq!(
            Literal::parse(b"0.5").unwrap(),
            Literal::Single([0x00, 0x00, 0x00, 0x80])
        );
        assert_eq!(listed("40000"), "40000!");
        assert_eq!(listed("1.5E+3"), "1500!");
        assert_eq!(listed(".1"), ".1");
        assert_eq!(listed("1.1"), "1.1");
        assert_eq!(listed("1E20"), "1E+20");
        assert_eq!(listed("1.5E-10"), "1.5E-10");
        assert_eq!(listed("0.0"), "0!");
        assert!((Literal::parse(b"3.25").unwrap().to_f64() - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_double() {
        assert!(matches!(Literal::parse(b"1.5#").unwrap(), Literal::Double(_)));
        assert!(matches!(Literal::parse(b"1D3").unwrap(), Literal::Double(_)));
        assert!(matches!(Literal::parse(b"123456789").unwrap(), Literal::Double(_)));
        assert!(matches!(Literal::parse(b"123456789!").unwrap(), Literal::Single(_)));
        assert_eq!(listed("1.5#"), "1.5#");
        assert_eq!(listed("1D3"), "1000#");
        assert_eq!(listed("123456789"), "123456789#");
    }

    #[test]
    fn test_overflow() {
        assert_eq!(Literal::parse(b"1E99"), Err(error!(Overflow)));
        assert_eq!(Literal::parse(b"1E-99").unwrap(), Literal::Single([0; 4]));
    }

    #[test]
    fn test_detokenise() {
        assert_eq!(detokenise(b"\x0e\x0a\x00"), "10");
        assert_eq!(detokenise(b"\x1c\xff\x7f"), "32767");
        assert_eq!(detokenise(b"\x0f\x2a"), "42");
        assert_eq!(detokenise(b"\x1b"), "10");
        assert_eq!(detokenise(b"\x1d\x00\x00"), "0!");
        assert_eq!(detokenise(b"\x7f"), "");
    }
}
