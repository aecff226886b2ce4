//! The GW-BASIC protected program cipher.
//!
//! Each byte is combined with a 13-byte and an 11-byte key and with
//! offsets that depend on its position. Positions cycle every 143 bytes.

const KEY1: [u8; 13] = [
    0xA9, 0x84, 0x8D, 0xCD, 0x75, 0x83, 0x43, 0x63, 0x24, 0x83, 0x19, 0xF7, 0x9A,
];
const KEY2: [u8; 11] = [
    0x1E, 0x1D, 0xC4, 0x77, 0x26, 0x97, 0xE0, 0x74, 0x59, 0x88, 0x7C,
];
const CYCLE: usize = 13 * 11;

fn positions() -> impl Iterator<Item = (u8, u8)> {
    (0..CYCLE).cycle().map(|i| ((i % 13) as u8, (i % 11) as u8))
}

pub fn protect(plain: &[u8]) -> Vec<u8> {
    plain
        .iter()
        .zip(positions())
        .map(|(&c, (i13, i11))| {
            let c = c.wrapping_sub(13 - i13);
            let c = c ^ KEY1[usize::from(i13)] ^ KEY2[usize::from(i11)];
            c.wrapping_add(11 - i11)
        })
        .collect()
}

pub fn unprotect(cipher: &[u8]) -> Vec<u8> {
    cipher
        .iter()
        .zip(positions())
        .map(|(&c, (i13, i11))| {
            let c = c.wrapping_sub(11 - i11);
            let c = c ^ KEY1[usize::from(i13)] ^ KEY2[usize::from(i11)];
            c.wrapping_add(13 - i13)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse() {
        let plain: Vec<u8> = (0..=255).cycle().take(1000).collect();
        let cipher = protect(&plain);
        assert_ne!(cipher, plain);
        assert_eq!(unprotect(&cipher), plain);
        assert_eq!(protect(&unprotect(&plain)), plain);
    }

    #[test]
    fn test_first_byte() {
        // (0x7f - 13) ^ 0xa9 ^ 0x1e + 11
        assert_eq!(protect(&[0x7f]), vec![0xd0]);
        assert_eq!(unprotect(&[0xd0]), vec![0x7f]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(protect(&[]), Vec::<u8>::new());
    }
}
