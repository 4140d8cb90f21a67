//! PKCS#7 byte padding applied to the encoded plaintext in legacy mode.

use cbc::cipher::block_padding::{Pkcs7, RawPadding};

/// Pad `data` to a multiple of `block_size`.
///
/// The pad value equals the number of bytes added (1..=`block_size`). Input
/// that is already aligned receives a full block of padding.
pub(crate) fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let tail = data.len() % block_size;
    let (head, partial) = data.split_at(data.len() - tail);
    let mut last = vec![0u8; block_size];
    last[..tail].copy_from_slice(partial);
    Pkcs7::raw_pad(&mut last, tail);

    let mut out = Vec::with_capacity(head.len() + block_size);
    out.extend_from_slice(head);
    out.extend_from_slice(&last);
    out
}

/// Strip PKCS#7 padding, returning `None` if the padding is malformed.
pub(crate) fn unpad(data: &[u8], block_size: usize) -> Option<&[u8]> {
    if data.is_empty() || data.len() % block_size != 0 {
        return None;
    }
    let head_len = data.len() - block_size;
    let body = Pkcs7::raw_unpad(&data[head_len..]).ok()?;
    Some(&data[..head_len + body.len()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_partial_block() {
        let padded = pad(b"Hello World", 16);
        assert_eq!(padded.len(), 16);
        assert_eq!(&padded[11..], &[5, 5, 5, 5, 5]);
    }

    #[test]
    fn pads_aligned_input_with_full_block() {
        let padded = pad(b"1234567890123456", 16);
        assert_eq!(padded.len(), 32);
        assert!(padded[16..].iter().all(|&b| b == 16));
    }

    #[test]
    fn pads_empty_input() {
        assert_eq!(pad(b"", 16), vec![16u8; 16]);
    }

    #[test]
    fn unpad_reverses_pad() {
        let padded = pad(b"aGVsbG8=", 16);
        assert_eq!(unpad(&padded, 16), Some(&b"aGVsbG8="[..]));
    }

    #[test]
    fn unpad_strips_only_last_block() {
        let data = b"0123456789abcdefXYZ";
        let padded = pad(data, 16);
        assert_eq!(padded.len(), 32);
        assert_eq!(unpad(&padded, 16), Some(&data[..]));
        // Base64 text never ends in a valid pad byte.
        assert_eq!(unpad(b"0123456789abcdef", 16), None);
    }

    #[test]
    fn unpad_rejects_bad_padding() {
        let mut padded = pad(b"abc", 16);
        padded[14] = 1;
        assert_eq!(unpad(&padded, 16), None);
        assert_eq!(unpad(&[0u8; 16], 16), None);
        assert_eq!(unpad(&[17u8; 16], 16), None);
        assert_eq!(unpad(b"short", 16), None);
    }
}
