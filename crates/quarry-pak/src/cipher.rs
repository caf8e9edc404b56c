//! Stream cipher used for table and content encryption.
//!
//! RC4 keyed by the raw key bytes. The keystream restarts for every buffer
//! (the entry table, and each payload on its own), so encrypting and
//! decrypting are the same operation.

/// RC4 keystream state.
pub struct Rc4 {
    state: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Run the key schedule. `key` must not be empty.
    pub fn new(key: &[u8]) -> Self {
        debug_assert!(!key.is_empty(), "RC4 key must not be empty");

        let mut state = [0u8; 256];
        for (i, slot) in state.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
            state.swap(i, j as usize);
        }

        Self { state, i: 0, j: 0 }
    }

    /// XOR the keystream into `data` in place.
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        for byte in data {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.state[self.i as usize]);
            self.state.swap(self.i as usize, self.j as usize);
            let t = self.state[self.i as usize].wrapping_add(self.state[self.j as usize]);
            *byte ^= self.state[t as usize];
        }
    }
}

/// Encrypt or decrypt `data` in place with a fresh keystream.
pub fn crypt(data: &mut [u8], key: &[u8]) {
    if data.is_empty() {
        return;
    }
    Rc4::new(key).apply_keystream(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // Standard RC4 test vector: key "Key", plaintext "Plaintext".
        let mut data = *b"Plaintext";
        crypt(&mut data, b"Key");
        assert_eq!(data, [0xBB, 0xF3, 0x16, 0xE8, 0xD9, 0x40, 0xAF, 0x0A, 0xD3]);
    }

    #[test]
    fn test_crypt_is_symmetric() {
        let original = b"entry table bytes".to_vec();
        let mut data = original.clone();
        crypt(&mut data, b"k1");
        assert_ne!(data, original);
        crypt(&mut data, b"k1");
        assert_eq!(data, original);
    }

    #[test]
    fn test_wrong_key_yields_garbage() {
        let mut data = b"payload".to_vec();
        crypt(&mut data, b"right");
        crypt(&mut data, b"wrong");
        assert_ne!(data, b"payload");
    }
}
