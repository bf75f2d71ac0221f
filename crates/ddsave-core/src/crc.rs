// Checksum stored in the save header: reflected CRC-32 table, initial register
// 0xFFFFFFFF, no final xor.

const POLYNOMIAL: u32 = 0xEDB8_8320;

fn generate_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let mut x = i as u32;
        for _ in 0..8 {
            if x & 1 != 0 {
                x = (x >> 1) ^ POLYNOMIAL;
            } else {
                x >>= 1;
            }
        }
        *slot = x;
    }
    table
}

/// Checksum of the first `length` bytes of `block` (clamped to the slice).
pub fn checksum(block: &[u8], length: usize) -> u32 {
    let table = generate_table();
    let mut x: u32 = 0xFFFF_FFFF;
    for &b in &block[..length.min(block.len())] {
        x = (x >> 8) ^ table[((x ^ b as u32) & 0xFF) as usize];
    }
    x
}
