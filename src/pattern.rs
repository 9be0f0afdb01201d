//! Reproducible test data. Nothing here is stored: the writer and the checker
//! each run the same generator from the same seed.

/// Seed of the read-leveling pattern.
pub const READ_PATTERN_SEED: u32 = 42;

pub fn seed_to_data_32(seed: u32, random: bool) -> u32 {
    if random {
        seed.wrapping_mul(1664525).wrapping_add(1013904223)
    } else {
        seed.wrapping_add(1)
    }
}

pub fn seed_to_data_16(seed: u16, random: bool) -> u16 {
    if random {
        seed.wrapping_mul(25173).wrapping_add(13849)
    } else {
        seed.wrapping_add(1)
    }
}

/// 32-bit linear congruential sequence (or a counter when not `random`).
#[derive(Debug, Clone)]
pub struct Prng32 {
    seed: u32,
    random: bool,
}

impl Prng32 {
    pub fn new(seed: u32, random: bool) -> Prng32 {
        Prng32 { seed, random }
    }
}

impl Iterator for Prng32 {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        self.seed = seed_to_data_32(self.seed, self.random);
        Some(self.seed)
    }
}

/// 16-bit linear congruential sequence (or a counter when not `random`).
#[derive(Debug, Clone)]
pub struct Prng16 {
    seed: u16,
    random: bool,
}

impl Prng16 {
    pub fn new(seed: u16, random: bool) -> Prng16 {
        Prng16 { seed, random }
    }
}

impl Iterator for Prng16 {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        self.seed = seed_to_data_16(self.seed, self.random);
        Some(self.seed)
    }
}

/// Bytes written to the data registers during read leveling, phase-major:
/// item `p * pix_data_size + offset` belongs to register `offset` of phase `p`.
pub fn read_pattern() -> impl Iterator<Item = u8> + Clone {
    Prng32::new(READ_PATTERN_SEED, true).map(|word| word as u8)
}
