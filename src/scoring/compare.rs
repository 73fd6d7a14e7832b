use sha2::{Digest, Sha256};

use crate::models::Region;

/// Grid side for highlighted comparison regions.
const GRID: u8 = 8;

/// Cells at or above this derived intensity are reported as regions.
const REGION_THRESHOLD: u8 = 128;

/// Compare two artifacts by their hex SHA-256 checksums.
///
/// Similarity is 1 minus the normalized Hamming distance between the two
/// digests; identical artifacts compare to exactly 1.0 and the measure is
/// symmetric. Highlighted regions come from a digest of both checksums
/// mapped onto an 8×8 grid — one nibble per cell. Undecodable or
/// mismatched checksums compare to 0.0 with no regions.
pub fn compare_checksums(left: &str, right: &str) -> (f64, Vec<Region>) {
    let (Some(left_bytes), Some(right_bytes)) = (decode_hex(left), decode_hex(right)) else {
        return (0.0, Vec::new());
    };
    if left_bytes.len() != right_bytes.len() || left_bytes.is_empty() {
        return (0.0, Vec::new());
    }

    let differing_bits: u32 = left_bytes
        .iter()
        .zip(&right_bytes)
        .map(|(a, b)| (a ^ b).count_ones())
        .sum();
    let total_bits = (left_bytes.len() * 8) as f64;
    let similarity = (1.0 - f64::from(differing_bits) / total_bits).clamp(0.0, 1.0);

    (similarity, derive_regions(left, right))
}

/// Map a combined digest of both checksums onto the grid: 32 bytes give
/// 64 nibbles, one per cell, scaled to 0..=255.
fn derive_regions(left: &str, right: &str) -> Vec<Region> {
    // Order-independent so compare(a, b) mirrors compare(b, a)
    let (first, second) = if left <= right { (left, right) } else { (right, left) };
    let mut hasher = Sha256::new();
    hasher.update(first.as_bytes());
    hasher.update(second.as_bytes());
    let digest = hasher.finalize();

    let mut regions = Vec::new();
    for cell in 0..(GRID as usize * GRID as usize) {
        let byte = digest[cell / 2];
        let nibble = if cell % 2 == 0 { byte >> 4 } else { byte & 0x0F };
        let intensity = nibble * 17; // spread 0..=15 over 0..=255
        if intensity >= REGION_THRESHOLD {
            regions.push(Region {
                row: (cell / GRID as usize) as u8,
                col: (cell % GRID as usize) as u8,
                intensity,
            });
        }
    }
    regions
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Hex SHA-256 digest of raw content, as stored on `CaseArtifact`.
pub fn content_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_checksums_compare_to_one() {
        let sum = content_checksum(b"same bytes");
        let (similarity, _) = compare_checksums(&sum, &sum);
        assert_eq!(similarity, 1.0);
    }

    #[test]
    fn comparison_is_symmetric() {
        let a = content_checksum(b"left");
        let b = content_checksum(b"right");
        let (s1, r1) = compare_checksums(&a, &b);
        let (s2, r2) = compare_checksums(&b, &a);
        assert_eq!(s1, s2);
        assert_eq!(r1, r2);
    }

    #[test]
    fn similarity_stays_in_unit_interval() {
        let a = content_checksum(b"one");
        let b = content_checksum(b"two");
        let (similarity, _) = compare_checksums(&a, &b);
        assert!((0.0..=1.0).contains(&similarity));
        // Distinct random-looking digests should land near 0.5
        assert!(similarity > 0.2 && similarity < 0.8);
    }

    #[test]
    fn invalid_checksum_compares_to_zero() {
        let good = content_checksum(b"x");
        assert_eq!(compare_checksums("zzzz", &good).0, 0.0);
        assert_eq!(compare_checksums("abc", &good).0, 0.0); // odd length
        assert_eq!(compare_checksums("", "").0, 0.0);
    }

    #[test]
    fn regions_fit_grid_and_are_deterministic() {
        let a = content_checksum(b"scan-1");
        let b = content_checksum(b"scan-2");
        let (_, regions) = compare_checksums(&a, &b);
        let (_, regions_again) = compare_checksums(&a, &b);
        assert_eq!(regions, regions_again);
        for r in &regions {
            assert!(r.row < GRID);
            assert!(r.col < GRID);
            assert!(r.intensity >= REGION_THRESHOLD);
        }
    }

    #[test]
    fn content_checksum_is_hex_sha256() {
        let sum = content_checksum(b"");
        assert_eq!(sum.len(), 64);
        // Known SHA-256 of empty input
        assert_eq!(
            sum,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
