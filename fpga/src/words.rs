//! Codec between big integers and the MSU's word-per-slot wire layout.
//!
//! Inbound operands are nonredundant: one `word_len`-bit word per u32 slot,
//! least significant first, redundant slots zero. Outbound results may carry
//! up to 32 bits per slot; summing `w_i * 2^(i*word_len)` resolves the
//! deferred carries in one pass.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::geometry::{Geometry, T_WORDS};
use crate::{Error, Job, JobOutput, Result};

/// Split a value into wire words. Fails if it does not fit the nonredundant
/// capacity of `geometry`; redundant slots come back zeroed.
pub fn encode(value: &BigUint, geometry: &Geometry) -> Result<Vec<u32>> {
    if value.bits() > geometry.capacity_bits() {
        return Err(Error::OperandTooLarge {
            bits: geometry.capacity_bits(),
        });
    }
    let mask = BigUint::from(((1u64 << geometry.word_len) - 1) as u32);
    let mut v = value.clone();
    let mut words = Vec::with_capacity(geometry.num_elements());
    for _ in 0..geometry.nonredundant_elements {
        words.push((&v & &mask).to_u32().unwrap_or(0));
        v >>= geometry.word_len;
    }
    words.resize(geometry.num_elements(), 0);
    Ok(words)
}

/// Reassemble a value from wire words. Accepts the device's redundant form:
/// any slot may exceed `word_len` bits and its excess carries into the next
/// position.
pub fn decode(words: &[u32], geometry: &Geometry) -> BigUint {
    let mut acc = BigUint::zero();
    for &w in words.iter().rev() {
        acc = (acc << geometry.word_len) + w;
    }
    acc
}

/// Lay out one input buffer: `t_start`, `t_final`, then the encoded operand.
pub fn pack_job(job: &Job, geometry: &Geometry) -> Result<Vec<u32>> {
    if job.t_start > job.t_final {
        return Err(Error::Config(format!(
            "t_start {} exceeds t_final {}",
            job.t_start, job.t_final
        )));
    }
    let mut words = Vec::with_capacity(geometry.words_in());
    words.extend_from_slice(&split_u64(job.t_start));
    words.extend_from_slice(&split_u64(job.t_final));
    words.extend_from_slice(&encode(&job.sq_in, geometry)?);
    Ok(words)
}

/// Parse an input buffer back into `(t_start, t_final, sq_in)`.
pub fn unpack_job(words: &[u32], geometry: &Geometry) -> Result<(u64, u64, BigUint)> {
    if words.len() != geometry.words_in() {
        return Err(Error::Config(format!(
            "input buffer has {} words, geometry needs {}",
            words.len(),
            geometry.words_in()
        )));
    }
    let t_start = join_u64(words[0], words[1]);
    let t_final = join_u64(words[2], words[3]);
    let sq_in = decode(&words[2 * T_WORDS..], geometry);
    Ok((t_start, t_final, sq_in))
}

/// Lay out one output buffer: `t_curr` then the encoded result.
pub fn pack_output(sq_out: &BigUint, t_curr: u64, geometry: &Geometry) -> Result<Vec<u32>> {
    let mut words = Vec::with_capacity(geometry.words_out());
    words.extend_from_slice(&split_u64(t_curr));
    words.extend_from_slice(&encode(sq_out, geometry)?);
    Ok(words)
}

/// Parse an output buffer, resolving any redundant carries in the result.
pub fn unpack_output(words: &[u32], geometry: &Geometry) -> Result<JobOutput> {
    if words.len() != geometry.words_out() {
        return Err(Error::Config(format!(
            "output buffer has {} words, geometry needs {}",
            words.len(),
            geometry.words_out()
        )));
    }
    Ok(JobOutput {
        t_curr: join_u64(words[0], words[1]),
        sq_out: decode(&words[T_WORDS..], geometry),
    })
}

fn split_u64(x: u64) -> [u32; 2] {
    [x as u32, (x >> 32) as u32]
}

fn join_u64(lo: u32, hi: u32) -> u64 {
    (hi as u64) << 32 | lo as u64
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn job(sq_in: u64, t_start: u64, t_final: u64) -> Job {
        Job {
            sq_in: BigUint::from(sq_in),
            t_start,
            t_final,
            emulate: false,
        }
    }

    #[test]
    fn encode_fills_slots_little_endian() {
        let g = Geometry::default();
        let words = encode(&BigUint::from(0x0003_0002_0001u64), &g).unwrap();
        assert_eq!(words, vec![1, 2, 3, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn oversized_operand_does_not_encode() {
        let g = Geometry::default();
        let too_big = BigUint::from(1u32) << g.capacity_bits();
        assert!(matches!(
            encode(&too_big, &g),
            Err(Error::OperandTooLarge { bits: 128 })
        ));
        let max = (BigUint::from(1u32) << g.capacity_bits()) - 1u32;
        assert!(encode(&max, &g).is_ok());
    }

    #[test]
    fn decode_resolves_redundant_carries() {
        let g = Geometry::new(8, 2, 1, 0).unwrap();
        // 260 overflows an 8-bit word; its excess rides into the next slot.
        assert_eq!(decode(&[260, 3, 0], &g), BigUint::from(1028u32));
        assert_eq!(decode(&[4, 4, 0], &g), BigUint::from(1028u32));
    }

    #[test]
    fn full_width_words_round_trip() {
        let g = Geometry::new(32, 4, 0, 0).unwrap();
        let v = BigUint::from(0xdead_beef_0bad_f00du64);
        assert_eq!(decode(&encode(&v, &g).unwrap(), &g), v);
    }

    #[test]
    fn pack_job_places_counters_first() {
        let g = Geometry::default();
        let words = pack_job(&job(7, 0x1_0000_0005, 0x2_0000_0009), &g).unwrap();
        assert_eq!(words.len(), g.words_in());
        assert_eq!(&words[..4], &[5, 1, 9, 2]);
        assert_eq!(words[4], 7);
        let (t_start, t_final, sq_in) = unpack_job(&words, &g).unwrap();
        assert_eq!(t_start, 0x1_0000_0005);
        assert_eq!(t_final, 0x2_0000_0009);
        assert_eq!(sq_in, BigUint::from(7u32));
    }

    #[test]
    fn pack_job_rejects_reversed_interval() {
        let g = Geometry::default();
        assert!(pack_job(&job(7, 10, 3), &g).is_err());
    }

    #[test]
    fn output_round_trips_through_buffer() {
        let g = Geometry::default();
        let words = pack_output(&BigUint::from(54u32), 3, &g).unwrap();
        assert_eq!(words.len(), g.words_out());
        let out = unpack_output(&words, &g).unwrap();
        assert_eq!(out.t_curr, 3);
        assert_eq!(out.sq_out, BigUint::from(54u32));
    }

    #[test]
    fn unpack_checks_buffer_length() {
        let g = Geometry::default();
        assert!(unpack_job(&[0; 3], &g).is_err());
        assert!(unpack_output(&[0; 3], &g).is_err());
    }

    proptest! {
        #[test]
        fn encode_decode_round_trip(v in any::<u128>()) {
            let g = Geometry::default();
            let v = BigUint::from(v);
            prop_assert_eq!(decode(&encode(&v, &g).unwrap(), &g), v);
        }

        #[test]
        fn round_trip_survives_odd_word_lens(v in any::<u64>(), word_len in 1u32..=32) {
            let g = Geometry::new(word_len, (64 + word_len - 1) as usize / word_len as usize, 2, 0).unwrap();
            let v = BigUint::from(v);
            prop_assert_eq!(decode(&encode(&v, &g).unwrap(), &g), v);
        }
    }
}
