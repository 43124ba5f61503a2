//! Reduction table files.
//!
//! Designs built with URAM-backed reduction memories expect the host to push
//! the precomputed tables at startup, one `.dat` file per bank, produced by
//! the same generator that built the bitstream. Designs with tables baked
//! into block RAM set `num_urams` to zero and skip all of this.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Path of the table file for one URAM bank.
pub fn table_file(dir: &Path, bank: usize) -> PathBuf {
    dir.join(format!("reduction_lut_{bank:02}.dat"))
}

/// Read the raw table images for `num_urams` banks. A missing or unreadable
/// file is fatal.
pub fn load(dir: &Path, num_urams: usize) -> Result<Vec<Vec<u8>>> {
    let mut banks = Vec::with_capacity(num_urams);
    for bank in 0..num_urams {
        let path = table_file(dir, bank);
        let bytes = fs::read(&path).map_err(|source| Error::ReductionTable {
            path: path.clone(),
            source,
        })?;
        banks.push(bytes);
    }
    Ok(banks)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::env;
    use std::fs;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("msu-tables-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn bank_files_are_numbered_two_wide() {
        let p = table_file(Path::new("mem"), 3);
        assert_eq!(p, Path::new("mem").join("reduction_lut_03.dat"));
    }

    #[test]
    fn loads_every_bank_in_order() {
        let dir = scratch_dir("ok");
        fs::write(table_file(&dir, 0), [1u8, 2, 3]).unwrap();
        fs::write(table_file(&dir, 1), [4u8]).unwrap();
        let banks = load(&dir, 2).unwrap();
        assert_eq!(banks, vec![vec![1, 2, 3], vec![4]]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn zero_banks_reads_nothing() {
        let banks = load(Path::new("/definitely/not/here"), 0).unwrap();
        assert!(banks.is_empty());
    }

    #[test]
    fn missing_bank_names_the_file() {
        let dir = scratch_dir("missing");
        fs::write(table_file(&dir, 0), [0u8]).unwrap();
        let err = load(&dir, 2).unwrap_err();
        match err {
            Error::ReductionTable { path, .. } => assert_eq!(path, table_file(&dir, 1)),
            other => panic!("unexpected error: {other}"),
        }
        fs::remove_dir_all(&dir).unwrap();
    }
}
