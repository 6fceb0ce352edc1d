//! RIFF WAV length backpatching.
//!
//! The encoder emits a complete fixed-layout RIFF header at the start of a
//! capture, but the two length fields can only be filled in once the final
//! size is known. Both live at fixed byte offsets in the 48-byte header
//! the device produces, so no header parsing is needed, just seek and
//! rewrite.

use std::io::{Seek, SeekFrom, Write};

use crate::models::error::DriverError;

/// Offset of the RIFF chunk size field (`final size − 8`).
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Offset of the data chunk size field (`final size − 48`).
pub const DATA_SIZE_OFFSET: u64 = 44;

const RIFF_SIZE_BIAS: u64 = 8;
const DATA_SIZE_BIAS: u64 = 48;

/// Rewrite both RIFF length fields for a capture of `final_size` bytes.
///
/// Fields saturate at zero for captures truncated below the fixed header;
/// such a file is already unplayable and a wrapped length would only make
/// it worse. A pipe or socket cannot take the patch, so pick a seekable
/// sink whenever the output format is RIFF.
pub fn patch_riff_lengths<S: Write + Seek>(
    sink: &mut S,
    final_size: u64,
) -> Result<(), DriverError> {
    let riff_len = final_size.saturating_sub(RIFF_SIZE_BIAS) as u32;
    let data_len = final_size.saturating_sub(DATA_SIZE_BIAS) as u32;

    sink.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))
        .map_err(|e| DriverError::Storage(e.to_string()))?;
    sink.write_all(&riff_len.to_le_bytes())
        .map_err(|e| DriverError::Storage(e.to_string()))?;

    sink.seek(SeekFrom::Start(DATA_SIZE_OFFSET))
        .map_err(|e| DriverError::Storage(e.to_string()))?;
    sink.write_all(&data_len.to_le_bytes())
        .map_err(|e| DriverError::Storage(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn field(data: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
    }

    fn patched(final_size: u64) -> Vec<u8> {
        let mut cursor = Cursor::new(vec![0u8; 64]);
        patch_riff_lengths(&mut cursor, final_size).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn thousand_byte_file() {
        let data = patched(1000);
        assert_eq!(field(&data, 4), 992);
        assert_eq!(field(&data, 44), 952);
    }

    #[test]
    fn several_sizes_round_trip() {
        for size in [49u64, 100, 4096, 1_000_000] {
            let data = patched(size);
            assert_eq!(field(&data, 4), (size - 8) as u32, "size {size}");
            assert_eq!(field(&data, 44), (size - 48) as u32, "size {size}");
        }
    }

    #[test]
    fn header_only_capture() {
        // Exactly the fixed header: the data chunk is empty.
        let data = patched(48);
        assert_eq!(field(&data, 4), 40);
        assert_eq!(field(&data, 44), 0);
    }

    #[test]
    fn degenerate_sizes_saturate() {
        let data = patched(8);
        assert_eq!(field(&data, 4), 0);
        assert_eq!(field(&data, 44), 0);
    }

    #[test]
    fn surrounding_bytes_untouched() {
        let mut cursor = Cursor::new((0u8..64).collect::<Vec<u8>>());
        patch_riff_lengths(&mut cursor, 1000).unwrap();
        let data = cursor.into_inner();
        assert_eq!(&data[0..4], &[0, 1, 2, 3]);
        assert_eq!(&data[8..44], (8u8..44).collect::<Vec<u8>>().as_slice());
        assert_eq!(&data[48..], (48u8..64).collect::<Vec<u8>>().as_slice());
    }
}
