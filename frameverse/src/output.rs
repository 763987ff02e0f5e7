use std::io::Write;

use bitplane::BitMatrix;

/// The three measurement output encodings.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SampleFormat {
    /// ASCII `'0'`/`'1'` characters, one shot per line.
    Ascii01,
    /// Little-endian packed bytes per shot: bit k of byte k/8 is
    /// measurement k.
    Bytes8,
    /// Bit-transposed packed 64-bit words: 64-shot groups, 8 bytes per
    /// measurement, shots along the long axis.
    PackedTransposed64,
}

impl SampleFormat {
    #[must_use]
    pub fn from_name(name: &str) -> Option<SampleFormat> {
        Some(match name {
            "01" => SampleFormat::Ascii01,
            "b8" => SampleFormat::Bytes8,
            "ptb64" => SampleFormat::PackedTransposed64,
            _ => return None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SampleFormat::Ascii01 => "01",
            SampleFormat::Bytes8 => "b8",
            SampleFormat::PackedTransposed64 => "ptb64",
        }
    }
}

/// Write the first `shots` columns of a measurement-major out table.
pub fn write_batch(
    writer: &mut impl Write,
    out_table: &BitMatrix,
    shots: usize,
    format: SampleFormat,
) -> std::io::Result<()> {
    match format {
        SampleFormat::Ascii01 => write_01(writer, out_table, shots),
        SampleFormat::Bytes8 => write_b8(writer, out_table, shots),
        SampleFormat::PackedTransposed64 => write_ptb64(writer, out_table, shots),
    }
}

fn write_01(writer: &mut impl Write, out_table: &BitMatrix, shots: usize) -> std::io::Result<()> {
    let num_measurements = out_table.row_count();
    let mut line = vec![0u8; num_measurements + 1];
    line[num_measurements] = b'\n';
    for shot in 0..shots {
        for (measurement, byte) in line[..num_measurements].iter_mut().enumerate() {
            *byte = b'0' + u8::from(out_table.get((measurement, shot)));
        }
        writer.write_all(&line)?;
    }
    Ok(())
}

fn write_b8(writer: &mut impl Write, out_table: &BitMatrix, shots: usize) -> std::io::Result<()> {
    let num_measurements = out_table.row_count();
    let bytes_per_shot = num_measurements.div_ceil(8);
    let mut encoded = vec![0u8; bytes_per_shot];
    for shot in 0..shots {
        encoded.fill(0);
        for measurement in 0..num_measurements {
            if out_table.get((measurement, shot)) {
                encoded[measurement / 8] |= 1 << (measurement % 8);
            }
        }
        writer.write_all(&encoded)?;
    }
    Ok(())
}

fn write_ptb64(writer: &mut impl Write, out_table: &BitMatrix, shots: usize) -> std::io::Result<()> {
    let num_measurements = out_table.row_count();
    for group in 0..shots.div_ceil(64) {
        let shots_in_group = (shots - group * 64).min(64);
        let mask = if shots_in_group == 64 {
            u64::MAX
        } else {
            (1u64 << shots_in_group) - 1
        };
        for measurement in 0..num_measurements {
            let word = out_table.row_words(measurement)[group] & mask;
            writer.write_all(&word.to_le_bytes())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_from_rows(rows: &[&[bool]], columns: usize) -> BitMatrix {
        let mut table = BitMatrix::zeros(rows.len(), columns);
        for (row_index, row) in rows.iter().enumerate() {
            for (column, &bit) in row.iter().enumerate() {
                table.set((row_index, column), bit);
            }
        }
        table
    }

    #[test]
    fn format_names_round_trip() {
        for format in [
            SampleFormat::Ascii01,
            SampleFormat::Bytes8,
            SampleFormat::PackedTransposed64,
        ] {
            assert_eq!(SampleFormat::from_name(format.name()), Some(format));
        }
        assert_eq!(SampleFormat::from_name("base64"), None);
    }

    #[test]
    fn ascii_format_is_one_shot_per_line() {
        // shot 0 measures 10, shot 1 measures 01, shot 2 measures 11
        let table = table_from_rows(&[&[true, false, true], &[false, true, true]], 256);
        let mut encoded = Vec::new();
        write_batch(&mut encoded, &table, 3, SampleFormat::Ascii01).unwrap();
        assert_eq!(encoded, b"10\n01\n11\n");
    }

    #[test]
    fn b8_format_packs_measurement_bits_little_endian() {
        // 9 measurements, shot 0 has bits 0 and 8 set
        let mut table = BitMatrix::zeros(9, 256);
        table.set((0, 0), true);
        table.set((8, 0), true);
        table.set((1, 1), true);
        let mut encoded = Vec::new();
        write_batch(&mut encoded, &table, 2, SampleFormat::Bytes8).unwrap();
        assert_eq!(encoded, &[0b0000_0001, 0b0000_0001, 0b0000_0010, 0b0000_0000]);
    }

    #[test]
    fn ptb64_format_packs_shots_into_words() {
        let mut table = BitMatrix::zeros(2, 256);
        table.set((0, 0), true);
        table.set((0, 63), true);
        table.set((1, 65), true);
        let mut encoded = Vec::new();
        write_batch(&mut encoded, &table, 66, SampleFormat::PackedTransposed64).unwrap();
        assert_eq!(encoded.len(), 2 * 2 * 8);
        let word = |index: usize| u64::from_le_bytes(encoded[index * 8..(index + 1) * 8].try_into().unwrap());
        // group 0: measurement 0 has shots 0 and 63
        assert_eq!(word(0), 1 | (1 << 63));
        assert_eq!(word(1), 0);
        // group 1: measurement 1 has shot 65 (bit 1), masked to 2 shots
        assert_eq!(word(2), 0);
        assert_eq!(word(3), 1 << 1);
    }

    #[test]
    fn ptb64_masks_shots_beyond_the_requested_count() {
        let mut table = BitMatrix::zeros(1, 256);
        for shot in 0..256 {
            table.set((0, shot), true);
        }
        let mut encoded = Vec::new();
        write_batch(&mut encoded, &table, 10, SampleFormat::PackedTransposed64).unwrap();
        assert_eq!(encoded.len(), 8);
        assert_eq!(u64::from_le_bytes(encoded.try_into().unwrap()), (1 << 10) - 1);
    }
}
