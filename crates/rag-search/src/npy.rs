//! Minimal reader/writer for the subset of the NumPy `.npy` format this
//! crate needs: a row-major, C-contiguous, two-dimensional `float32`
//! array. No external crate in the example pack covers this, so it is
//! hand-rolled the same way the sparse vectorizer is.

use std::io::{self, Read, Write};

const MAGIC: &[u8] = b"\x93NUMPY";

/// Writes `rows` (each of equal length `cols`, row-major) as a `.npy` file.
pub fn write_f32_matrix<W: Write>(mut writer: W, rows: &[Vec<f32>]) -> io::Result<()> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);

    let header = format!(
        "{{'descr': '<f4', 'fortran_order': False, 'shape': ({n_rows}, {n_cols}), }}"
    );
    // Total preamble (magic + version + header-len field + header + \n)
    // must be a multiple of 64 bytes, per the NPY spec.
    let prefix_len = MAGIC.len() + 2 + 2;
    let unpadded = prefix_len + header.len() + 1;
    let padded_total = unpadded.div_ceil(64) * 64;
    let pad = padded_total - unpadded;
    let mut header = header;
    header.push_str(&" ".repeat(pad));
    header.push('\n');

    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    #[allow(clippy::cast_possible_truncation)]
    writer.write_all(&(header.len() as u16).to_le_bytes())?;
    writer.write_all(header.as_bytes())?;

    for row in rows {
        for value in row {
            writer.write_all(&value.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Reads a `.npy` file written by [`write_f32_matrix`] back into rows.
pub fn read_f32_matrix<R: Read>(mut reader: R) -> io::Result<Vec<Vec<f32>>> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "not an NPY file"));
    }
    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    let mut header_len_bytes = [0u8; 2];
    reader.read_exact(&mut header_len_bytes)?;
    let header_len = u16::from_le_bytes(header_len_bytes) as usize;
    let mut header_bytes = vec![0u8; header_len];
    reader.read_exact(&mut header_bytes)?;
    let header = String::from_utf8_lossy(&header_bytes);

    let (n_rows, n_cols) = parse_shape(&header)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing shape in NPY header"))?;

    if n_cols == 0 {
        return Ok(vec![Vec::new(); n_rows]);
    }

    let mut data = Vec::with_capacity(n_rows * n_cols);
    let mut buf = [0u8; 4];
    for _ in 0..(n_rows * n_cols) {
        reader.read_exact(&mut buf)?;
        data.push(f32::from_le_bytes(buf));
    }

    Ok(data.chunks_exact(n_cols).map(<[f32]>::to_vec).collect())
}

fn parse_shape(header: &str) -> Option<(usize, usize)> {
    let start = header.find("'shape':")? + "'shape':".len();
    let rest = &header[start..];
    let open = rest.find('(')?;
    let close = rest.find(')')?;
    let inner = &rest[open + 1..close];
    let mut parts = inner.split(',').filter_map(|p| p.trim().parse::<usize>().ok());
    let rows = parts.next()?;
    let cols = parts.next().unwrap_or(0);
    Some((rows, cols))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_small_matrix() {
        let rows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let mut buf = Vec::new();
        write_f32_matrix(&mut buf, &rows).unwrap();
        let read_back = read_f32_matrix(&buf[..]).unwrap();
        assert_eq!(read_back, rows);
    }

    #[test]
    fn round_trips_an_empty_matrix() {
        let rows: Vec<Vec<f32>> = Vec::new();
        let mut buf = Vec::new();
        write_f32_matrix(&mut buf, &rows).unwrap();
        let read_back = read_f32_matrix(&buf[..]).unwrap();
        assert!(read_back.is_empty());
    }
}
