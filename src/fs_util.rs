use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use camino::Utf8Path;
use flate2::read::MultiGzDecoder;

use crate::error::KiraError;

/// Opens an input file for line reading, decompressing `.gz` files.
pub fn open_input(path: &Utf8Path) -> Result<Box<dyn BufRead>, KiraError> {
    let file = File::open(path.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("open {path}: {err}")))?;
    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

/// Number of lines in the input, used to size progress reporting.
pub fn count_lines(path: &Utf8Path) -> Result<usize, KiraError> {
    let mut reader = open_input(path)?;
    let mut count = 0usize;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))?;
        if read == 0 {
            break;
        }
        count += 1;
    }
    Ok(count)
}

fn is_gzip(path: &Utf8Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}
