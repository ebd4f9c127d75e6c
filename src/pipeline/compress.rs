//! Pixel data compression in the two schemes LVGL can decode.
//!
//! A compressed payload starts with three little-endian u32 values, method,
//! compressed size and original size, followed by the compressed bytes.
//!
//! RLE works on pixel-sized blocks. A control byte with the top bit set
//! introduces `ctrl & 0x7F` literal blocks; otherwise the single block that
//! follows repeats `ctrl` times.

use crate::format::Compression;
use tracing::debug;

/// Longest run a control byte can describe.
const MAX_RUN: usize = 127;

/// Repeats shorter than this are emitted as literals.
const RLE_THRESHOLD: usize = 16;

/// Compress `data` with `method`, returning the prefixed payload, or `None`
/// for [`Compression::None`].
pub fn compress(data: &[u8], method: Compression, block_size: usize) -> Option<Vec<u8>> {
    let body = match method {
        Compression::None => return None,
        Compression::Rle => rle_compress(data, block_size.max(1)),
        Compression::Lz4 => lz4_flex::block::compress(data),
    };

    debug!(
        "{} compressed {} → {} bytes",
        method.name(),
        data.len(),
        body.len()
    );

    let mut out = Vec::with_capacity(12 + body.len());
    out.extend_from_slice(&method.method_id().to_le_bytes());
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    Some(out)
}

/// RLE-encode `data` in `block_size` units, zero-padding the tail block.
pub fn rle_compress(data: &[u8], block_size: usize) -> Vec<u8> {
    let mut padded = data.to_vec();
    let rem = padded.len() % block_size;
    if rem != 0 {
        padded.resize(padded.len() + block_size - rem, 0);
    }

    let blocks: Vec<&[u8]> = padded.chunks_exact(block_size).collect();
    let repeat_at = |i: usize, limit: usize| {
        blocks[i..]
            .iter()
            .take(limit)
            .take_while(|&&b| b == blocks[i])
            .count()
    };

    let mut out = Vec::with_capacity(padded.len() / 2);
    let mut i = 0;
    while i < blocks.len() {
        let run = repeat_at(i, MAX_RUN);
        if run >= RLE_THRESHOLD {
            out.push(run as u8);
            out.extend_from_slice(blocks[i]);
            i += run;
            continue;
        }

        let start = i;
        while i < blocks.len() && i - start < MAX_RUN && repeat_at(i, RLE_THRESHOLD) < RLE_THRESHOLD
        {
            i += 1;
        }
        out.push(0x80 | (i - start) as u8);
        for b in &blocks[start..i] {
            out.extend_from_slice(b);
        }
    }
    out
}

#[cfg(test)]
fn rle_decompress(data: &[u8], block_size: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let ctrl = data[i] as usize;
        i += 1;
        if ctrl & 0x80 != 0 {
            let n = (ctrl & 0x7F) * block_size;
            out.extend_from_slice(&data[i..i + n]);
            i += n;
        } else {
            for _ in 0..ctrl {
                out.extend_from_slice(&data[i..i + block_size]);
            }
            i += block_size;
        }
    }
    out
}
