//! HPACK header compression, RFC 7541.
//!
//! The encoder only ever emits the static-table-indexed and literal forms; it
//! never performs incremental indexing (so its dynamic table stays empty) and
//! never Huffman-codes output. Both are conformant choices RFC 7541 leaves to
//! the implementation, and keeping the encoder's output deterministic and
//! table-free avoids a whole class of encoder/decoder table-sync bugs for a
//! one-shot response encoder. The decoder fully implements both.

mod dynamic_table;
mod huffman;
mod static_table;

use dynamic_table::Table;

pub type Header = (String, String);

const MAX_LITERAL_LEN: usize = 65_536;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum HpackError {
    #[error("header block ended mid-representation")]
    Truncated,
    #[error("integer representation used more than 10 continuation bytes")]
    IntegerOverflow,
    #[error("index {0} does not name a static or dynamic table entry")]
    InvalidIndex(usize),
    #[error("dynamic table size update must precede all header field representations")]
    SizeUpdateNotAtStart,
    #[error("dynamic table size update exceeds the advertised SETTINGS_HEADER_TABLE_SIZE")]
    TableSizeUpdateTooLarge,
    #[error("Huffman-coded string is malformed")]
    HuffmanError,
    #[error("literal exceeds the maximum permitted length")]
    LiteralTooLarge,
    #[error("header string is not valid UTF-8")]
    InvalidUtf8,
}

fn encode_integer(value: u64, prefix_bits: u8, marker: u8) -> Vec<u8> {
    let max_prefix = (1u64 << prefix_bits) - 1;
    let mut out = Vec::new();
    if value < max_prefix {
        out.push(marker | value as u8);
        return out;
    }
    out.push(marker | max_prefix as u8);
    let mut remaining = value - max_prefix;
    while remaining >= 128 {
        out.push(((remaining % 128) as u8) | 0x80);
        remaining /= 128;
    }
    out.push(remaining as u8);
    out
}

/// Returns `(value, bytes consumed)`. Enforces the two guards the header
/// listed as decoder responsibilities: at most 10 continuation bytes, and a
/// shift that never reaches 57 (which would overflow a 64-bit accumulator on
/// the next continuation byte).
fn decode_integer(buf: &[u8], prefix_bits: u8) -> Result<(u64, usize), HpackError> {
    let mask = ((1u16 << prefix_bits) - 1) as u8;
    let first = *buf.first().ok_or(HpackError::Truncated)?;
    let value = (first & mask) as u64;
    if value < mask as u64 {
        return Ok((value, 1));
    }

    let mut value = value;
    let mut shift: u32 = 0;
    let mut cont_bytes: u32 = 0;
    let mut idx = 1;
    loop {
        let b = *buf.get(idx).ok_or(HpackError::Truncated)?;
        idx += 1;
        cont_bytes += 1;
        if cont_bytes > 10 {
            return Err(HpackError::IntegerOverflow);
        }
        if shift >= 57 {
            return Err(HpackError::IntegerOverflow);
        }
        value += ((b & 0x7f) as u64) << shift;
        shift += 7;
        if b & 0x80 == 0 {
            break;
        }
    }
    Ok((value, idx))
}

fn encode_string(s: &str) -> Vec<u8> {
    let mut out = encode_integer(s.len() as u64, 7, 0x00);
    out.extend_from_slice(s.as_bytes());
    out
}

fn decode_string(buf: &[u8]) -> Result<(String, usize), HpackError> {
    let first = *buf.first().ok_or(HpackError::Truncated)?;
    let huffman = first & 0x80 != 0;
    let (len, int_len) = decode_integer(buf, 7)?;
    let start = int_len;
    let end = start
        .checked_add(len as usize)
        .ok_or(HpackError::Truncated)?;
    let raw = buf.get(start..end).ok_or(HpackError::Truncated)?;
    let bytes = if huffman {
        huffman::decode(raw).map_err(|_| HpackError::HuffmanError)?
    } else {
        raw.to_vec()
    };
    if bytes.len() > MAX_LITERAL_LEN {
        return Err(HpackError::LiteralTooLarge);
    }
    let s = String::from_utf8(bytes).map_err(|_| HpackError::InvalidUtf8)?;
    Ok((s, end))
}

/// Encodes header lists into header block fragments. Holds no state across
/// calls: see the module-level note on why it never indexes.
#[derive(Default)]
pub struct Encoder;

impl Encoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn encode(&self, headers: &[Header]) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, value) in headers {
            let (name_idx, exact_idx) = static_table::find(name, value);
            if let Some(idx) = exact_idx {
                out.extend(encode_integer(idx as u64, 7, 0x80));
            } else if let Some(idx) = name_idx {
                out.extend(encode_integer(idx as u64, 4, 0x00));
                out.extend(encode_string(value));
            } else {
                out.push(0x00);
                out.extend(encode_string(name));
                out.extend(encode_string(value));
            }
        }
        out
    }
}

/// Decodes header block fragments, maintaining the dynamic table that
/// incremental-indexing representations from the peer populate.
pub struct Decoder {
    table: Table,
    settings_max_size: usize,
}

impl Decoder {
    #[must_use]
    pub fn new(settings_max_size: usize) -> Self {
        Self {
            table: Table::with_max_size(settings_max_size),
            settings_max_size,
        }
    }

    /// Called when the locally advertised SETTINGS_HEADER_TABLE_SIZE changes;
    /// a shrink also caps what a subsequent size-update instruction may ask
    /// for.
    pub fn set_settings_max_size(&mut self, size: usize) {
        self.settings_max_size = size;
        if self.table.max_size() > size {
            self.table.set_max_size(size);
        }
    }

    pub fn decode_block(&mut self, block: &[u8]) -> Result<Vec<Header>, HpackError> {
        let mut headers = Vec::new();
        let mut pos = 0;
        let mut seen_header_field = false;

        while pos < block.len() {
            let byte = block[pos];
            if byte & 0x80 != 0 {
                let (index, used) = decode_integer(&block[pos..], 7)?;
                pos += used;
                headers.push(self.lookup(index as usize)?);
                seen_header_field = true;
            } else if byte & 0x40 != 0 {
                let (index, used) = decode_integer(&block[pos..], 6)?;
                pos += used;
                let (name, value, consumed) = self.read_literal(&block[pos..], index as usize)?;
                pos += consumed;
                self.table.push(name.clone(), value.clone());
                headers.push((name, value));
                seen_header_field = true;
            } else if byte & 0x20 != 0 {
                if seen_header_field {
                    return Err(HpackError::SizeUpdateNotAtStart);
                }
                let (size, used) = decode_integer(&block[pos..], 5)?;
                pos += used;
                if size as usize > self.settings_max_size {
                    return Err(HpackError::TableSizeUpdateTooLarge);
                }
                self.table.set_max_size(size as usize);
            } else {
                // 0001xxxx (never indexed) and 0000xxxx (without indexing)
                // decode identically; the distinction only binds a forwarding
                // proxy, which this decoder is not.
                let (index, used) = decode_integer(&block[pos..], 4)?;
                pos += used;
                let (name, value, consumed) = self.read_literal(&block[pos..], index as usize)?;
                pos += consumed;
                headers.push((name, value));
                seen_header_field = true;
            }
        }
        Ok(headers)
    }

    fn lookup(&self, index: usize) -> Result<Header, HpackError> {
        if index == 0 {
            return Err(HpackError::InvalidIndex(0));
        }
        if index <= static_table::STATIC_TABLE.len() {
            let (n, v) = static_table::lookup(index).ok_or(HpackError::InvalidIndex(index))?;
            Ok((n.to_string(), v.to_string()))
        } else {
            let entry = self
                .table
                .get(index - static_table::STATIC_TABLE.len())
                .ok_or(HpackError::InvalidIndex(index))?;
            Ok((entry.name.clone(), entry.value.clone()))
        }
    }

    fn read_literal(&self, buf: &[u8], index: usize) -> Result<(String, String, usize), HpackError> {
        let (name, name_consumed) = if index == 0 {
            decode_string(buf)?
        } else {
            let (name, _) = self.lookup(index)?;
            (name, 0)
        };
        let (value, value_consumed) = decode_string(&buf[name_consumed..])?;
        Ok((name, value, name_consumed + value_consumed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_uses_indexed_form_for_exact_static_match() {
        let enc = Encoder::new();
        let out = enc.encode(&[(":method".into(), "GET".into())]);
        assert_eq!(out, vec![0x80 | 2]);
    }

    #[test]
    fn encoder_uses_literal_with_indexed_name_for_name_only_match() {
        let enc = Encoder::new();
        let out = enc.encode(&[(":path".into(), "/custom".into())]);
        // index 4 (":path") with prefix-4 literal-without-indexing marker 0x00
        assert_eq!(out[0], 4);
        let mut dec = Decoder::new(4096);
        assert_eq!(
            dec.decode_block(&out).unwrap(),
            vec![(":path".to_string(), "/custom".to_string())]
        );
    }

    #[test]
    fn encoder_uses_full_literal_for_no_match() {
        let enc = Encoder::new();
        let out = enc.encode(&[("x-custom".into(), "value".into())]);
        let mut dec = Decoder::new(4096);
        assert_eq!(
            dec.decode_block(&out).unwrap(),
            vec![("x-custom".to_string(), "value".to_string())]
        );
    }

    #[test]
    fn decoder_populates_dynamic_table_on_incremental_indexing() {
        let mut dec = Decoder::new(4096);
        // 0x40 | index(0, literal name) then "x-foo" / "bar" then indexed ref.
        let mut block = vec![0x40];
        block.extend(encode_string("x-foo"));
        block.extend(encode_string("bar"));
        let headers = dec.decode_block(&block).unwrap();
        assert_eq!(headers, vec![("x-foo".to_string(), "bar".to_string())]);

        // Index 62 is the first (most recent) dynamic table entry.
        let second = dec.decode_block(&[0x80 | 62]).unwrap();
        assert_eq!(second, vec![("x-foo".to_string(), "bar".to_string())]);
    }

    #[test]
    fn size_update_after_header_field_is_rejected() {
        let mut dec = Decoder::new(4096);
        let mut block = vec![0x80 | 2]; // indexed :method: GET
        block.push(0x20); // size update with size 0, arriving too late
        assert_eq!(
            dec.decode_block(&block),
            Err(HpackError::SizeUpdateNotAtStart)
        );
    }

    #[test]
    fn size_update_over_settings_budget_is_rejected() {
        let mut dec = Decoder::new(100);
        let block = encode_integer(200, 5, 0x20);
        assert_eq!(
            dec.decode_block(&block),
            Err(HpackError::TableSizeUpdateTooLarge)
        );
    }

    #[test]
    fn integer_decode_rejects_excess_continuation_bytes() {
        let mut block = vec![0xFF]; // prefix-4 all-ones, forces continuation
        block.extend(std::iter::repeat(0xFF).take(11));
        assert_eq!(
            decode_integer(&block, 4),
            Err(HpackError::IntegerOverflow)
        );
    }

    #[test]
    fn invalid_index_is_rejected() {
        let mut dec = Decoder::new(4096);
        assert_eq!(
            dec.decode_block(&[0x80 | 0x7f, 0x00]),
            Err(HpackError::InvalidIndex(127))
        );
    }
}
