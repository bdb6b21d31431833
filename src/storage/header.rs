//! Self-describing binary file header.
//!
//! Every binary store file starts with a fixed header so the files are
//! independent of their producer: magic, role, element type and count.
//! The header is padded to 24 bytes, keeping the payload 8-byte aligned
//! for in-place `u64`/`i64` views. All integers are little-endian.

#[cfg(target_endian = "big")]
compile_error!("the compiled store format is little-endian only");

pub const MAGIC: [u8; 4] = *b"CFM1";
pub const HEADER_LEN: usize = 24;

/// Role of a binary file within the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FileKind {
    Array = 1,
    CsrIndptr = 2,
    CsrData = 3,
    CsrValues = 4,
    PoolBytes = 5,
    PoolOffsets = 6,
    PoolIndex = 7,
}

impl FileKind {
    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => FileKind::Array,
            2 => FileKind::CsrIndptr,
            3 => FileKind::CsrData,
            4 => FileKind::CsrValues,
            5 => FileKind::PoolBytes,
            6 => FileKind::PoolOffsets,
            7 => FileKind::PoolIndex,
            _ => return None,
        })
    }
}

/// Element type of a binary file's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Dtype {
    U8 = 1,
    U16 = 2,
    U32 = 3,
    U64 = 4,
    I64 = 5,
}

impl Dtype {
    pub fn item_size(self) -> usize {
        match self {
            Dtype::U8 => 1,
            Dtype::U16 => 2,
            Dtype::U32 => 4,
            Dtype::U64 | Dtype::I64 => 8,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Dtype::U8,
            2 => Dtype::U16,
            3 => Dtype::U32,
            4 => Dtype::U64,
            5 => Dtype::I64,
            _ => return None,
        })
    }
}

/// Decoded header of a binary store file. `rank` is always 1 in the
/// current format; `shape` is the element count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinHeader {
    pub kind: FileKind,
    pub dtype: Dtype,
    pub shape: u64,
}

impl BinHeader {
    pub fn new(kind: FileKind, dtype: Dtype, shape: u64) -> Self {
        Self { kind, dtype, shape }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&MAGIC);
        out[4] = self.kind as u8;
        out[5] = self.dtype as u8;
        out[6] = 1; // rank
        out[7] = 0; // reserved
        out[8..16].copy_from_slice(&self.shape.to_le_bytes());
        out[16..20].copy_from_slice(&(self.dtype.item_size() as u32).to_le_bytes());
        // bytes 20..24 are padding
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < HEADER_LEN {
            return Err(format!(
                "file too short for header: {} bytes",
                bytes.len()
            ));
        }
        if bytes[0..4] != MAGIC {
            return Err(format!("bad magic {:?}", &bytes[0..4]));
        }
        let kind = FileKind::from_code(bytes[4])
            .ok_or_else(|| format!("unknown file kind {}", bytes[4]))?;
        let dtype = Dtype::from_code(bytes[5])
            .ok_or_else(|| format!("unknown dtype {}", bytes[5]))?;
        if bytes[6] != 1 {
            return Err(format!("unsupported rank {}", bytes[6]));
        }
        let shape = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        let item_size = u32::from_le_bytes(bytes[16..20].try_into().unwrap());
        if item_size as usize != dtype.item_size() {
            return Err(format!(
                "item size {item_size} does not match dtype {dtype:?}"
            ));
        }
        Ok(Self { kind, dtype, shape })
    }

    /// Total file length implied by this header.
    pub fn expected_file_len(&self) -> u64 {
        HEADER_LEN as u64 + self.shape * self.dtype.item_size() as u64
    }
}
