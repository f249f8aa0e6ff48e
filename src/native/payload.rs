//! Fixed-layout structures handed to host functions.
//!
//! Layouts are written out byte by byte at documented offsets instead of
//! relying on struct packing, and each one has a layout test.

/// Extra bytes allocated past the text in the scratch buffer.
pub const SCRATCH_PADDING: usize = 30;

/// Size of the zeroed block the chat payload is written into.
pub const PAYLOAD_BLOCK_SIZE: usize = 400;

/// Encoded size of [`ChatPayload`].
pub const CHAT_PAYLOAD_SIZE: usize = 32;

/// Constant stored in the payload's first reserved field.
pub const CHAT_PAYLOAD_RESERVED: u64 = 64;

/// Byte offsets of [`ChatPayload`] fields.
pub mod chat_payload_offsets {
    /// Pointer to the NUL-terminated UTF-8 text.
    pub const TEXT_PTR: usize = 0;
    /// Reserved, always [`super::CHAT_PAYLOAD_RESERVED`].
    pub const RESERVED: usize = 8;
    /// Text length in bytes, including the terminator.
    pub const TEXT_LEN: usize = 16;
    /// Reserved, always zero.
    pub const RESERVED_ZERO: usize = 24;
}

/// Owned NUL-terminated copy of a message, alive for one host call.
#[derive(Debug)]
pub struct ScratchText {
    buffer: Vec<u8>,
    text_len: usize,
}

impl ScratchText {
    /// Copy `text` into a zeroed buffer of `len + SCRATCH_PADDING` bytes.
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut buffer = vec![0u8; bytes.len() + SCRATCH_PADDING];
        buffer[..bytes.len()].copy_from_slice(bytes);
        Self {
            buffer,
            text_len: bytes.len(),
        }
    }

    /// Address of the first text byte.
    pub fn as_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    /// Text length in bytes, without the terminator.
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    /// Allocated buffer size.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Text bytes followed by the terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buffer[..=self.text_len]
    }
}

/// Message argument of the host's chat-processing function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatPayload {
    /// Address of the NUL-terminated text.
    pub text_ptr: u64,
    /// Byte length including the terminator.
    pub text_len: u64,
}

impl ChatPayload {
    /// Describe `scratch` as a payload.
    pub fn for_text(scratch: &ScratchText) -> Self {
        Self {
            text_ptr: scratch.as_ptr() as u64,
            text_len: scratch.text_len() as u64 + 1,
        }
    }

    /// Encode into the host layout.
    pub fn encode(&self) -> [u8; CHAT_PAYLOAD_SIZE] {
        use chat_payload_offsets::*;

        let mut out = [0u8; CHAT_PAYLOAD_SIZE];
        out[TEXT_PTR..TEXT_PTR + 8].copy_from_slice(&self.text_ptr.to_le_bytes());
        out[RESERVED..RESERVED + 8].copy_from_slice(&CHAT_PAYLOAD_RESERVED.to_le_bytes());
        out[TEXT_LEN..TEXT_LEN + 8].copy_from_slice(&self.text_len.to_le_bytes());
        out[RESERVED_ZERO..RESERVED_ZERO + 8].copy_from_slice(&0u64.to_le_bytes());
        out
    }

    /// Decode from the host layout.
    pub fn decode(bytes: &[u8; CHAT_PAYLOAD_SIZE]) -> Self {
        use chat_payload_offsets::*;

        let field = |at: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[at..at + 8]);
            u64::from_le_bytes(raw)
        };
        Self {
            text_ptr: field(TEXT_PTR),
            text_len: field(TEXT_LEN),
        }
    }

    /// Zeroed payload block with the encoded payload at its start.
    pub fn to_block(&self) -> Box<[u8; PAYLOAD_BLOCK_SIZE]> {
        let mut block = Box::new([0u8; PAYLOAD_BLOCK_SIZE]);
        block[..CHAT_PAYLOAD_SIZE].copy_from_slice(&self.encode());
        block
    }
}

/// Size of the host's string object.
pub const NATIVE_STRING_SIZE: usize = 0x68;

/// Size of the host string's inline buffer.
pub const NATIVE_STRING_INLINE_SIZE: usize = 0x40;

/// An empty host string object using its inline buffer.
///
/// The object points into itself, so it lives on the heap and never moves.
#[repr(C)]
#[derive(Debug)]
pub struct NativeString {
    string_ptr: *const u8,
    buffer_size: i64,
    buffer_used: i64,
    string_length: i64,
    is_empty: u8,
    is_using_inline_buffer: u8,
    inline_buffer: [u8; NATIVE_STRING_INLINE_SIZE],
    _padding: [u8; 6],
}

impl NativeString {
    /// Allocate an empty string.
    pub fn empty() -> Box<Self> {
        let mut string = Box::new(Self {
            string_ptr: std::ptr::null(),
            buffer_size: NATIVE_STRING_INLINE_SIZE as i64,
            buffer_used: 1,
            string_length: 0,
            is_empty: 1,
            is_using_inline_buffer: 1,
            inline_buffer: [0; NATIVE_STRING_INLINE_SIZE],
            _padding: [0; 6],
        });
        string.string_ptr = string.inline_buffer.as_ptr();
        string
    }

    /// Address handed to host functions.
    pub fn as_ptr(&self) -> *const Self {
        self
    }
}

// SAFETY: the self-pointer targets the string's own heap allocation and is
// never written through from Rust; moving the box between threads is sound.
unsafe impl Send for NativeString {}
// SAFETY: shared references only read immutable fields.
unsafe impl Sync for NativeString {}
