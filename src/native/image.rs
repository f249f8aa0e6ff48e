//! Locating the code section of the host's main module.

use goblin::pe::header::{Header, SIZEOF_COFF_HEADER, SIZEOF_PE_MAGIC};

use super::signature::Signature;
use super::NativeError;

/// Bytes of PE headers read from the module base.
pub const HEADER_SPAN: usize = 0x1000;

/// A section's placement relative to the module base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    /// Offset from the module base.
    pub virtual_address: usize,
    /// Size once mapped.
    pub virtual_size: usize,
}

/// Find the `.text` section in a mapped module's PE headers.
///
/// Only the header page is parsed; the rest of a mapped image is not laid
/// out like a file, so a full `PE::parse` does not apply.
pub fn find_text_section(headers: &[u8]) -> Result<SectionSpan, NativeError> {
    let invalid = |e: goblin::error::Error| NativeError::InvalidImage(e.to_string());

    let header = Header::parse(headers).map_err(invalid)?;
    let mut offset = header.dos_header.pe_pointer as usize
        + SIZEOF_PE_MAGIC
        + SIZEOF_COFF_HEADER
        + header.coff_header.size_of_optional_header as usize;
    let sections = header
        .coff_header
        .sections(headers, &mut offset)
        .map_err(invalid)?;

    sections
        .iter()
        .find(|section| section.name().ok() == Some(".text"))
        .map(|section| SectionSpan {
            virtual_address: section.virtual_address as usize,
            virtual_size: section.virtual_size as usize,
        })
        .ok_or_else(|| NativeError::InvalidImage("no .text section".to_string()))
}

/// The executable code of a module, as mapped in memory.
#[derive(Debug, Clone, Copy)]
pub struct ModuleText<'a> {
    base: usize,
    code: &'a [u8],
}

impl<'a> ModuleText<'a> {
    /// Wrap a code region that starts at address `base`.
    pub fn new(base: usize, code: &'a [u8]) -> Self {
        Self { base, code }
    }

    /// Locate the `.text` section of the module mapped at `module_base`.
    ///
    /// # Safety
    ///
    /// `module_base` must be the base of a PE image mapped in this process,
    /// with its headers and `.text` section readable for the lifetime `'a`.
    pub unsafe fn from_module_base(module_base: usize) -> Result<Self, NativeError> {
        if module_base == 0 {
            return Err(NativeError::InvalidImage("null module base".to_string()));
        }
        // SAFETY: the caller guarantees the header page is mapped.
        let headers = unsafe { std::slice::from_raw_parts(module_base as *const u8, HEADER_SPAN) };
        let text = find_text_section(headers)?;
        let start = module_base + text.virtual_address;
        // SAFETY: the section lies inside the mapped image.
        let code = unsafe { std::slice::from_raw_parts(start as *const u8, text.virtual_size) };
        Ok(Self::new(start, code))
    }

    /// Address of the first code byte.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Length of the code region.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Whether the region is empty.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Resolve a signature to an absolute address.
    pub fn resolve(&self, name: &'static str, pattern: &str) -> Result<usize, NativeError> {
        let signature: Signature = pattern.parse()?;
        signature
            .resolve(self.code, self.base)
            .ok_or(NativeError::PatternNotFound(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOS_MAGIC: u16 = 0x5A4D;
    const NT_SIGNATURE: u32 = 0x0000_4550;
    const E_LFANEW_OFFSET: usize = 0x3C;
    const SECTION_HEADER_SIZE: usize = 40;

    /// Minimal PE header block with the given section names.
    fn fake_headers(sections: &[(&[u8], u32, u32)]) -> Vec<u8> {
        let mut headers = vec![0u8; HEADER_SPAN];
        headers[0..2].copy_from_slice(&DOS_MAGIC.to_le_bytes());
        let nt = 0x80usize;
        headers[E_LFANEW_OFFSET..E_LFANEW_OFFSET + 4].copy_from_slice(&(nt as u32).to_le_bytes());
        headers[nt..nt + 4].copy_from_slice(&NT_SIGNATURE.to_le_bytes());
        let file_header = nt + 4;
        headers[file_header + 2..file_header + 4]
            .copy_from_slice(&(sections.len() as u16).to_le_bytes());
        // No optional header: the section table follows the COFF header.
        let mut at = file_header + SIZEOF_COFF_HEADER;
        for (name, size, address) in sections {
            headers[at..at + name.len()].copy_from_slice(name);
            headers[at + 8..at + 12].copy_from_slice(&size.to_le_bytes());
            headers[at + 12..at + 16].copy_from_slice(&address.to_le_bytes());
            at += SECTION_HEADER_SIZE;
        }
        headers
    }

    #[test]
    fn test_find_text_section() {
        let headers = fake_headers(&[(b".rdata", 0x200, 0x5000), (b".text", 0x3000, 0x1000)]);
        let span = find_text_section(&headers).unwrap();
        assert_eq!(
            span,
            SectionSpan {
                virtual_address: 0x1000,
                virtual_size: 0x3000
            }
        );
    }

    #[test]
    fn test_missing_text_section() {
        let headers = fake_headers(&[(b".data", 0x200, 0x5000)]);
        assert!(matches!(
            find_text_section(&headers),
            Err(NativeError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_bad_magic() {
        let headers = vec![0u8; 64];
        assert!(find_text_section(&headers).is_err());
    }

    #[test]
    fn test_truncated_headers() {
        let mut headers = fake_headers(&[(b".text", 0x10, 0x1000)]);
        headers.truncate(0x90);
        assert!(find_text_section(&headers).is_err());
    }

    #[test]
    fn test_from_module_base_on_buffer() {
        let mut image = fake_headers(&[(b".text", 0x20, 0x1000)]);
        image.resize(0x1020, 0);
        image[0x1008..0x100B].copy_from_slice(&[0x48, 0x89, 0x5C]);

        let base = image.as_ptr() as usize;
        // SAFETY: `image` is a complete, readable image for the test's duration.
        let text = unsafe { ModuleText::from_module_base(base) }.unwrap();
        assert_eq!(text.base(), base + 0x1000);
        assert_eq!(text.len(), 0x20);
        assert_eq!(text.resolve("Input", "48 89 5C").unwrap(), base + 0x1008);
    }

    #[test]
    fn test_resolve_not_found() {
        let code = [0x90u8; 16];
        let text = ModuleText::new(0x1000, &code);
        assert!(matches!(
            text.resolve("ProcessChat", "48 89 5C"),
            Err(NativeError::PatternNotFound("ProcessChat"))
        ));
    }
}
