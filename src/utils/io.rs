// Bounds-checked big-endian readers over byte slices
//
// Each reader returns None instead of panicking when the slice is too short,
// so truncated payloads simply leave fields unset.

/// Read a single byte at `offset`
pub fn read_u8(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied()
}

/// Read big-endian 16-bit integer at `offset`
pub fn read_be_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Read big-endian 32-bit integer at `offset`
pub fn read_be_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read big-endian 64-bit integer at `offset`
pub fn read_be_u64(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset.checked_add(8)?)?;
    let mut buffer = [0u8; 8];
    buffer.copy_from_slice(bytes);
    Some(u64::from_be_bytes(buffer))
}

/// Read a four character code at `offset`
pub fn read_fourcc(data: &[u8], offset: usize) -> Option<[u8; 4]> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Render a four character code for display, replacing non-printable bytes
pub fn fourcc_to_string(code: &[u8; 4]) -> String {
    code.iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect()
}

/// Check if data has signature at `offset`
pub fn check_signature(data: &[u8], offset: usize, signature: &[u8]) -> bool {
    offset
        .checked_add(signature.len())
        .and_then(|end| data.get(offset..end))
        .map_or(false, |bytes| bytes == signature)
}
