/// A simplified and const generic version of arrayref
#[inline]
fn take<const N: usize>(data: &[u8]) -> [u8; N] {
    debug_assert!(data.len() >= N);
    unsafe { *(data.as_ptr() as *const [u8; N]) }
}

#[inline]
pub(crate) fn le_u16(data: &[u8]) -> u16 {
    u16::from_le_bytes(take::<2>(data))
}

#[inline]
pub(crate) fn be_u16(data: &[u8]) -> u16 {
    u16::from_be_bytes(take::<2>(data))
}

#[inline]
pub(crate) fn le_u32(data: &[u8]) -> u32 {
    u32::from_le_bytes(take::<4>(data))
}

#[inline]
pub(crate) fn be_u32(data: &[u8]) -> u32 {
    u32::from_be_bytes(take::<4>(data))
}
