// Bit `idx` is bit `idx % 8` of byte `idx / 8`, set when the seat is taken.
// Labels run five to a row: 0 is `1A`, 4 is `1F`, 5 is `2A`.

pub const COLUMNS: [char; 5] = ['A', 'B', 'C', 'D', 'F'];
pub const MAX_ROWS: usize = 99;
pub const MAX_SEATS: usize = MAX_ROWS * COLUMNS.len();

pub fn bitmap_len(capacity: usize) -> usize {
    capacity.div_ceil(8)
}

pub fn next_available(bitmap: &[u8]) -> Option<usize> {
    next_available_below(bitmap, bitmap.len() * 8)
}

/// First free seat with an index below `limit`. The trailing bits of the last
/// byte are padding when the capacity is not a multiple of eight.
pub fn next_available_below(bitmap: &[u8], limit: usize) -> Option<usize> {
    let (byte_idx, byte) = bitmap
        .iter()
        .enumerate()
        .find(|(_, byte)| **byte != u8::MAX)?;
    let idx = byte_idx * 8 + byte.trailing_ones() as usize;
    (idx < limit).then_some(idx)
}

pub fn is_set(bitmap: &[u8], idx: usize) -> bool {
    bitmap
        .get(idx / 8)
        .is_some_and(|byte| byte & (1 << (idx % 8)) != 0)
}

pub fn set_bit(bitmap: &[u8], idx: usize) -> Vec<u8> {
    let mut next = bitmap.to_vec();
    if let Some(byte) = next.get_mut(idx / 8) {
        *byte |= 1 << (idx % 8);
    }
    next
}

pub fn clear_bit(bitmap: &[u8], idx: usize) -> Vec<u8> {
    let mut next = bitmap.to_vec();
    if let Some(byte) = next.get_mut(idx / 8) {
        *byte &= !(1 << (idx % 8));
    }
    next
}

pub fn count_set(bitmap: &[u8]) -> usize {
    bitmap.iter().map(|byte| byte.count_ones() as usize).sum()
}

pub fn idx_to_number(idx: usize) -> Option<String> {
    if idx >= MAX_SEATS {
        return None;
    }
    let row = idx / COLUMNS.len() + 1;
    let column = COLUMNS[idx % COLUMNS.len()];
    Some(format!("{row}{column}"))
}

pub fn number_to_idx(label: &str) -> Option<usize> {
    let column = label.chars().last()?;
    let row_part = &label[..label.len() - column.len_utf8()];
    if row_part.is_empty() || row_part.starts_with('0') || !row_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row: usize = row_part.parse().ok()?;
    let col = COLUMNS.iter().position(|c| *c == column)?;
    if row > MAX_ROWS {
        return None;
    }
    Some((row - 1) * COLUMNS.len() + col)
}
