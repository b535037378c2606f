//! Minimal script construction used by coinbase and genesis transactions.

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_CHECKSIG: u8 = 0xac;

pub fn push_data(script: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        0..=75 => script.push(data.len() as u8),
        76..=0xff => {
            script.push(OP_PUSHDATA1);
            script.push(data.len() as u8);
        }
        0x100..=0xffff => {
            script.push(OP_PUSHDATA2);
            script.extend_from_slice(&(data.len() as u16).to_le_bytes());
        }
        _ => {
            script.push(OP_PUSHDATA4);
            script.extend_from_slice(&(data.len() as u32).to_le_bytes());
        }
    }
    script.extend_from_slice(data);
}

/// Minimal little-endian sign-magnitude encoding of a script number.
pub fn script_num_to_vec(value: i64) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let mut abs = value.unsigned_abs();
    let mut result = Vec::new();
    while abs > 0 {
        result.push((abs & 0xff) as u8);
        abs >>= 8;
    }
    if let Some(last) = result.last_mut() {
        if (*last & 0x80) != 0 {
            result.push(if value < 0 { 0x80 } else { 0 });
        } else if value < 0 {
            *last |= 0x80;
        }
    }
    result
}

/// Pushes an integer, using the small-integer opcodes for -1 and 0..=16.
pub fn push_int(script: &mut Vec<u8>, value: i64) {
    match value {
        0 => script.push(OP_0),
        -1 => script.push(OP_1NEGATE),
        1..=16 => script.push(OP_1 + (value as u8 - 1)),
        _ => push_data(script, &script_num_to_vec(value)),
    }
}

/// Pushes an already-encoded script number as data, never as a small-integer opcode.
pub fn push_script_num(script: &mut Vec<u8>, value: i64) {
    push_data(script, &script_num_to_vec(value));
}
