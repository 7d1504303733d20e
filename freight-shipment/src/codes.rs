use rand::Rng;

/// No 0/O or 1/I, the codes are read out over the phone
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const RECIPIENT_CODE_LEN: usize = 8;
const SHIPMENT_NUMBER_PREFIX: &str = "SHP-";

/// Generate the pickup/tracking code handed to the recipient
pub fn generate_recipient_code() -> String {
    let mut rng = rand::thread_rng();
    (0..RECIPIENT_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Format: SHP-{sequence, 6 digits}
pub fn format_shipment_number(sequence: u64) -> String {
    format!("{}{:06}", SHIPMENT_NUMBER_PREFIX, sequence)
}

pub fn parse_shipment_number(number: &str) -> Option<u64> {
    number.strip_prefix(SHIPMENT_NUMBER_PREFIX)?.parse().ok()
}

/// Next number after the highest one in use
pub fn next_shipment_number<'a, I>(existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let highest = existing
        .into_iter()
        .filter_map(parse_shipment_number)
        .max()
        .unwrap_or(0);
    format_shipment_number(highest + 1)
}
