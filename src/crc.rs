use crate::consts::FCS_POLYNOMIAL;

/// Feeds a single bit (LSB first order) into a CRC-16/X.25 accumulator.
pub(crate) fn crc_x25_update_bit(crc: u16, bit: bool) -> u16 {
    let shift_bit = crc & 0x0001 != 0;
    let crc = crc >> 1;
    if shift_bit != bit {
        crc ^ FCS_POLYNOMIAL
    } else {
        crc
    }
}

#[cfg(test)]
pub(crate) fn crc_x25_update(crc: u16, data: &u8) -> u16 {
    (0..8).fold(crc, |crc, i| crc_x25_update_bit(crc, (*data >> i) & 1 != 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FCS_GOOD_RESIDUE, FCS_INITIAL_VALUE, FCS_POST_PROCESSING_XOR_VALUE};

    #[test]
    fn test_check_value() {
        // CRC-16/X.25 catalogue check value for "123456789"
        let crc = b"123456789"
            .iter()
            .fold(FCS_INITIAL_VALUE, |crc, b| crc_x25_update(crc, b));
        assert_eq!(crc ^ FCS_POST_PROCESSING_XOR_VALUE, 0x906e);
    }

    #[test]
    fn test_appended_fcs_leaves_good_residue() {
        let data = b"HABHAB WIDE1";
        let fcs = data
            .iter()
            .fold(FCS_INITIAL_VALUE, |crc, b| crc_x25_update(crc, b))
            ^ FCS_POST_PROCESSING_XOR_VALUE;
        let residue = data
            .iter()
            .chain([(fcs & 0xff) as u8, (fcs >> 8) as u8].iter())
            .fold(FCS_INITIAL_VALUE, |crc, b| crc_x25_update(crc, b));
        assert_eq!(residue, FCS_GOOD_RESIDUE);
    }
}
