//! OLED protocol definitions and encoding.
//!
//! Protocol structure:
//! - Every I2C write starts with a control byte: 0x00 (commands) or 0x40 (data)
//! - Display RAM is 8 pages of 128 columns, one byte per column per page
//! - Within a byte, bit 0 is the topmost of the 8 pixel rows in the page
//! - Frame data is sent in 32-byte blocks

use crate::{Error, Result};

use super::framebuffer::Framebuffer;

/// Control byte announcing a command sequence.
pub const CONTROL_COMMAND: u8 = 0x00;

/// Control byte announcing display RAM data.
pub const CONTROL_DATA: u8 = 0x40;

/// Data bytes per bus transaction.
pub const BLOCK_SIZE: usize = 32;

/// Pixel rows per page.
pub const PAGE_HEIGHT: u16 = 8;

/// OLED controller commands used directly by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Panel off (sleep).
    DisplayOff = 0xAE,
    /// Panel on.
    DisplayOn = 0xAF,
}

/// Power-on initialization sequence.
pub const INIT_SEQUENCE: [u8; 27] = [
    0xAE, // display off
    0x00, // column start low nibble
    0x10, // column start high nibble
    0x40, // display start line 0
    0xB0, // page start 0
    0x81, 0xCF, // contrast
    0xA1, // segment remap
    0xA8, 0x3F, // multiplex ratio 1/64
    0xC8, // COM scan direction remapped
    0xD3, 0x00, // display offset
    0xD5, 0x80, // clock divide ratio
    0xD9, 0xF1, // pre-charge period
    0xDA, 0x12, // COM pins configuration
    0xDB, 0x40, // VCOMH deselect level
    0x8D, 0x14, // charge pump on
    0xA6, // normal (non-inverted) display
    0x20, 0x00, // horizontal addressing mode
    0xAF, // display on
];

/// Returns the number of pages needed to cover `height` pixel rows.
pub fn page_count(height: u16) -> usize {
    height.div_ceil(PAGE_HEIGHT) as usize
}

/// Builds a command packet: control byte followed by the command bytes.
pub fn build_command_packet(commands: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(commands.len() + 1);
    packet.push(CONTROL_COMMAND);
    packet.extend_from_slice(commands);
    packet
}

/// Builds a data packet: control byte followed by one block of display RAM.
pub fn build_data_packet(block: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(block.len() + 1);
    packet.push(CONTROL_DATA);
    packet.extend_from_slice(block);
    packet
}

/// Packs the framebuffer into display RAM order.
///
/// Bytes are emitted page by page, column by column. Rows below the bottom
/// of the framebuffer in a partial last page are zero bits.
pub fn encode_pages(fb: &Framebuffer) -> Vec<u8> {
    let width = fb.width();
    let pages = page_count(fb.height());
    let mut bytes = Vec::with_capacity(pages * width as usize);

    for page in 0..pages as u16 {
        for x in 0..width {
            let mut byte = 0u8;
            for bit in 0..PAGE_HEIGHT {
                if fb.get_pixel(x, page * PAGE_HEIGHT + bit) == Some(true) {
                    byte |= 1 << bit;
                }
            }
            bytes.push(byte);
        }
    }

    bytes
}

/// Unpacks display RAM bytes back into a framebuffer.
pub fn decode_pages(bytes: &[u8], width: u16, height: u16) -> Result<Framebuffer> {
    let expected = page_count(height) * width as usize;
    if bytes.len() != expected {
        return Err(Error::FramebufferSize {
            expected,
            actual: bytes.len(),
        });
    }

    let mut fb = Framebuffer::with_dimensions(width, height);
    for (i, &byte) in bytes.iter().enumerate() {
        let page = (i / width as usize) as u16;
        let x = (i % width as usize) as u16;
        for bit in 0..PAGE_HEIGHT {
            if byte & (1 << bit) != 0 {
                fb.set_pixel(x, page * PAGE_HEIGHT + bit, true);
            }
        }
    }
    Ok(fb)
}

/// Splits encoded display RAM into transport blocks.
///
/// The last block is shorter when the stream is not a multiple of
/// [`BLOCK_SIZE`].
pub fn blocks(bytes: &[u8]) -> std::slice::Chunks<'_, u8> {
    bytes.chunks(BLOCK_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_sequence_is_bit_exact() {
        let expected = [
            0xAE, 0x00, 0x10, 0x40, 0xB0, 0x81, 0xCF, 0xA1, 0xA8, 0x3F, 0xC8, 0xD3, 0x00, 0xD5,
            0x80, 0xD9, 0xF1, 0xDA, 0x12, 0xDB, 0x40, 0x8D, 0x14, 0xA6, 0x20, 0x00, 0xAF,
        ];
        assert_eq!(INIT_SEQUENCE, expected);
    }

    #[test]
    fn test_command_and_data_packets() {
        assert_eq!(
            build_command_packet(&[Command::DisplayOff as u8]),
            vec![0x00, 0xAE]
        );
        assert_eq!(build_data_packet(&[1, 2, 3]), vec![0x40, 1, 2, 3]);
    }

    #[test]
    fn test_cleared_frame_encodes_to_zero_blocks() {
        let mut fb = Framebuffer::new();
        fb.fill_rect(0, 0, 128, 64, true);
        fb.clear_rect(0, 0, 128, 64);

        let bytes = encode_pages(&fb);
        assert_eq!(bytes.len(), 1024);
        assert!(bytes.iter().all(|&b| b == 0));

        let chunks: Vec<_> = blocks(&bytes).collect();
        assert_eq!(chunks.len(), 32);
        assert!(chunks.iter().all(|c| c.len() == BLOCK_SIZE));
    }

    #[test]
    fn test_single_pixel_lands_in_its_page_and_bit() {
        for &(x, y) in &[(0u16, 0u16), (127, 63), (5, 9), (64, 31), (100, 56)] {
            let mut fb = Framebuffer::new();
            fb.set_pixel(x, y, true);

            let bytes = encode_pages(&fb);
            let idx = (y / 8) as usize * 128 + x as usize;
            assert_eq!(bytes[idx], 1 << (y % 8), "pixel ({x}, {y})");
            assert_eq!(bytes.iter().filter(|&&b| b != 0).count(), 1);

            let decoded = decode_pages(&bytes, 128, 64).unwrap();
            assert_eq!(decoded, fb);
        }
    }

    #[test]
    fn test_lsb_is_top_row_of_page() {
        let mut fb = Framebuffer::new();
        // Top and bottom rows of page 1, column 3
        fb.set_pixel(3, 8, true);
        fb.set_pixel(3, 15, true);
        let bytes = encode_pages(&fb);
        assert_eq!(bytes[128 + 3], 0b1000_0001);
    }

    #[test]
    fn test_partial_page_and_short_final_block() {
        let mut fb = Framebuffer::with_dimensions(20, 12);
        fb.set_pixel(19, 11, true);

        let bytes = encode_pages(&fb);
        assert_eq!(bytes.len(), 40);
        assert_eq!(bytes[39], 1 << 3);

        let sizes: Vec<_> = blocks(&bytes).map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![32, 8]);

        assert_eq!(decode_pages(&bytes, 20, 12).unwrap(), fb);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert!(matches!(
            decode_pages(&[0; 1000], 128, 64),
            Err(Error::FramebufferSize {
                expected: 1024,
                actual: 1000
            })
        ));
    }
}
